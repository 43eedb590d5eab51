use crate::socket::RawSender;
use nat_packets::Emitter;
use std::collections::HashMap;
use std::ffi::CString;
use std::io;

/// Binds one [`RawSender`] per interface name it is asked to emit on, and
/// implements [`Emitter`] by dispatching to the right one. The gateway
/// binary constructs this once with the internal and external interface
/// names from configuration.
pub struct InterfaceEmitter {
    senders: HashMap<String, RawSender>,
}

impl InterfaceEmitter {
    pub fn new(interfaces: impl IntoIterator<Item = impl Into<String>>) -> io::Result<Self> {
        let mut senders = HashMap::new();
        for name in interfaces {
            let name = name.into();
            let cname = CString::new(name.clone())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "interface name contains a NUL byte"))?;
            senders.insert(name, RawSender::bind(cname)?);
        }
        Ok(InterfaceEmitter { senders })
    }
}

impl Emitter for InterfaceEmitter {
    fn send(&mut self, outbound_interface: &str, datagram: &[u8]) -> io::Result<()> {
        let sender = self.senders.get(outbound_interface).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no raw sender bound for interface {outbound_interface}"),
            )
        })?;
        sender.send(datagram)
    }
}
