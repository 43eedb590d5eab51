use crate::emitter::Emitter;
use crate::error::PacketError;
use crate::ipv4::Ipv4Header;
use crate::types::{IpProtocol, Tuple};

/// A datagram as it moves through the engine: the IPv4 bytes plus the
/// interface metadata the kernel queue hook attached to it.
pub struct Packet<'a> {
    header: Ipv4Header<'a>,
    inbound_interface: String,
    outbound_interface: Option<String>,
}

impl<'a> Packet<'a> {
    pub fn parse(data: &'a mut [u8], inbound_interface: impl Into<String>) -> Result<Self, PacketError> {
        Ok(Packet {
            header: Ipv4Header::parse(data)?,
            inbound_interface: inbound_interface.into(),
            outbound_interface: None,
        })
    }

    pub fn protocol(&self) -> IpProtocol {
        self.header.protocol()
    }

    pub fn src_ip(&self) -> u32 {
        self.header.src_ip()
    }

    pub fn dst_ip(&self) -> u32 {
        self.header.dst_ip()
    }

    pub fn frag_id(&self) -> u16 {
        self.header.frag_id()
    }

    pub fn frag_flags(&self) -> u16 {
        self.header.frag_flags()
    }

    pub fn header_len(&self) -> u16 {
        self.header.header_len()
    }

    pub fn get_tuple(&self, want: IpProtocol) -> Result<Tuple, PacketError> {
        self.header.get_tuple(want)
    }

    pub fn set_tuple(&mut self, tuple: &Tuple) -> Result<(), PacketError> {
        self.header.set_tuple(tuple)
    }

    pub fn inbound_interface(&self) -> &str {
        &self.inbound_interface
    }

    pub fn outbound_interface(&self) -> Option<&str> {
        self.outbound_interface.as_deref()
    }

    pub fn set_outbound_interface(&mut self, iface: impl Into<String>) {
        self.outbound_interface = Some(iface.into());
    }

    /// Transmits the datagram through `emitter` on `outbound_interface`,
    /// which must have been set via [`Packet::set_outbound_interface`].
    pub fn emit(&self, emitter: &mut dyn Emitter) -> Result<(), PacketError> {
        let iface = self
            .outbound_interface
            .as_deref()
            .ok_or(PacketError::MalformedPacket("no outbound interface set before emit"))?;
        emitter
            .send(iface, self.header.raw())
            .map_err(|e| PacketError::EmitError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UdpTuple;

    struct RecordingEmitter {
        sent: Vec<(String, Vec<u8>)>,
    }

    impl Emitter for RecordingEmitter {
        fn send(&mut self, outbound_interface: &str, datagram: &[u8]) -> std::io::Result<()> {
            self.sent.push((outbound_interface.to_string(), datagram.to_vec()));
            Ok(())
        }
    }

    fn udp_buf() -> Vec<u8> {
        let mut buf = vec![0u8; 28];
        buf[0] = 0x45;
        buf[2..4].copy_from_slice(&28u16.to_be_bytes());
        buf[9] = 17;
        buf[12..16].copy_from_slice(&[10, 0, 0, 2]);
        buf[16..20].copy_from_slice(&[198, 51, 100, 7]);
        buf[20..22].copy_from_slice(&5000u16.to_be_bytes());
        buf[22..24].copy_from_slice(&80u16.to_be_bytes());
        buf[24..26].copy_from_slice(&8u16.to_be_bytes());
        buf
    }

    #[test]
    fn emit_fails_without_outbound_interface() {
        let mut buf = udp_buf();
        let packet = Packet::parse(&mut buf, "eth1").unwrap();
        let mut emitter = RecordingEmitter { sent: vec![] };
        assert!(packet.emit(&mut emitter).is_err());
    }

    #[test]
    fn emit_sends_on_outbound_interface() {
        let mut buf = udp_buf();
        let mut packet = Packet::parse(&mut buf, "eth1").unwrap();
        packet
            .set_tuple(&Tuple::Udp(UdpTuple {
                src_ip: u32::from_be_bytes([203, 0, 113, 1]),
                src_port: 5000,
                dst_ip: u32::from_be_bytes([198, 51, 100, 7]),
                dst_port: 80,
            }))
            .unwrap();
        packet.set_outbound_interface("eth0");
        let mut emitter = RecordingEmitter { sent: vec![] };
        packet.emit(&mut emitter).unwrap();
        assert_eq!(emitter.sent.len(), 1);
        assert_eq!(emitter.sent[0].0, "eth0");
    }
}
