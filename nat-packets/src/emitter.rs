/// The raw-socket transmit path is an external collaborator (§1 of the
/// specification): `nat-packets` only needs to know that *something* can
/// take a named outbound interface and a fully-checksummed IPv4 datagram
/// and put it on the wire. `nat-raw` provides the real implementation.
pub trait Emitter {
    fn send(&mut self, outbound_interface: &str, datagram: &[u8]) -> std::io::Result<()>;
}
