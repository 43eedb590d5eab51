//! IPv4 datagram parsing, protocol tuples, and checksum routines.
//!
//! This crate is the packet-framing layer consumed by `nat-core`. It knows
//! nothing about NAT mapping policy; it only knows how to read and rewrite
//! the bytes of an IPv4 datagram.

mod checksum;
mod emitter;
mod error;
mod ipv4;
mod packet;
mod types;

pub use checksum::internet_checksum;
pub use emitter::Emitter;
pub use error::PacketError;
pub use ipv4::Ipv4Header;
pub use packet::Packet;
pub use types::{IcmpTuple, IpProtocol, TcpTuple, Tuple, UdpTuple};
