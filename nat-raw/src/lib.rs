//! Raw IPv4/link-layer socket I/O, standing in for the kernel
//! packet-queue binding the specification treats as an external
//! collaborator.

mod emitter;
mod interface;
mod linux;
mod socket;

pub use emitter::InterfaceEmitter;
pub use interface::interface_ipv4;
pub use socket::{BoundCapture, CaptureSocket, RawSender};

/// Length, in bytes, of the Ethernet header a [`BoundCapture`] frame is
/// prefixed with.
pub const ETHERNET_HEADER_LEN: usize = 14;
