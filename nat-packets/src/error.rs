use thiserror::Error;

/// Failures that can occur while parsing or rewriting a single IPv4 datagram.
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum PacketError {
    #[error("packet is malformed: {0}")]
    MalformedPacket(&'static str),

    #[error("requested tuple protocol does not match the packet's protocol byte")]
    InvalidProtocol,

    #[error("raw socket emit failed: {0}")]
    EmitError(String),
}
