use nat_packets::PacketError;
use thiserror::Error;

/// Errors a config record can fail to build with, terminating the process
/// at startup (§7: `ConfigInvalid`).
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("{field} has invalid value {value:?}, expected one of {expected:?}")]
    InvalidEnumValue {
        field: &'static str,
        value: String,
        expected: &'static [&'static str],
    },

    #[error("map_lifetime must be a positive number of seconds, got {0}")]
    NonPositiveLifetime(i64),
}

/// Per-packet failures surfaced by the flow table and engine. Every variant
/// other than `NoMapFound` steers the state machine straight to DROP; only
/// `ConfigInvalid` happens outside of per-packet processing and is not a
/// variant of this enum (it terminates the process before the engine runs).
#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum NatError {
    #[error(transparent)]
    Packet(#[from] PacketError),

    /// Steers the state machine (create-then-retry); never surfaced to a
    /// caller outside the engine.
    #[error("no existing mapping for this tuple")]
    NoMapFound,

    #[error("no free port available under the configured assignment policy")]
    PortExhausted,
}
