//! The NAT flow table, port allocator, and per-packet state machine (§2
//! TBL/ENG/CFG).

mod config;
mod engine;
mod error;
mod table;

pub use config::{
    Config, FilteringBehavior, Hairpin, MappingBehavior, PortAssignment, PortParity, RawConfig,
    RefreshPolicy,
};
pub use engine::{Engine, Verdict};
pub use error::{ConfigError, NatError};
pub use table::{FlowTable, MappingEntry};
