mod flow_table;
mod mapping;
mod ports;

pub use flow_table::{FlowTable, LookupResult};
pub use mapping::MappingEntry;
pub use ports::PortPool;
