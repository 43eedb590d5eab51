use nat_packets::{IpProtocol, Tuple};

/// One active NAT flow. `inside` is the tuple as seen from the internal
/// side, `outside` as seen from the external side; only the source
/// endpoint ever differs between the two (§3: destinations are never
/// rewritten).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub protocol: IpProtocol,
    pub in_interface: String,
    pub out_interface: String,
    pub inside: Tuple,
    pub outside: Tuple,
    pub last_activity: u64,
}

impl MappingEntry {
    pub fn is_expired(&self, now: u64, lifetime_secs: u64) -> bool {
        now.saturating_sub(self.last_activity) >= lifetime_secs
    }
}
