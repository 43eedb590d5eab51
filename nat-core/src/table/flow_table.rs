use crate::config::{Config, MappingBehavior, FilteringBehavior};
use crate::error::NatError;
use crate::table::mapping::MappingEntry;
use crate::table::ports::PortPool;
use nat_packets::{IpProtocol, Tuple};

pub enum LookupResult {
    Found(MappingEntry),
    NotFound,
}

/// Owns the three per-protocol mapping collections and the two port pools
/// (§4.2). ICMP has no port pool since its tuple carries no ports.
///
/// Entries are stored newest-first per protocol so repeat traffic on an
/// active flow matches in roughly constant time; this mirrors the
/// insert-at-front rule of §4.2 step 7.
pub struct FlowTable {
    udp: Vec<MappingEntry>,
    tcp: Vec<MappingEntry>,
    icmp: Vec<MappingEntry>,
    udp_ports: PortPool,
    tcp_ports: PortPool,
}

impl FlowTable {
    pub fn new() -> Self {
        FlowTable {
            udp: Vec::new(),
            tcp: Vec::new(),
            icmp: Vec::new(),
            udp_ports: PortPool::new(),
            tcp_ports: PortPool::new(),
        }
    }

    fn collection(&self, protocol: IpProtocol) -> Option<&Vec<MappingEntry>> {
        match protocol {
            IpProtocol::Udp => Some(&self.udp),
            IpProtocol::Tcp => Some(&self.tcp),
            IpProtocol::Icmp => Some(&self.icmp),
            IpProtocol::Other(_) => None,
        }
    }

    fn collection_mut(&mut self, protocol: IpProtocol) -> Option<&mut Vec<MappingEntry>> {
        match protocol {
            IpProtocol::Udp => Some(&mut self.udp),
            IpProtocol::Tcp => Some(&mut self.tcp),
            IpProtocol::Icmp => Some(&mut self.icmp),
            IpProtocol::Other(_) => None,
        }
    }

    fn port_pool_mut(&mut self, protocol: IpProtocol) -> Option<&mut PortPool> {
        match protocol {
            IpProtocol::Udp => Some(&mut self.udp_ports),
            IpProtocol::Tcp => Some(&mut self.tcp_ports),
            IpProtocol::Icmp => None,
            IpProtocol::Other(_) => None,
        }
    }

    fn matches_outbound(behavior: MappingBehavior, entry: &MappingEntry, t: &Tuple) -> bool {
        if entry.inside.src_ip() != t.src_ip() || entry.inside.src_port() != t.src_port() {
            return false;
        }
        match behavior {
            MappingBehavior::EndpointIndependent => true,
            MappingBehavior::AddressDependent => entry.outside.dst_ip() == t.dst_ip(),
            MappingBehavior::AddressPortDependent => {
                entry.outside.dst_ip() == t.dst_ip() && entry.outside.dst_port() == t.dst_port()
            }
        }
    }

    fn matches_inbound(behavior: FilteringBehavior, entry: &MappingEntry, t: &Tuple) -> bool {
        if entry.outside.src_ip() != t.dst_ip() || entry.outside.src_port() != t.dst_port() {
            return false;
        }
        match behavior {
            FilteringBehavior::EndpointIndependent => true,
            FilteringBehavior::AddressDependent => entry.outside.dst_ip() == t.src_ip(),
            FilteringBehavior::AddressPortDependent => {
                entry.outside.dst_ip() == t.src_ip() && entry.outside.dst_port() == t.src_port()
            }
        }
    }

    /// §4.2 `lookup_outbound`: on match, evicts expired entries lazily and
    /// refreshes `last_activity` per the configured refresh policy.
    pub fn lookup_outbound(&mut self, t: &Tuple, now: u64, cfg: &Config) -> LookupResult {
        let protocol = t.protocol();
        let idx = match self.collection(protocol) {
            Some(entries) => entries
                .iter()
                .position(|e| Self::matches_outbound(cfg.mapping_behavior, e, t)),
            None => return LookupResult::NotFound,
        };
        let Some(idx) = idx else {
            return LookupResult::NotFound;
        };

        if self.collection(protocol).unwrap()[idx].is_expired(now, cfg.map_lifetime_secs) {
            self.evict(protocol, idx);
            return LookupResult::NotFound;
        }

        if cfg.refresh_policy.refreshes_on_outbound() {
            self.collection_mut(protocol).unwrap()[idx].last_activity = now;
        }

        let mut found = self.collection(protocol).unwrap()[idx].clone();
        found.inside = found.inside.with_dst(t.dst_ip(), t.dst_port().unwrap_or(0));
        found.outside = found.outside.with_dst(t.dst_ip(), t.dst_port().unwrap_or(0));
        LookupResult::Found(found)
    }

    /// §4.2 `lookup_inbound`: returns the reverse-rewrite view (interfaces
    /// swapped, destination pointed back at the original internal host).
    pub fn lookup_inbound(&mut self, t: &Tuple, now: u64, cfg: &Config) -> LookupResult {
        let protocol = t.protocol();
        let idx = match self.collection(protocol) {
            Some(entries) => entries
                .iter()
                .position(|e| Self::matches_inbound(cfg.filtering_behavior, e, t)),
            None => return LookupResult::NotFound,
        };
        let Some(idx) = idx else {
            return LookupResult::NotFound;
        };

        if self.collection(protocol).unwrap()[idx].is_expired(now, cfg.map_lifetime_secs) {
            self.evict(protocol, idx);
            return LookupResult::NotFound;
        }

        if cfg.refresh_policy.refreshes_on_inbound() {
            self.collection_mut(protocol).unwrap()[idx].last_activity = now;
        }

        let stored = &self.collection(protocol).unwrap()[idx];
        let reply = MappingEntry {
            protocol,
            in_interface: stored.out_interface.clone(),
            out_interface: stored.in_interface.clone(),
            inside: stored
                .inside
                .with_dst(stored.inside.src_ip(), stored.inside.src_port().unwrap_or(0))
                .with_src(t.src_ip(), t.src_port().unwrap_or(0)),
            outside: stored.outside.clone(),
            last_activity: stored.last_activity,
        };
        LookupResult::Found(reply)
    }

    /// §4.2 `create_outbound`: only called after `lookup_outbound` returned
    /// `NotFound`.
    pub fn create_outbound(
        &mut self,
        inside: &Tuple,
        in_interface: &str,
        now: u64,
        cfg: &Config,
    ) -> Result<MappingEntry, NatError> {
        let protocol = inside.protocol();
        let outside_port = match protocol {
            IpProtocol::Icmp => 0,
            _ => {
                let original_port = inside.src_port().unwrap_or(0);
                let pool = self.port_pool_mut(protocol).ok_or(NatError::PortExhausted)?;
                pool.allocate(cfg.port_assignment, cfg.port_parity == crate::config::PortParity::Enabled, original_port)
                    .ok_or(NatError::PortExhausted)?
            }
        };

        let outside = inside
            .with_src(cfg.external_ip, outside_port)
            .with_dst(inside.dst_ip(), inside.dst_port().unwrap_or(0));

        let entry = MappingEntry {
            protocol,
            in_interface: in_interface.to_string(),
            out_interface: cfg.external_interface.clone(),
            inside: *inside,
            outside,
            last_activity: now,
        };

        let entries = self.collection_mut(protocol).ok_or(NatError::Packet(nat_packets::PacketError::InvalidProtocol))?;
        entries.insert(0, entry.clone());
        Ok(entry)
    }

    fn evict(&mut self, protocol: IpProtocol, idx: usize) {
        let entries = match self.collection_mut(protocol) {
            Some(e) => e,
            None => return,
        };
        let removed = entries.remove(idx);
        if let Some(port) = removed.outside.src_port() {
            if let Some(pool) = self.port_pool_mut(protocol) {
                pool.release(port);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Hairpin, PortAssignment, PortParity, RefreshPolicy};
    use nat_packets::UdpTuple;

    fn test_config() -> Config {
        Config {
            internal_interface: "eth1".to_string(),
            external_interface: "eth0".to_string(),
            internal_ip: u32::from_be_bytes([10, 0, 0, 1]),
            external_ip: u32::from_be_bytes([203, 0, 113, 1]),
            mapping_behavior: MappingBehavior::EndpointIndependent,
            filtering_behavior: FilteringBehavior::EndpointIndependent,
            port_assignment: PortAssignment::Preserve,
            port_parity: PortParity::Disabled,
            hairpin: Hairpin::Disable,
            refresh_policy: RefreshPolicy::Both,
            map_lifetime_secs: 30,
        }
    }

    fn udp(src_ip: [u8; 4], src_port: u16, dst_ip: [u8; 4], dst_port: u16) -> Tuple {
        Tuple::Udp(UdpTuple {
            src_ip: u32::from_be_bytes(src_ip),
            src_port,
            dst_ip: u32::from_be_bytes(dst_ip),
            dst_port,
        })
    }

    #[test]
    fn create_then_find_outbound() {
        let mut table = FlowTable::new();
        let cfg = test_config();
        let inside = udp([10, 0, 0, 2], 5000, [8, 8, 8, 8], 53);

        assert!(matches!(table.lookup_outbound(&inside, 0, &cfg), LookupResult::NotFound));
        let entry = table.create_outbound(&inside, "eth1", 0, &cfg).unwrap();
        assert_eq!(entry.outside.src_port(), Some(5000));

        match table.lookup_outbound(&inside, 1, &cfg) {
            LookupResult::Found(found) => assert_eq!(found.outside.src_ip(), cfg.external_ip),
            LookupResult::NotFound => panic!("expected a mapping"),
        }
    }

    #[test]
    fn expired_mapping_is_evicted_and_port_released() {
        let mut table = FlowTable::new();
        let cfg = test_config();
        let inside = udp([10, 0, 0, 2], 5000, [8, 8, 8, 8], 53);
        table.create_outbound(&inside, "eth1", 0, &cfg).unwrap();

        assert!(matches!(
            table.lookup_outbound(&inside, 100, &cfg),
            LookupResult::NotFound
        ));
        assert!(table.udp_ports.is_free(5000));
    }

    #[test]
    fn inbound_reply_routes_back_to_original_host() {
        let mut table = FlowTable::new();
        let cfg = test_config();
        let inside = udp([10, 0, 0, 2], 5000, [8, 8, 8, 8], 53);
        table.create_outbound(&inside, "eth1", 0, &cfg).unwrap();

        let reply = udp([8, 8, 8, 8], 53, [203, 0, 113, 1], 5000);
        match table.lookup_inbound(&reply, 1, &cfg) {
            LookupResult::Found(found) => {
                assert_eq!(found.inside.dst_ip(), u32::from_be_bytes([10, 0, 0, 2]));
                assert_eq!(found.inside.dst_port(), Some(5000));
                assert_eq!(found.in_interface, "eth0");
                assert_eq!(found.out_interface, "eth1");
            }
            LookupResult::NotFound => panic!("expected a mapping"),
        }
    }

    #[test]
    fn unsolicited_inbound_is_not_found() {
        let mut table = FlowTable::new();
        let cfg = test_config();
        let reply = udp([8, 8, 8, 8], 53, [203, 0, 113, 1], 6000);
        assert!(matches!(table.lookup_inbound(&reply, 0, &cfg), LookupResult::NotFound));
    }
}
