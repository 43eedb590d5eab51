use crate::config::{Config, Hairpin};
use crate::error::NatError;
use crate::table::{FlowTable, LookupResult};
use nat_packets::{Emitter, IpProtocol, Packet};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Which side of the NAT a packet arrived on, decided by comparing its
/// inbound interface against the configured internal/external names
/// (§4.3 `DETERMINE_DIRECTION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Internal,
    External,
}

/// Terminal outcome of running one packet through the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sent,
    Dropped,
    Errored,
}

pub struct Engine {
    config: Config,
    table: Arc<Mutex<FlowTable>>,
}

impl Engine {
    pub fn new(config: Config, table: Arc<Mutex<FlowTable>>) -> Self {
        Engine { config, table }
    }

    fn direction(&self, packet: &Packet) -> Option<Direction> {
        if packet.inbound_interface() == self.config.internal_interface {
            Some(Direction::Internal)
        } else if packet.inbound_interface() == self.config.external_interface {
            Some(Direction::External)
        } else {
            None
        }
    }

    /// Drives `packet` through the full state machine of §4.3 and, on a
    /// SEND outcome, emits the rewritten datagram via `emitter`.
    pub fn process(&self, packet: &mut Packet, emitter: &mut dyn Emitter, now: u64) -> Verdict {
        let direction = match self.direction(packet) {
            Some(d) => d,
            None => {
                warn!(iface = packet.inbound_interface(), "packet from unrecognized interface");
                return Verdict::Errored;
            }
        };

        match direction {
            Direction::Internal => self.handle_outbound(packet, emitter, now),
            Direction::External => self.handle_inbound(packet, emitter, now),
        }
    }

    fn handle_outbound(&self, packet: &mut Packet, emitter: &mut dyn Emitter, now: u64) -> Verdict {
        let protocol = packet.protocol();
        if !matches!(protocol, IpProtocol::Udp | IpProtocol::Tcp | IpProtocol::Icmp) {
            debug!(?protocol, "dropping unsupported protocol");
            return Verdict::Dropped;
        }

        let inside = match packet.get_tuple(protocol) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "malformed outbound packet");
                return Verdict::Errored;
            }
        };

        let mut table = self.table.lock().expect("flow table mutex poisoned");
        let entry = match table.lookup_outbound(&inside, now, &self.config) {
            LookupResult::Found(entry) => entry,
            LookupResult::NotFound => {
                match table.create_outbound(&inside, packet.inbound_interface(), now, &self.config) {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(error = %e, "could not create outbound mapping");
                        return Verdict::Dropped;
                    }
                }
            }
        };
        drop(table);

        packet.set_outbound_interface(entry.out_interface.clone());
        if let Err(e) = packet.set_tuple(&entry.outside) {
            warn!(error = %e, "failed to rewrite outbound packet");
            return Verdict::Errored;
        }

        // §4.3 VERIFY_DESTINATION: a LAN host addressing our own external
        // IP is hairpinning, not really leaving the network.
        if packet.dst_ip() == self.config.external_ip {
            return match self.config.hairpin {
                Hairpin::Allow => self.handle_inbound(packet, emitter, now),
                Hairpin::Disable => {
                    debug!("dropping hairpin attempt, hairpinning disabled");
                    Verdict::Dropped
                }
            };
        }

        self.emit(packet, emitter)
    }

    fn handle_inbound(&self, packet: &mut Packet, emitter: &mut dyn Emitter, now: u64) -> Verdict {
        let protocol = packet.protocol();
        if !matches!(protocol, IpProtocol::Udp | IpProtocol::Tcp | IpProtocol::Icmp) {
            debug!(?protocol, "dropping unsupported protocol");
            return Verdict::Dropped;
        }

        let outside = match packet.get_tuple(protocol) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "malformed inbound packet");
                return Verdict::Errored;
            }
        };

        let mut table = self.table.lock().expect("flow table mutex poisoned");
        let entry = match table.lookup_inbound(&outside, now, &self.config) {
            LookupResult::Found(entry) => entry,
            LookupResult::NotFound => {
                debug!("dropping unsolicited inbound packet");
                return Verdict::Dropped;
            }
        };
        drop(table);

        packet.set_outbound_interface(entry.out_interface.clone());
        if let Err(e) = packet.set_tuple(&entry.inside) {
            warn!(error = %e, "failed to rewrite inbound packet");
            return Verdict::Errored;
        }

        self.emit(packet, emitter)
    }

    fn emit(&self, packet: &Packet, emitter: &mut dyn Emitter) -> Verdict {
        match packet.emit(emitter) {
            Ok(()) => Verdict::Sent,
            Err(e) => {
                let err: NatError = e.into();
                warn!(error = %err, "raw emit failed");
                Verdict::Dropped
            }
        }
    }
}
