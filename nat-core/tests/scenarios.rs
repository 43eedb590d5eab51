use nat_core::{Config, Engine, FilteringBehavior, FlowTable, Hairpin, MappingBehavior, PortAssignment, PortParity, RefreshPolicy, Verdict};
use nat_packets::{Emitter, Packet};
use std::io;
use std::sync::{Arc, Mutex};

const EXTERNAL_IP: [u8; 4] = [203, 0, 113, 1];
const INTERNAL_IP: [u8; 4] = [10, 0, 0, 2];
const INTERNAL_IP_B: [u8; 4] = [10, 0, 0, 3];
const PEER_IP: [u8; 4] = [198, 51, 100, 7];
const PEER_IP_B: [u8; 4] = [198, 51, 100, 8];

struct RecordingEmitter {
    sent: Vec<(String, Vec<u8>)>,
}

impl RecordingEmitter {
    fn new() -> Self {
        RecordingEmitter { sent: Vec::new() }
    }
}

impl Emitter for RecordingEmitter {
    fn send(&mut self, outbound_interface: &str, datagram: &[u8]) -> io::Result<()> {
        self.sent.push((outbound_interface.to_string(), datagram.to_vec()));
        Ok(())
    }
}

fn udp_datagram(src_ip: [u8; 4], src_port: u16, dst_ip: [u8; 4], dst_port: u16) -> Vec<u8> {
    let udp_len = 8;
    let total_len = 20 + udp_len;
    let mut buf = vec![0u8; total_len];
    buf[0] = 0x45;
    buf[2..4].copy_from_slice(&(total_len as u16).to_be_bytes());
    buf[8] = 64;
    buf[9] = 17;
    buf[12..16].copy_from_slice(&src_ip);
    buf[16..20].copy_from_slice(&dst_ip);
    buf[20..22].copy_from_slice(&src_port.to_be_bytes());
    buf[22..24].copy_from_slice(&dst_port.to_be_bytes());
    buf[24..26].copy_from_slice(&(udp_len as u16).to_be_bytes());
    buf
}

fn config(port_assignment: PortAssignment, port_parity: PortParity, hairpin: Hairpin) -> Config {
    Config {
        internal_interface: "eth1".to_string(),
        external_interface: "eth0".to_string(),
        internal_ip: u32::from_be_bytes(INTERNAL_IP),
        external_ip: u32::from_be_bytes(EXTERNAL_IP),
        mapping_behavior: MappingBehavior::EndpointIndependent,
        filtering_behavior: FilteringBehavior::AddressDependent,
        port_assignment,
        port_parity,
        hairpin,
        refresh_policy: RefreshPolicy::Both,
        map_lifetime_secs: 30,
    }
}

fn engine(cfg: Config) -> Engine {
    Engine::new(cfg, Arc::new(Mutex::new(FlowTable::new())))
}

/// S1: PRESERVE + endpoint-independent mapping keeps the original port.
#[test]
fn s1_preserve_keeps_original_port() {
    let eng = engine(config(PortAssignment::Preserve, PortParity::Disabled, Hairpin::Disable));
    let mut emitter = RecordingEmitter::new();

    let mut buf = udp_datagram(INTERNAL_IP, 5000, PEER_IP, 80);
    let mut packet = Packet::parse(&mut buf, "eth1").unwrap();
    let verdict = eng.process(&mut packet, &mut emitter, 0);

    assert_eq!(verdict, Verdict::Sent);
    assert_eq!(emitter.sent.len(), 1);
    assert_eq!(emitter.sent[0].0, "eth0");
    let sent = &emitter.sent[0].1;
    assert_eq!(&sent[12..16], &EXTERNAL_IP);
    assert_eq!(u16::from_be_bytes([sent[20], sent[21]]), 5000);
}

/// S2: OVERLOAD shares one external port between two internal hosts;
/// Address-Dependent filtering still routes replies to the right one.
#[test]
fn s2_overload_shares_port_and_filters_by_peer() {
    let eng = engine(config(PortAssignment::Overload, PortParity::Disabled, Hairpin::Disable));
    let mut emitter = RecordingEmitter::new();

    let mut buf_a = udp_datagram(INTERNAL_IP, 5000, PEER_IP, 80);
    let mut pkt_a = Packet::parse(&mut buf_a, "eth1").unwrap();
    assert_eq!(eng.process(&mut pkt_a, &mut emitter, 0), Verdict::Sent);

    let mut buf_b = udp_datagram(INTERNAL_IP_B, 5000, PEER_IP_B, 80);
    let mut pkt_b = Packet::parse(&mut buf_b, "eth1").unwrap();
    assert_eq!(eng.process(&mut pkt_b, &mut emitter, 0), Verdict::Sent);

    assert_eq!(u16::from_be_bytes([emitter.sent[0].1[20], emitter.sent[0].1[21]]), 5000);
    assert_eq!(u16::from_be_bytes([emitter.sent[1].1[20], emitter.sent[1].1[21]]), 5000);

    let mut reply = udp_datagram(PEER_IP, 80, EXTERNAL_IP, 5000);
    let mut reply_pkt = Packet::parse(&mut reply, "eth0").unwrap();
    assert_eq!(eng.process(&mut reply_pkt, &mut emitter, 1), Verdict::Sent);
    let delivered = &emitter.sent[2].1;
    assert_eq!(&delivered[16..20], &INTERNAL_IP);
}

/// S3: PRESERVE unavailable, parity enabled, must allocate an odd port.
#[test]
fn s3_parity_forces_odd_port_on_fallback() {
    let eng = engine(config(PortAssignment::Preserve, PortParity::Enabled, Hairpin::Disable));
    let mut emitter = RecordingEmitter::new();

    let mut first = udp_datagram(INTERNAL_IP, 5001, PEER_IP, 80);
    let mut first_pkt = Packet::parse(&mut first, "eth1").unwrap();
    eng.process(&mut first_pkt, &mut emitter, 0);

    let mut second = udp_datagram(INTERNAL_IP_B, 5001, PEER_IP_B, 80);
    let mut second_pkt = Packet::parse(&mut second, "eth1").unwrap();
    eng.process(&mut second_pkt, &mut emitter, 0);

    let allocated = u16::from_be_bytes([emitter.sent[1].1[20], emitter.sent[1].1[21]]);
    assert_ne!(allocated, 5001);
    assert_eq!(allocated % 2, 1);
}

/// S4: an expired mapping is not found on a late inbound packet and its
/// port is released, all without touching a real clock.
#[test]
fn s4_expired_mapping_drops_and_releases_port() {
    let eng = engine(config(PortAssignment::Preserve, PortParity::Disabled, Hairpin::Disable));
    let mut emitter = RecordingEmitter::new();

    let mut out = udp_datagram(INTERNAL_IP, 5000, PEER_IP, 80);
    let mut out_pkt = Packet::parse(&mut out, "eth1").unwrap();
    assert_eq!(eng.process(&mut out_pkt, &mut emitter, 0), Verdict::Sent);

    let mut late_reply = udp_datagram(PEER_IP, 80, EXTERNAL_IP, 5000);
    let mut late_pkt = Packet::parse(&mut late_reply, "eth0").unwrap();
    assert_eq!(eng.process(&mut late_pkt, &mut emitter, 31), Verdict::Dropped);

    let mut reuse = udp_datagram(INTERNAL_IP_B, 5000, PEER_IP, 80);
    let mut reuse_pkt = Packet::parse(&mut reuse, "eth1").unwrap();
    assert_eq!(eng.process(&mut reuse_pkt, &mut emitter, 32), Verdict::Sent);
    let reused_port = u16::from_be_bytes([emitter.sent[1].1[20], emitter.sent[1].1[21]]);
    assert_eq!(reused_port, 5000);
}

const HAIRPIN_TARGET_PORT: u16 = 8080;

/// S5/S6: an internal host addressing the gateway's own external IP is
/// hairpinned to the internal target of an existing inbound mapping when
/// allowed, and dropped when not.
fn hairpin_setup(hairpin: Hairpin) -> (Engine, RecordingEmitter) {
    // Ports below 1024 are reserved (ports.rs::FIRST_ASSIGNABLE_PORT), so
    // PRESERVE would never actually keep port 80; use an assignable one.
    // Endpoint-Independent filtering is what makes an outbound mapping
    // "inbound-accepting" regardless of which peer the hairpinning host
    // reaches it through.
    let mut cfg = config(PortAssignment::Preserve, PortParity::Disabled, hairpin);
    cfg.filtering_behavior = FilteringBehavior::EndpointIndependent;
    let eng = engine(cfg);
    let mut emitter = RecordingEmitter::new();

    // B's outbound traffic establishes the mapping that the hairpinning
    // packet below will be re-routed through.
    let mut setup = udp_datagram(INTERNAL_IP_B, HAIRPIN_TARGET_PORT, PEER_IP, 53);
    let mut setup_pkt = Packet::parse(&mut setup, "eth1").unwrap();
    assert_eq!(eng.process(&mut setup_pkt, &mut emitter, 0), Verdict::Sent);

    (eng, emitter)
}

#[test]
fn s5_hairpin_allow_delivers_to_internal_target() {
    let (eng, mut emitter) = hairpin_setup(Hairpin::Allow);

    let mut hairpin_pkt_buf = udp_datagram(INTERNAL_IP, 5000, EXTERNAL_IP, HAIRPIN_TARGET_PORT);
    let mut hairpin_pkt = Packet::parse(&mut hairpin_pkt_buf, "eth1").unwrap();
    let verdict = eng.process(&mut hairpin_pkt, &mut emitter, 1);

    assert_eq!(verdict, Verdict::Sent);
    let delivered = emitter.sent.last().unwrap();
    assert_eq!(delivered.0, "eth1");
    assert_eq!(&delivered.1[16..20], &INTERNAL_IP_B);
}

#[test]
fn s6_hairpin_disable_drops() {
    let (eng, mut emitter) = hairpin_setup(Hairpin::Disable);

    let mut hairpin_pkt_buf = udp_datagram(INTERNAL_IP, 5000, EXTERNAL_IP, HAIRPIN_TARGET_PORT);
    let mut hairpin_pkt = Packet::parse(&mut hairpin_pkt_buf, "eth1").unwrap();
    let verdict = eng.process(&mut hairpin_pkt, &mut emitter, 1);

    assert_eq!(verdict, Verdict::Dropped);
}
