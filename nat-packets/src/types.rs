/// IP protocol numbers relevant to NAT. Unrecognized protocols are carried
/// as `Other` so the engine can classify and drop them without panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpProtocol {
    Icmp,
    Tcp,
    Udp,
    Other(u8),
}

impl IpProtocol {
    pub fn as_u8(self) -> u8 {
        match self {
            IpProtocol::Icmp => 1,
            IpProtocol::Tcp => 6,
            IpProtocol::Udp => 17,
            IpProtocol::Other(n) => n,
        }
    }
}

impl From<u8> for IpProtocol {
    fn from(n: u8) -> Self {
        match n {
            1 => IpProtocol::Icmp,
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            other => IpProtocol::Other(other),
        }
    }
}

/// A UDP 5-tuple, IPs and ports held in host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UdpTuple {
    pub src_ip: u32,
    pub src_port: u16,
    pub dst_ip: u32,
    pub dst_port: u16,
}

/// A TCP 5-tuple, IPs and ports held in host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TcpTuple {
    pub src_ip: u32,
    pub src_port: u16,
    pub dst_ip: u32,
    pub dst_port: u16,
}

/// An ICMP pseudo-tuple: no ports, just the two endpoints. The `identifier`
/// field (echo request/reply id) is reserved for future use and not yet
/// threaded through matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IcmpTuple {
    pub src_ip: u32,
    pub dst_ip: u32,
}

/// A protocol-tagged tuple. Dispatch on the discriminant rather than on
/// separate unrelated types, so table and engine code can stay generic over
/// protocol where the rules are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tuple {
    Udp(UdpTuple),
    Tcp(TcpTuple),
    Icmp(IcmpTuple),
}

impl Tuple {
    pub fn protocol(&self) -> IpProtocol {
        match self {
            Tuple::Udp(_) => IpProtocol::Udp,
            Tuple::Tcp(_) => IpProtocol::Tcp,
            Tuple::Icmp(_) => IpProtocol::Icmp,
        }
    }

    pub fn src_ip(&self) -> u32 {
        match self {
            Tuple::Udp(t) => t.src_ip,
            Tuple::Tcp(t) => t.src_ip,
            Tuple::Icmp(t) => t.src_ip,
        }
    }

    pub fn dst_ip(&self) -> u32 {
        match self {
            Tuple::Udp(t) => t.dst_ip,
            Tuple::Tcp(t) => t.dst_ip,
            Tuple::Icmp(t) => t.dst_ip,
        }
    }

    pub fn src_port(&self) -> Option<u16> {
        match self {
            Tuple::Udp(t) => Some(t.src_port),
            Tuple::Tcp(t) => Some(t.src_port),
            Tuple::Icmp(_) => None,
        }
    }

    pub fn dst_port(&self) -> Option<u16> {
        match self {
            Tuple::Udp(t) => Some(t.dst_port),
            Tuple::Tcp(t) => Some(t.dst_port),
            Tuple::Icmp(_) => None,
        }
    }

    /// Returns a copy of this tuple with its source endpoint replaced.
    pub fn with_src(&self, src_ip: u32, src_port: u16) -> Tuple {
        match self {
            Tuple::Udp(t) => Tuple::Udp(UdpTuple {
                src_ip,
                src_port,
                ..*t
            }),
            Tuple::Tcp(t) => Tuple::Tcp(TcpTuple {
                src_ip,
                src_port,
                ..*t
            }),
            Tuple::Icmp(t) => Tuple::Icmp(IcmpTuple { src_ip, ..*t }),
        }
    }

    /// Returns a copy of this tuple with its destination endpoint replaced.
    pub fn with_dst(&self, dst_ip: u32, dst_port: u16) -> Tuple {
        match self {
            Tuple::Udp(t) => Tuple::Udp(UdpTuple {
                dst_ip,
                dst_port,
                ..*t
            }),
            Tuple::Tcp(t) => Tuple::Tcp(TcpTuple {
                dst_ip,
                dst_port,
                ..*t
            }),
            Tuple::Icmp(t) => Tuple::Icmp(IcmpTuple { dst_ip, ..*t }),
        }
    }
}
