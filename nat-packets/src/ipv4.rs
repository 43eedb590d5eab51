use crate::checksum::{internet_checksum, transport_checksum};
use crate::error::PacketError;
use crate::types::{IcmpTuple, IpProtocol, TcpTuple, Tuple, UdpTuple};

/// A view over the bytes of a single IPv4 datagram (header plus payload,
/// no link-layer framing). Field accessors read host-order values out of
/// the network-order wire bytes; mutators do the reverse and leave the
/// header checksum stale until [`Ipv4Header::set_checksum`] is called.
pub struct Ipv4Header<'a> {
    data: &'a mut [u8],
}

impl<'a> Ipv4Header<'a> {
    /// Parses `data` as an IPv4 datagram, validating just enough of the
    /// header to make every other method on this type safe to call.
    pub fn parse(data: &'a mut [u8]) -> Result<Self, PacketError> {
        if data.len() < 20 {
            return Err(PacketError::MalformedPacket("buffer shorter than a minimal IPv4 header"));
        }
        if data[0] >> 4 != 4 {
            return Err(PacketError::MalformedPacket("version field is not 4"));
        }
        let ihl = data[0] & 0x0F;
        if ihl < 5 {
            return Err(PacketError::MalformedPacket("IHL is smaller than the minimum header"));
        }
        let header_len = usize::from(ihl) * 4;
        let total_len = u16::from_be_bytes([data[2], data[3]]) as usize;
        if total_len > data.len() || total_len < header_len {
            return Err(PacketError::MalformedPacket("total length exceeds buffer or header"));
        }
        Ok(Ipv4Header { data })
    }

    pub fn ihl(&self) -> u8 {
        self.data[0] & 0x0F
    }

    pub fn header_len(&self) -> u16 {
        u16::from(self.ihl()) * 4
    }

    pub fn total_len(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[9])
    }

    pub fn src_ip(&self) -> u32 {
        u32::from_be_bytes([self.data[12], self.data[13], self.data[14], self.data[15]])
    }

    pub fn dst_ip(&self) -> u32 {
        u32::from_be_bytes([self.data[16], self.data[17], self.data[18], self.data[19]])
    }

    fn set_src_ip(&mut self, ip: u32) {
        self.data[12..16].copy_from_slice(&ip.to_be_bytes());
    }

    fn set_dst_ip(&mut self, ip: u32) {
        self.data[16..20].copy_from_slice(&ip.to_be_bytes());
    }

    pub fn frag_id(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    pub fn frag_flags(&self) -> u16 {
        u16::from_be_bytes([self.data[6], self.data[7]])
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes([self.data[10], self.data[11]])
    }

    /// The full datagram as wire bytes, for handing off to the emit path.
    pub fn raw(&self) -> &[u8] {
        self.data
    }

    /// Recomputes and stores the IPv4 header checksum over the header bytes
    /// only (`header_len`), per RFC 791 with the checksum field zeroed.
    pub fn set_checksum(&mut self) {
        let header_len = self.header_len() as usize;
        self.data[10] = 0;
        self.data[11] = 0;
        let sum = internet_checksum(&self.data[..header_len]);
        self.data[10..12].copy_from_slice(&sum.to_be_bytes());
    }

    fn payload(&self) -> &[u8] {
        &self.data[self.header_len() as usize..]
    }

    /// Reads out the protocol-appropriate tuple embedded in this datagram.
    /// Fails with [`PacketError::InvalidProtocol`] if the caller asks for a
    /// protocol other than the one in the header.
    pub fn get_tuple(&self, want: IpProtocol) -> Result<Tuple, PacketError> {
        if self.protocol().as_u8() != want.as_u8() {
            return Err(PacketError::InvalidProtocol);
        }
        let src_ip = self.src_ip();
        let dst_ip = self.dst_ip();
        match want {
            IpProtocol::Udp => {
                let p = self.payload();
                if p.len() < 8 {
                    return Err(PacketError::MalformedPacket("UDP header truncated"));
                }
                Ok(Tuple::Udp(UdpTuple {
                    src_ip,
                    src_port: u16::from_be_bytes([p[0], p[1]]),
                    dst_ip,
                    dst_port: u16::from_be_bytes([p[2], p[3]]),
                }))
            }
            IpProtocol::Tcp => {
                let p = self.payload();
                if p.len() < 20 {
                    return Err(PacketError::MalformedPacket("TCP header truncated"));
                }
                Ok(Tuple::Tcp(TcpTuple {
                    src_ip,
                    src_port: u16::from_be_bytes([p[0], p[1]]),
                    dst_ip,
                    dst_port: u16::from_be_bytes([p[2], p[3]]),
                }))
            }
            IpProtocol::Icmp => Ok(Tuple::Icmp(IcmpTuple { src_ip, dst_ip })),
            IpProtocol::Other(_) => Err(PacketError::InvalidProtocol),
        }
    }

    /// Overwrites the source/destination addresses (and, for UDP/TCP, ports)
    /// in place, then recomputes the IPv4 and transport checksums.
    pub fn set_tuple(&mut self, tuple: &Tuple) -> Result<(), PacketError> {
        if self.protocol().as_u8() != tuple.protocol().as_u8() {
            return Err(PacketError::InvalidProtocol);
        }

        self.set_src_ip(tuple.src_ip());
        self.set_dst_ip(tuple.dst_ip());

        let header_len = self.header_len() as usize;
        match tuple {
            Tuple::Udp(t) => {
                self.data[header_len..header_len + 2].copy_from_slice(&t.src_port.to_be_bytes());
                self.data[header_len + 2..header_len + 4].copy_from_slice(&t.dst_port.to_be_bytes());
                self.set_udp_checksum();
            }
            Tuple::Tcp(t) => {
                self.data[header_len..header_len + 2].copy_from_slice(&t.src_port.to_be_bytes());
                self.data[header_len + 2..header_len + 4].copy_from_slice(&t.dst_port.to_be_bytes());
                self.set_tcp_checksum();
            }
            Tuple::Icmp(_) => {}
        }

        self.set_checksum();
        Ok(())
    }

    /// Recomputes the UDP checksum over the pseudo-header + UDP segment.
    /// A checksum of exactly zero on the wire means "no checksum" per RFC
    /// 768; we always produce a real one, remapping an all-zero fold to
    /// 0xFFFF (the reserved "computed as zero" wire value) so the packet
    /// is never mistaken for checksum-disabled.
    fn set_udp_checksum(&mut self) {
        let header_len = self.header_len() as usize;
        let src_ip = self.src_ip();
        let dst_ip = self.dst_ip();
        let segment = &self.data[header_len..];
        let checksum_offset = 6;
        let mut checksum = transport_checksum(src_ip, dst_ip, IpProtocol::Udp.as_u8(), segment, checksum_offset);
        if checksum == 0 {
            checksum = 0xFFFF;
        }
        self.data[header_len + 6..header_len + 8].copy_from_slice(&checksum.to_be_bytes());
    }

    /// Recomputes the TCP checksum over the pseudo-header + TCP segment.
    fn set_tcp_checksum(&mut self) {
        let header_len = self.header_len() as usize;
        let src_ip = self.src_ip();
        let dst_ip = self.dst_ip();
        let segment = &self.data[header_len..];
        let checksum_offset = 16;
        let checksum = transport_checksum(src_ip, dst_ip, IpProtocol::Tcp.as_u8(), segment, checksum_offset);
        self.data[header_len + 16..header_len + 18].copy_from_slice(&checksum.to_be_bytes());
    }
}
