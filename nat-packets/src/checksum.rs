/// Folds a 32-bit accumulated sum down into the 16-bit one's-complement range,
/// carrying overflow bits back in until none remain (RFC 1071 §4.1).
fn fold(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Computes the RFC 1071 Internet checksum over `data`.
///
/// The caller is responsible for zeroing the checksum field in `data` before
/// calling this, and for taking the bitwise-NOT of a *partial* sum if
/// combining this with other words via [`sum_be_bytes`] directly. This
/// function already applies the final NOT, so its result is ready to be
/// written into the wire checksum field as-is.
pub fn internet_checksum(data: &[u8]) -> u16 {
    !fold(sum_be_bytes(data))
}

/// Accumulates `data` as big-endian 16-bit words into a 32-bit sum, padding
/// a trailing odd byte with a zero low byte, per RFC 1071.
pub fn sum_be_bytes(data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    let mut sum: u32 = (&mut chunks).fold(0u32, |acc, chunk| {
        acc + u32::from(u16::from_be_bytes([chunk[0], chunk[1]]))
    });
    if let [last] = chunks.remainder() {
        sum += u32::from(u16::from_be_bytes([*last, 0]));
    }
    sum
}

/// Computes a transport-layer checksum (UDP or TCP) over `segment`, prefixed
/// by the IPv4 pseudo-header, with the checksum field inside `segment`
/// treated as zero regardless of its current contents.
///
/// `checksum_offset` is the byte offset of the two checksum bytes within
/// `segment`; they are excluded from the sum and implicitly treated as zero.
pub fn transport_checksum(
    src_ip: u32,
    dst_ip: u32,
    protocol: u8,
    segment: &[u8],
    checksum_offset: usize,
) -> u16 {
    let mut sum: u32 = 0;
    sum += src_ip >> 16;
    sum += src_ip & 0xFFFF;
    sum += dst_ip >> 16;
    sum += dst_ip & 0xFFFF;
    sum += u32::from(protocol);
    sum += segment.len() as u32;

    // Sum the segment in two halves so we can skip the checksum field
    // without allocating a scratch copy.
    sum += sum_be_bytes(&segment[..checksum_offset]);
    sum += sum_be_bytes(&segment[checksum_offset + 2..]);

    !fold(sum)
}
