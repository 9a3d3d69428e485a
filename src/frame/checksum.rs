/// Running 16-bit checksum used by both peers: for each byte, rotate the
/// accumulator right by one bit, then add the byte with wraparound.
///
/// Not a polynomial CRC. The rotate is a bijection on the accumulator, so any
/// byte difference survives to the final value.
pub fn checksum(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &b in data {
        crc = crc.rotate_right(1).wrapping_add(b as u16);
    }
    crc
}

// -- Unit tests --
