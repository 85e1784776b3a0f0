//! Incremental CRC16 over byte ranges.
//!
//! The checksum doubles as a continuation token: a pipe's running CRC at
//! offset `n` seeds the computation for bytes past `n`, so a checksum can
//! resume mid-stream without re-hashing from the start.

/// Seed for a fresh CRC16 computation.
pub const CRC16_INIT: u16 = 0x1337;

/// CRC16 polynomial (MSB-first).
pub const CRC16_POLYNOMIAL: u16 = 0x3d65;

/// Advance `seed` over `data` and return the new checksum.
///
/// Associative over concatenation: for any split of a byte sequence into
/// `a` and `b`, `crc16(crc16(s, a), b) == crc16(s, [a, b].concat())`.
pub fn crc16(seed: u16, data: &[u8]) -> u16 {
    let mut remainder = seed;
    for &byte in data {
        remainder ^= (byte as u16) << 8;
        for _ in 0..8 {
            remainder = if remainder & 0x8000 != 0 {
                (remainder << 1) ^ CRC16_POLYNOMIAL
            } else {
                remainder << 1
            };
        }
    }
    remainder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_identity() {
        assert_eq!(crc16(CRC16_INIT, b""), CRC16_INIT);
        assert_eq!(crc16(0xABCD, b""), 0xABCD);
    }

    #[test]
    fn associative_over_concatenation() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let whole = crc16(CRC16_INIT, data);

        for split in 0..=data.len() {
            let (a, b) = data.split_at(split);
            assert_eq!(crc16(crc16(CRC16_INIT, a), b), whole, "split at {split}");
        }
    }

    #[test]
    fn associative_with_arbitrary_seed() {
        let a = [0x00, 0xFF, 0x55, 0xAA];
        let b = [0x13, 0x37];
        let both = [0x00, 0xFF, 0x55, 0xAA, 0x13, 0x37];
        assert_eq!(crc16(crc16(0x4242, &a), &b), crc16(0x4242, &both));
    }

    #[test]
    fn distinct_inputs_distinct_checksums() {
        assert_ne!(crc16(CRC16_INIT, b"hello"), crc16(CRC16_INIT, b"hellp"));
        assert_ne!(crc16(CRC16_INIT, b"\x00"), crc16(CRC16_INIT, b"\x00\x00"));
    }

    #[test]
    fn byte_at_a_time_matches_bulk() {
        let data = b"chunked";
        let mut crc = CRC16_INIT;
        for &byte in data.iter() {
            crc = crc16(crc, &[byte]);
        }
        assert_eq!(crc, crc16(CRC16_INIT, data));
    }
}
