//! Ensemble payload checksum
//!
//! The instrument appends a 16-bit CCITT checksum (polynomial 0x1021,
//! initial value 0, no reflection) over the payload bytes only. The ensemble
//! header and the checksum field itself are excluded. On the wire it occupies
//! a 4-byte field with the upper 16 bits zero.

use crc::{Crc, Digest, CRC_16_XMODEM};

static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Checksum of a complete payload
pub fn checksum(payload: &[u8]) -> u16 {
    CRC16.checksum(payload)
}

/// Incremental checksum over payload chunks
pub struct ChecksumCalculator {
    digest: Digest<'static, u16>,
    bytes_processed: u64,
}

impl Default for ChecksumCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChecksumCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecksumCalculator")
            .field("bytes_processed", &self.bytes_processed)
            .finish()
    }
}

impl ChecksumCalculator {
    /// Create a new checksum calculator
    pub fn new() -> Self {
        Self {
            digest: CRC16.digest(),
            bytes_processed: 0,
        }
    }

    /// Update checksum with new data
    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
        self.bytes_processed += data.len() as u64;
    }

    /// Get the final checksum
    pub fn finalize(self) -> u16 {
        self.digest.finalize()
    }

    /// Get bytes processed so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Byte-at-a-time form of the instrument firmware's checksum
    fn rolling(payload: &[u8]) -> u16 {
        let mut crc: u16 = 0;
        for &b in payload {
            crc = (crc >> 8) | (crc << 8);
            crc ^= b as u16;
            crc ^= (crc & 0xff) >> 4;
            crc ^= (crc << 8) << 4;
            crc ^= ((crc & 0xff) << 4) << 1;
        }
        crc
    }

    #[test]
    fn test_check_value() {
        assert_eq!(checksum(b"123456789"), 0x31c3);
        assert_eq!(rolling(b"123456789"), 0x31c3);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_matches_rolling_form() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in [1usize, 2, 17, 256, 1031] {
            let payload: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            assert_eq!(checksum(&payload), rolling(&payload), "len {}", len);
        }
    }

    #[test]
    fn test_incremental_equals_oneshot() {
        let data: Vec<u8> = (0..=255u8).cycle().take(700).collect();
        let mut calc = ChecksumCalculator::new();
        calc.update(&data[..100]);
        calc.update(&data[100..]);
        assert_eq!(calc.bytes_processed(), 700);
        assert_eq!(calc.finalize(), checksum(&data));
    }

    #[test]
    fn test_single_bit_flip_changes_checksum() {
        let mut data: Vec<u8> = (0..200u8).collect();
        let before = checksum(&data);
        data[77] ^= 0x04;
        assert_ne!(before, checksum(&data));
    }
}
