//! Frame checksum.
//!
//! The module XORs every byte of the frame and reduces each intermediate
//! value modulo 0xFF, so a running value of exactly 0xFF collapses to 0. The
//! reduction makes the fold order-sensitive; callers must feed bytes in wire
//! order. Hardware interoperability depends on this exact behavior.

/// XOR-fold `bytes`, reducing each intermediate modulo 0xFF.
pub fn compute(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |acc, &byte| ((acc ^ byte) as u16 % 0xFF) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_zero() {
        assert_eq!(compute(&[]), 0);
    }

    #[test]
    fn single_ff_reduces_to_zero() {
        assert_eq!(compute(&[0xFF]), 0);
    }

    #[test]
    fn known_frames() {
        assert_eq!(compute(&[0xA4, 0x01, 0x4A, 0x00]), 0xEF);
        assert_eq!(compute(&[0xA4, 0x03, 0x42, 0x00, 0x00, 0x00]), 0xE5);
    }

    #[test]
    fn never_produces_ff() {
        for a in 0..=255u8 {
            for b in [0x00u8, 0x0F, 0x5A, 0xA5, 0xF0, 0xFF] {
                assert_ne!(compute(&[a, b]), 0xFF);
                assert_ne!(compute(&[b, a, 0xA4]), 0xFF);
            }
        }
    }

    #[test]
    fn deterministic() {
        let data = [0xA4, 0x09, 0x4E, 1, 2, 3, 4, 5, 6, 7, 8, 9];
        assert_eq!(compute(&data), compute(&data));
    }
}
