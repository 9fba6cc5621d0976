//! Affinity mask codec: binary digit strings and hex digit validation.
//!
//! All functions here are pure and total; interactive truncation of
//! over-long or partially invalid input is a boundary concern and lives in
//! [`crate::engine`].

use crate::config::MASK_BITS;

/// Converts a validated string of `'0'`/`'1'` digits to an integer, most
/// significant bit first. Characters other than `'1'` count as zero bits;
/// callers validate with [`validate_bits`] first.
pub fn bits_to_integer(bits: &str) -> u32 {
    debug_assert!(bits.len() <= MASK_BITS);

    bits.bytes()
        .fold(0u32, |acc, b| (acc << 1) | u32::from(b == b'1'))
}

/// Renders `value` as a fixed-width binary string of `length` digits, most
/// significant bit first. `length` is capped at [`MASK_BITS`].
pub fn integer_to_bits(value: u32, length: usize) -> String {
    let length = length.min(MASK_BITS);

    (0..length)
        .map(|i| {
            if value & (1u32 << (length - 1 - i)) != 0 {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

/// Checks that every character is `'0'` or `'1'`. Returns the index of the
/// first offending character, never a later one.
pub fn validate_bits(bits: &str) -> Result<(), usize> {
    match bits.bytes().position(|b| b != b'0' && b != b'1') {
        Some(index) => Err(index),
        None => Ok(()),
    }
}

/// Checks that every character is a hex digit (`0-9a-fA-F`). Returns the
/// index of the first offending character.
pub fn validate_hex(hex: &str) -> Result<(), usize> {
    match hex.bytes().position(|b| !b.is_ascii_hexdigit()) {
        Some(index) => Err(index),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_to_integer_msb_first() {
        assert_eq!(bits_to_integer("1"), 1);
        assert_eq!(bits_to_integer("10"), 2);
        assert_eq!(bits_to_integer("1010"), 0xA);
        assert_eq!(bits_to_integer("0011"), 3);
        assert_eq!(bits_to_integer(""), 0);
    }

    #[test]
    fn test_bits_to_integer_full_width() {
        assert_eq!(bits_to_integer(&"1".repeat(32)), u32::MAX);
        let mut high_bit = "1".to_string();
        high_bit.push_str(&"0".repeat(31));
        assert_eq!(bits_to_integer(&high_bit), 1 << 31);
    }

    #[test]
    fn test_integer_to_bits_fixed_width() {
        assert_eq!(integer_to_bits(0x3, 4), "0011");
        assert_eq!(integer_to_bits(0xA, 4), "1010");
        assert_eq!(integer_to_bits(1, 1), "1");
        assert_eq!(integer_to_bits(u32::MAX, 32), "1".repeat(32));
    }

    #[test]
    fn test_roundtrip_bits_to_integer_and_back() {
        for bits in ["0", "1", "0110", "11110000", "10101010101010101010101010101010"] {
            assert_eq!(integer_to_bits(bits_to_integer(bits), bits.len()), bits);
        }
    }

    #[test]
    fn test_roundtrip_integer_to_bits_and_back() {
        for mask in [1u32, 0x3, 0xFF, 0xDEADBEEF, u32::MAX - 1, u32::MAX] {
            assert_eq!(bits_to_integer(&integer_to_bits(mask, 32)), mask);
        }
    }

    #[test]
    fn test_validate_bits_reports_first_offender() {
        assert_eq!(validate_bits("0101"), Ok(()));
        assert_eq!(validate_bits(""), Ok(()));
        assert_eq!(validate_bits("0121"), Err(2));
        assert_eq!(validate_bits("x011"), Err(0));
        // Two invalid characters: the first index wins.
        assert_eq!(validate_bits("01x1y"), Err(2));
    }

    #[test]
    fn test_validate_hex_reports_first_offender() {
        assert_eq!(validate_hex("DEADbeef"), Ok(()));
        assert_eq!(validate_hex("0"), Ok(()));
        assert_eq!(validate_hex("1g2"), Err(1));
        assert_eq!(validate_hex("z"), Err(0));
        assert_eq!(validate_hex("ABzCz"), Err(2));
    }
}
