//! Utility functions for byte manipulation and input validation.

use crate::error::{Error, Result};

/// Maximum length for plaintext and associated data (2^36 bytes).
pub const MAX_DATA_LEN: u64 = 1u64 << 36;

/// Convert a 64-bit integer to little-endian bytes.
#[inline]
pub fn le64(n: u64) -> [u8; 8] {
    n.to_le_bytes()
}

/// XOR two 16-byte blocks.
#[inline]
pub fn xor_block(a: &[u8; 16], b: &[u8; 16]) -> [u8; 16] {
    let mut result = [0u8; 16];
    for i in 0..16 {
        result[i] = a[i] ^ b[i];
    }
    result
}

/// Constant-time comparison of two byte arrays.
#[inline]
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

/// Validate message and associated data lengths.
pub fn validate_lengths(msg_len: usize, aad_len: usize) -> Result<()> {
    if (msg_len as u64) > MAX_DATA_LEN {
        return Err(Error::PlaintextTooLong);
    }

    if (aad_len as u64) > MAX_DATA_LEN {
        return Err(Error::AssociatedDataTooLong);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_le64() {
        assert_eq!(
            le64(0x1234567890abcdef),
            [0xef, 0xcd, 0xab, 0x90, 0x78, 0x56, 0x34, 0x12]
        );
        assert_eq!(le64(0), [0; 8]);
    }

    #[test]
    fn test_xor_block() {
        let a = [0xf0; 16];
        let b = [0x0f; 16];
        assert_eq!(xor_block(&a, &b), [0xff; 16]);
    }

    #[test]
    fn test_ct_eq() {
        assert!(ct_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!ct_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!ct_eq(&[1, 2], &[1, 2, 3]));
    }

    #[test]
    fn test_validate_lengths() {
        assert!(validate_lengths(100, 200).is_ok());
        assert!(validate_lengths(0, 0).is_ok());
    }
}
