//! # AES-GCM-SIV nonce misuse-resistant AEAD
//!
//! This crate implements AES-GCM-SIV with 256-bit keys, built on hardware
//! AES and carry-less multiplication (AES-NI + PCLMULQDQ on x86-64, the
//! crypto extensions on aarch64).
//!
//! Unlike plain AES-GCM, repeating a nonce under the same key does not
//! reveal plaintext: the authentication tag is derived from the message
//! itself and doubles as the counter-mode starting point, so nonce reuse
//! only reveals whether two (AAD, plaintext) pairs were equal.
//!
//! ## Features
//!
//! - **Misuse resistance**: 256-bit keys, 128-bit nonces and tags, tag
//!   computed over AAD and plaintext before encryption
//! - **High performance**: per-message POLYVAL strategy selection and 4/8-way
//!   pipelined counter mode on the hardware AES units
//! - **Constant time**: data-independent execution, constant-time tag check
//! - **Memory safe**: key material zeroized, ciphertext copy-back on failed
//!   authentication
//! - **No-std compatible**: runtime CPU detection under `std`, compile-time
//!   otherwise
//!
//! ## Usage
//!
//! ```rust
//! use gcmsiv::{encrypt, decrypt};
//!
//! let key = [0u8; 32];      // 256-bit key
//! let nonce = [0u8; 16];    // 128-bit nonce
//! let plaintext = b"Hello, world!";
//! let aad = b"additional data";
//!
//! # if gcmsiv::is_hardware_available() {
//! // Encrypt
//! let (ciphertext, tag) = encrypt(plaintext, aad, &key, &nonce)?;
//!
//! // Decrypt
//! let decrypted = decrypt(&ciphertext, &tag, aad, &key, &nonce)?;
//! assert_eq!(decrypted, plaintext);
//! # }
//! # Ok::<(), gcmsiv::Error>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

extern crate alloc;

mod core;
mod error;
mod intrinsics;
mod polyval;
mod utils;

#[cfg(test)]
mod tests;

pub use crate::core::SivContext;
pub use error::{Error, Result};

use alloc::vec::Vec;

/// Encrypts plaintext with associated data.
///
/// # Arguments
///
/// * `plaintext` - The data to encrypt
/// * `aad` - Additional authenticated data (not encrypted, but authenticated)
/// * `key` - 256-bit encryption key
/// * `nonce` - 128-bit nonce
///
/// # Returns
///
/// A tuple of (ciphertext, authentication_tag) on success, or an error.
///
/// # Security
///
/// - Nonces SHOULD be unique per key; reuse only reveals whether two
///   (AAD, plaintext) pairs were identical, never their content
/// - The key MUST be randomly chosen from a uniform distribution
///
/// # Example
///
/// ```rust
/// use gcmsiv::encrypt;
///
/// let key = [0u8; 32];
/// let nonce = [0u8; 16];
/// # if gcmsiv::is_hardware_available() {
/// let (ciphertext, tag) = encrypt(b"secret message", b"public header", &key, &nonce)?;
/// # }
/// # Ok::<(), gcmsiv::Error>(())
/// ```
pub fn encrypt(
    plaintext: &[u8],
    aad: &[u8],
    key: &[u8; 32],
    nonce: &[u8; 16],
) -> Result<(Vec<u8>, [u8; 16])> {
    core::encrypt(plaintext, aad, key, nonce)
}

/// Decrypts ciphertext and verifies the authentication tag.
///
/// # Arguments
///
/// * `ciphertext` - The encrypted data
/// * `tag` - 128-bit authentication tag
/// * `aad` - Additional authenticated data (must match encryption)
/// * `key` - 256-bit encryption key (must match encryption)
/// * `nonce` - 128-bit nonce (must match encryption)
///
/// # Returns
///
/// The decrypted plaintext on success, or [`Error::AuthenticationFailed`]
/// if the tag does not match.
///
/// # Security
///
/// - Tag comparison is performed in constant time
/// - If verification fails, no plaintext data is returned; use
///   [`SivContext::open_into`] for the detached variant, whose output
///   buffer is overwritten with the ciphertext on failure
pub fn decrypt(
    ciphertext: &[u8],
    tag: &[u8; 16],
    aad: &[u8],
    key: &[u8; 32],
    nonce: &[u8; 16],
) -> Result<Vec<u8>> {
    core::decrypt(ciphertext, tag, aad, key, nonce)
}

/// Whether the CPU provides the AES and carry-less multiply instructions
/// this crate requires. When this returns `false`, every seal/open call
/// fails with [`Error::CpuNotSupported`].
pub fn is_hardware_available() -> bool {
    intrinsics::has_hardware_support()
}
