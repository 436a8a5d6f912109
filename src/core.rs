//! Core AES-GCM-SIV engine: record-key derivation, tag computation, and
//! seal/open orchestration.

use crate::error::{Error, Result};
use crate::intrinsics::{self, Htable, KeySchedule};
use crate::polyval::{self, HORNER_MAX};
use crate::utils::{self, ct_eq};
use alloc::vec::Vec;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Per-message subkeys derived from the master key and the nonce.
#[derive(Zeroize, ZeroizeOnDrop)]
struct RecordKeys {
    hash_key: [u8; 16],
    enc_key: [u8; 32],
}

/// Reusable engine state: the expanded key schedule, the POLYVAL power
/// table, and the scratch buffer used to stage the final partial block
/// during decryption.
///
/// A context may be reused across messages but must not be shared between
/// concurrent seal/open calls without external synchronization. All key
/// material is zeroed on drop; [`SivContext::clear`] zeroes it eagerly.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SivContext {
    pub(crate) ks: KeySchedule,
    pub(crate) htbl: Htable,
    pub(crate) scratch: [u8; 256],
}

impl Default for SivContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SivContext {
    /// Create a zero-initialized context.
    pub fn new() -> Self {
        Self {
            ks: [[0u8; 16]; intrinsics::ROUND_KEYS],
            htbl: [[0u8; 16]; 8],
            scratch: [0u8; 256],
        }
    }

    /// Overwrite the key schedule, the power table, and the scratch buffer
    /// with zeros. Idempotent, callable at any time.
    pub fn clear(&mut self) {
        self.zeroize();
    }

    /// Derive the 128-bit record hash key and 256-bit record encryption key
    /// from `(key, nonce)`: three chained block encryptions, the first fused
    /// with the key expansion. Leaves the master schedule in `self.ks`.
    fn derive_record_keys(&mut self, key: &[u8; 32], nonce: &[u8; 16]) -> RecordKeys {
        let hash_key = intrinsics::key_schedule_enc(nonce, key, &mut self.ks);
        let hi = intrinsics::encrypt_block(&self.ks, &hash_key);
        let lo = intrinsics::encrypt_block(&self.ks, &hi);
        let mut enc_key = [0u8; 32];
        enc_key[..16].copy_from_slice(&lo);
        enc_key[16..].copy_from_slice(&hi);
        RecordKeys { hash_key, enc_key }
    }

    /// Encrypt `plaintext` with associated data, returning the ciphertext
    /// and the 128-bit authentication tag.
    pub fn seal(
        &mut self,
        plaintext: &[u8],
        aad: &[u8],
        key: &[u8; 32],
        nonce: &[u8; 16],
    ) -> Result<(Vec<u8>, [u8; 16])> {
        utils::validate_lengths(plaintext.len(), aad.len())?;
        if !intrinsics::has_hardware_support() {
            return Err(Error::CpuNotSupported);
        }

        let keys = self.derive_record_keys(key, nonce);
        let len_blk = polyval::length_block(aad.len(), plaintext.len());
        let mut acc = [0u8; 16];
        let short = aad.len() + plaintext.len() <= HORNER_MAX;
        if short {
            polyval::absorb_horner(&mut acc, &keys.hash_key, aad);
            polyval::absorb_horner(&mut acc, &keys.hash_key, plaintext);
            polyval::absorb_horner(&mut acc, &keys.hash_key, &len_blk);
        } else {
            intrinsics::build_htable(&keys.hash_key, &mut self.htbl);
            polyval::absorb_htable(&mut acc, &self.htbl, aad);
            polyval::absorb_htable(&mut acc, &self.htbl, plaintext);
            polyval::absorb_htable(&mut acc, &self.htbl, &len_blk);
        }
        polyval::finalize(&mut acc, nonce);

        // Switching the schedule to the record encryption key while
        // encrypting the masked pre-tag yields the tag in one pass.
        let tag = intrinsics::key_schedule_enc(&acc, &keys.enc_key, &mut self.ks);
        acc.zeroize();

        let mut ciphertext = Vec::new();
        ciphertext.resize(plaintext.len(), 0);
        let width = if short { 4 } else { 8 };
        intrinsics::ctr32_xor(&self.ks, &tag, 0, plaintext, &mut ciphertext, width);

        Ok((ciphertext, tag))
    }

    /// Decrypt `ciphertext` into a fresh buffer and verify the tag.
    pub fn open(
        &mut self,
        ciphertext: &[u8],
        tag: &[u8; 16],
        aad: &[u8],
        key: &[u8; 32],
        nonce: &[u8; 16],
    ) -> Result<Vec<u8>> {
        let mut plaintext = Vec::new();
        plaintext.resize(ciphertext.len(), 0);
        match self.open_into(&mut plaintext, ciphertext, tag, aad, key, nonce) {
            Ok(()) => Ok(plaintext),
            Err(e) => {
                plaintext.as_mut_slice().zeroize();
                Err(e)
            }
        }
    }

    /// Decrypt `ciphertext` into `output` and verify the tag.
    ///
    /// On [`Error::AuthenticationFailed`] the output buffer is overwritten
    /// with the ciphertext, so a caller that ignores the result never sees
    /// unauthenticated plaintext. `output` must be exactly as long as
    /// `ciphertext` and must not alias it.
    pub fn open_into(
        &mut self,
        output: &mut [u8],
        ciphertext: &[u8],
        tag: &[u8; 16],
        aad: &[u8],
        key: &[u8; 32],
        nonce: &[u8; 16],
    ) -> Result<()> {
        utils::validate_lengths(ciphertext.len(), aad.len())?;
        if output.len() != ciphertext.len() {
            return Err(Error::OutputLengthMismatch);
        }
        if !intrinsics::has_hardware_support() {
            return Err(Error::CpuNotSupported);
        }

        // Decryption always takes the table path.
        let keys = self.derive_record_keys(key, nonce);
        intrinsics::build_htable(&keys.hash_key, &mut self.htbl);
        intrinsics::key_schedule(&keys.enc_key, &mut self.ks);

        let mut acc = [0u8; 16];
        polyval::absorb_horner(&mut acc, &keys.hash_key, aad);

        // Decrypt and hash the recovered plaintext in lockstep, eight
        // blocks per step; the final partial block is zero-padded through
        // the scratch buffer before absorption.
        let mut off = 0usize;
        while off + 128 <= ciphertext.len() {
            intrinsics::ctr32_xor(
                &self.ks,
                tag,
                (off / 16) as u32,
                &ciphertext[off..off + 128],
                &mut output[off..off + 128],
                8,
            );
            intrinsics::polyval_htable(&mut acc, &self.htbl, &output[off..off + 128]);
            off += 128;
        }
        if off < ciphertext.len() {
            let rem = ciphertext.len() - off;
            intrinsics::ctr32_xor(
                &self.ks,
                tag,
                (off / 16) as u32,
                &ciphertext[off..],
                &mut output[off..],
                8,
            );
            let padded = (rem + 15) / 16 * 16;
            self.scratch[..rem].copy_from_slice(&output[off..]);
            self.scratch[rem..padded].fill(0);
            intrinsics::polyval_htable(&mut acc, &self.htbl, &self.scratch[..padded]);
            self.scratch[..padded].zeroize();
        }

        let len_blk = polyval::length_block(aad.len(), ciphertext.len());
        polyval::absorb_horner(&mut acc, &keys.hash_key, &len_blk);
        polyval::finalize(&mut acc, nonce);
        let expected = intrinsics::encrypt_block(&self.ks, &acc);
        acc.zeroize();

        if !ct_eq(tag, &expected) {
            output.copy_from_slice(ciphertext);
            return Err(Error::AuthenticationFailed);
        }
        Ok(())
    }
}

/// Encrypt with a fresh context.
pub fn encrypt(
    plaintext: &[u8],
    aad: &[u8],
    key: &[u8; 32],
    nonce: &[u8; 16],
) -> Result<(Vec<u8>, [u8; 16])> {
    SivContext::new().seal(plaintext, aad, key, nonce)
}

/// Decrypt with a fresh context.
pub fn decrypt(
    ciphertext: &[u8],
    tag: &[u8; 16],
    aad: &[u8],
    key: &[u8; 32],
    nonce: &[u8; 16],
) -> Result<Vec<u8>> {
    SivContext::new().open(ciphertext, tag, aad, key, nonce)
}
