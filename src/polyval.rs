//! POLYVAL universal hash engine.
//!
//! Two absorption strategies over the same field multiply: a sequential
//! Horner pass for short inputs and a table-accelerated pass that consumes
//! eight blocks per step using precomputed powers of the hash key. Both
//! produce bit-identical accumulators; the split is purely a throughput
//! tradeoff.

use crate::intrinsics::{self, Htable};
use crate::utils::{le64, xor_block};

/// Total AAD + message size (bytes) up to which sealing uses the
/// sequential strategy.
pub(crate) const HORNER_MAX: usize = 128;

/// Absorb `data`, implicitly zero-padded to a 16-byte boundary, one block
/// at a time.
pub(crate) fn absorb_horner(acc: &mut [u8; 16], h: &[u8; 16], data: &[u8]) {
    let mut chunks = data.chunks_exact(16);
    for chunk in chunks.by_ref() {
        let mut block = [0u8; 16];
        block.copy_from_slice(chunk);
        intrinsics::polyval_mul_acc(acc, h, &block);
    }
    let rem = chunks.remainder();
    if !rem.is_empty() {
        let mut block = [0u8; 16];
        block[..rem.len()].copy_from_slice(rem);
        intrinsics::polyval_mul_acc(acc, h, &block);
    }
}

/// Absorb `data`, implicitly zero-padded, eight blocks per step via the
/// precomputed power table.
pub(crate) fn absorb_htable(acc: &mut [u8; 16], htbl: &Htable, data: &[u8]) {
    let mut i = 0usize;
    while i + 128 <= data.len() {
        intrinsics::polyval_htable(acc, htbl, &data[i..i + 128]);
        i += 128;
    }
    let full = (data.len() - i) / 16 * 16;
    if full > 0 {
        intrinsics::polyval_htable(acc, htbl, &data[i..i + full]);
        i += full;
    }
    if i < data.len() {
        let mut block = [0u8; 16];
        block[..data.len() - i].copy_from_slice(&data[i..]);
        intrinsics::polyval_htable(acc, htbl, &block);
    }
}

/// Length block: bit lengths of AAD and message as two little-endian
/// 64-bit words. This layout is wire-relevant and must not change.
pub(crate) fn length_block(aad_len: usize, msg_len: usize) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[..8].copy_from_slice(&le64(aad_len as u64 * 8));
    block[8..].copy_from_slice(&le64(msg_len as u64 * 8));
    block
}

/// Shared finalization: xor the nonce into the accumulator and clear the
/// most significant bit of the high word.
pub(crate) fn finalize(acc: &mut [u8; 16], nonce: &[u8; 16]) {
    *acc = xor_block(acc, nonce);
    acc[15] &= 0x7f;
}
