//! Platform-specific primitives: AES-256 and the POLYVAL field multiply.
//!
//! The engine requires hardware AES and carry-less multiplication (AES-NI +
//! PCLMULQDQ on x86-64, the crypto extensions on aarch64). There is no
//! software fallback; callers are gated by [`has_hardware_support`].

use core::sync::atomic::{AtomicU8, Ordering};

#[cfg(target_arch = "aarch64")]
mod aarch64;

#[cfg(target_arch = "x86_64")]
mod x86_64;

#[cfg(target_arch = "aarch64")]
use aarch64 as backend;

#[cfg(target_arch = "x86_64")]
use x86_64 as backend;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("gcmsiv requires x86-64 AES-NI or aarch64 crypto extensions");

/// Number of 128-bit round keys in an AES-256 schedule.
pub const ROUND_KEYS: usize = backend::ROUND_KEYS;

/// Expanded AES-256 key schedule, stored as bytes so it can be zeroized.
pub type KeySchedule = [[u8; 16]; ROUND_KEYS];

/// Precomputed powers H^1..H^8 of a POLYVAL hash key.
pub type Htable = [[u8; 16]; 8];

/// CPU capability detection cache.
static CPU_FEATURES: AtomicU8 = AtomicU8::new(0);

const FEATURES_UNKNOWN: u8 = 0;
const FEATURES_HARDWARE: u8 = 1;
const FEATURES_MISSING: u8 = 2;

#[cold]
fn init_cpu_features() -> u8 {
    #[cfg(target_arch = "aarch64")]
    {
        #[cfg(feature = "std")]
        {
            if std::arch::is_aarch64_feature_detected!("aes")
                && std::arch::is_aarch64_feature_detected!("pmull")
            {
                return FEATURES_HARDWARE;
            }
        }
        #[cfg(not(feature = "std"))]
        {
            // In no-std mode, compile-time detection only
            #[cfg(all(target_feature = "neon", target_feature = "aes"))]
            {
                return FEATURES_HARDWARE;
            }
        }
    }

    #[cfg(target_arch = "x86_64")]
    {
        #[cfg(feature = "std")]
        {
            if std::arch::is_x86_feature_detected!("aes")
                && std::arch::is_x86_feature_detected!("pclmulqdq")
            {
                return FEATURES_HARDWARE;
            }
        }
        #[cfg(not(feature = "std"))]
        {
            #[cfg(all(target_feature = "aes", target_feature = "pclmulqdq"))]
            {
                return FEATURES_HARDWARE;
            }
        }
    }

    FEATURES_MISSING
}

/// Whether the CPU provides the AES and carry-less multiply instructions
/// the engine is built on. Cached after the first probe.
#[inline]
pub fn has_hardware_support() -> bool {
    let features = CPU_FEATURES.load(Ordering::Relaxed);
    if features == FEATURES_UNKNOWN {
        let detected = init_cpu_features();
        CPU_FEATURES.store(detected, Ordering::Relaxed);
        detected == FEATURES_HARDWARE
    } else {
        features == FEATURES_HARDWARE
    }
}

/// Expand a 256-bit key into `ks`.
#[inline]
pub fn key_schedule(key: &[u8; 32], ks: &mut KeySchedule) {
    backend::key_schedule(key, ks)
}

/// Expand a 256-bit key into `ks` and encrypt one block under it.
#[inline]
pub fn key_schedule_enc(input: &[u8; 16], key: &[u8; 32], ks: &mut KeySchedule) -> [u8; 16] {
    backend::key_schedule_enc(input, key, ks)
}

/// Encrypt a single block under an expanded schedule.
#[inline]
pub fn encrypt_block(ks: &KeySchedule, block: &[u8; 16]) -> [u8; 16] {
    backend::encrypt_block(ks, block)
}

/// Counter-mode xor of `src` into `dst`, pipelined `width` (4 or 8) blocks
/// at a time, with the counter starting `offset` blocks past the initial
/// counter block derived from `tag`.
#[inline]
pub fn ctr32_xor(
    ks: &KeySchedule,
    tag: &[u8; 16],
    offset: u32,
    src: &[u8],
    dst: &mut [u8],
    width: usize,
) {
    backend::ctr32_xor(ks, tag, offset, src, dst, width)
}

/// One POLYVAL multiply-accumulate step: acc = (acc ^ block) * h * x^-128.
#[inline]
pub fn polyval_mul_acc(acc: &mut [u8; 16], h: &[u8; 16], block: &[u8; 16]) {
    backend::polyval_mul_acc(acc, h, block)
}

/// Precompute the powers H^1..H^8 of a hash key.
#[inline]
pub fn build_htable(h: &[u8; 16], htbl: &mut Htable) {
    backend::build_htable(h, htbl)
}

/// Absorb 1..=8 full blocks using precomputed powers of the hash key.
#[inline]
pub fn polyval_htable(acc: &mut [u8; 16], htbl: &Htable, data: &[u8]) {
    backend::polyval_htable(acc, htbl, data)
}
