//! ARM NEON + Crypto Extensions implementation.
//!
//! The AES round functions and the PMULL carry-less multiply map directly to
//! crypto-extension instructions. aarch64 has no key-expansion instruction,
//! so the AES-256 schedule derives SubWord from AESE against a zero round
//! key, keeping the expansion on the crypto unit with no key-dependent
//! memory accesses.

#![allow(unsafe_code)]

#[cfg(target_arch = "aarch64")]
use core::arch::aarch64::*;

/// Number of 128-bit round keys in an AES-256 schedule.
pub const ROUND_KEYS: usize = 15;

/// S-box substitution of each byte of `w`. The word is broadcast to all four
/// columns, so the ShiftRows half of AESE permutes equal bytes and only
/// SubBytes remains; AESE against a zero key skips AddRoundKey.
#[inline(always)]
unsafe fn sub_word(w: u32) -> u32 {
    let v = vreinterpretq_u8_u32(vdupq_n_u32(w));
    let s = vaeseq_u8(v, vdupq_n_u8(0));
    vgetq_lane_u32::<0>(vreinterpretq_u32_u8(s))
}

/// AES-256 key expansion (FIPS-197 words w[0..60], little-endian in `u32`).
#[target_feature(enable = "neon,aes")]
unsafe fn key_schedule_impl(key: &[u8; 32], ks: &mut [[u8; 16]; ROUND_KEYS]) {
    let mut w = [0u32; 60];
    for (i, chunk) in key.chunks_exact(4).enumerate() {
        w[i] = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let mut rcon: u32 = 1;
    for i in 8..60 {
        let prev = w[i - 1];
        let t = if i % 8 == 0 {
            // RotWord is a byte rotation, one lane right in LE layout.
            let t = sub_word(prev.rotate_right(8)) ^ rcon;
            rcon <<= 1;
            t
        } else if i % 8 == 4 {
            sub_word(prev)
        } else {
            prev
        };
        w[i] = w[i - 8] ^ t;
    }
    for (r, rk) in ks.iter_mut().enumerate() {
        for c in 0..4 {
            rk[4 * c..4 * c + 4].copy_from_slice(&w[4 * r + c].to_le_bytes());
        }
    }
}

/// Expand a 256-bit key into `ks`.
#[inline]
pub fn key_schedule(key: &[u8; 32], ks: &mut [[u8; 16]; ROUND_KEYS]) {
    unsafe { key_schedule_impl(key, ks) }
}

/// Key expansion plus first-block encryption. aarch64 has no fused form;
/// the two-step composition is bit-identical to the x86-64 fused path.
pub fn key_schedule_enc(
    input: &[u8; 16],
    key: &[u8; 32],
    ks: &mut [[u8; 16]; ROUND_KEYS],
) -> [u8; 16] {
    key_schedule(key, ks);
    encrypt_block(ks, input)
}

#[inline(always)]
unsafe fn encrypt_rounds(rk: &[uint8x16_t; ROUND_KEYS], block: uint8x16_t) -> uint8x16_t {
    let mut state = block;
    for key in rk.iter().take(13) {
        state = vaesmcq_u8(vaeseq_u8(state, *key));
    }
    state = vaeseq_u8(state, rk[13]);
    veorq_u8(state, rk[14])
}

#[inline(always)]
unsafe fn load_round_keys(ks: &[[u8; 16]; ROUND_KEYS]) -> [uint8x16_t; ROUND_KEYS] {
    let mut rk = [vdupq_n_u8(0); ROUND_KEYS];
    for (r, k) in rk.iter_mut().zip(ks.iter()) {
        *r = vld1q_u8(k.as_ptr());
    }
    rk
}

#[target_feature(enable = "neon,aes")]
unsafe fn encrypt_block_impl(ks: &[[u8; 16]; ROUND_KEYS], block: &[u8; 16]) -> [u8; 16] {
    let rk = load_round_keys(ks);
    let state = encrypt_rounds(&rk, vld1q_u8(block.as_ptr()));
    let mut out = [0u8; 16];
    vst1q_u8(out.as_mut_ptr(), state);
    out
}

#[inline(always)]
unsafe fn counter_block(template: &[u8; 16], ctr: u32) -> uint8x16_t {
    let mut b = *template;
    b[..4].copy_from_slice(&ctr.to_le_bytes());
    vld1q_u8(b.as_ptr())
}

/// Counter-mode encryption pipelined `width` blocks at a time; see the
/// x86-64 backend for the counter-block layout.
#[target_feature(enable = "neon,aes")]
unsafe fn ctr32_xor_impl(
    ks: &[[u8; 16]; ROUND_KEYS],
    tag: &[u8; 16],
    offset: u32,
    src: &[u8],
    dst: &mut [u8],
    width: usize,
) {
    debug_assert_eq!(src.len(), dst.len());
    debug_assert!(width <= 8);

    let rk = load_round_keys(ks);
    let mut template = *tag;
    template[15] |= 0x80;
    let mut counter =
        u32::from_le_bytes([template[0], template[1], template[2], template[3]]).wrapping_add(offset);

    let mut i = 0usize;
    let stride = 16 * width;
    while i + stride <= src.len() {
        let mut blocks = [vdupq_n_u8(0); 8];
        for (l, blk) in blocks.iter_mut().enumerate().take(width) {
            *blk = counter_block(&template, counter.wrapping_add(l as u32));
        }
        for key in rk.iter().take(13) {
            for blk in blocks.iter_mut().take(width) {
                *blk = vaesmcq_u8(vaeseq_u8(*blk, *key));
            }
        }
        for (l, blk) in blocks.iter_mut().enumerate().take(width) {
            let ksm = veorq_u8(vaeseq_u8(*blk, rk[13]), rk[14]);
            let m = vld1q_u8(src.as_ptr().add(i + 16 * l));
            vst1q_u8(dst.as_mut_ptr().add(i + 16 * l), veorq_u8(ksm, m));
        }
        counter = counter.wrapping_add(width as u32);
        i += stride;
    }

    while i < src.len() {
        let state = encrypt_rounds(&rk, counter_block(&template, counter));
        let mut keystream = [0u8; 16];
        vst1q_u8(keystream.as_mut_ptr(), state);

        let n = (src.len() - i).min(16);
        for j in 0..n {
            dst[i + j] = src[i + j] ^ keystream[j];
        }
        counter = counter.wrapping_add(1);
        i += n;
    }
}

/// POLYVAL field product a * b * x^-128 over GF(2^128), via PMULL.
///
/// Same schoolbook multiply and two-step Montgomery reduction as the x86-64
/// backend, expressed on u128 halves (PMULL takes scalar 64-bit operands).
#[inline(always)]
unsafe fn polyval_dot(a: u128, b: u128) -> u128 {
    let t0 = vmull_p64(a as u64, b as u64);
    let t1 = vmull_p64(a as u64, (b >> 64) as u64);
    let t2 = vmull_p64((a >> 64) as u64, b as u64);
    let t3 = vmull_p64((a >> 64) as u64, (b >> 64) as u64);
    let mid = t1 ^ t2;
    let mut lo = t0 ^ (mid << 64);
    let hi = t3 ^ (mid >> 64);

    const POLY: u64 = 0xc200_0000_0000_0000;
    let t = vmull_p64(lo as u64, POLY);
    lo = lo.rotate_left(64) ^ t;
    let t = vmull_p64(lo as u64, POLY);
    lo = lo.rotate_left(64) ^ t;
    lo ^ hi
}

#[target_feature(enable = "neon,aes")]
unsafe fn polyval_mul_acc_impl(acc: &mut [u8; 16], h: &[u8; 16], block: &[u8; 16]) {
    let a = u128::from_le_bytes(*acc) ^ u128::from_le_bytes(*block);
    *acc = polyval_dot(a, u128::from_le_bytes(*h)).to_le_bytes();
}

#[target_feature(enable = "neon,aes")]
unsafe fn build_htable_impl(h: &[u8; 16], htbl: &mut [[u8; 16]; 8]) {
    let h_v = u128::from_le_bytes(*h);
    let mut power = h_v;
    htbl[0] = power.to_le_bytes();
    for entry in htbl.iter_mut().skip(1) {
        power = polyval_dot(power, h_v);
        *entry = power.to_le_bytes();
    }
}

#[target_feature(enable = "neon,aes")]
unsafe fn polyval_htable_impl(acc: &mut [u8; 16], htbl: &[[u8; 16]; 8], data: &[u8]) {
    let n = data.len() / 16;
    debug_assert!(n >= 1 && n <= 8 && data.len() % 16 == 0);

    let mut blk = [0u8; 16];
    blk.copy_from_slice(&data[..16]);
    let first = u128::from_le_bytes(*acc) ^ u128::from_le_bytes(blk);
    let mut t = polyval_dot(first, u128::from_le_bytes(htbl[n - 1]));
    for j in 1..n {
        blk.copy_from_slice(&data[16 * j..16 * (j + 1)]);
        t ^= polyval_dot(u128::from_le_bytes(blk), u128::from_le_bytes(htbl[n - 1 - j]));
    }
    *acc = t.to_le_bytes();
}

/// Safe wrappers. Callers must have verified AES and PMULL support.
#[inline]
pub fn encrypt_block(ks: &[[u8; 16]; ROUND_KEYS], block: &[u8; 16]) -> [u8; 16] {
    unsafe { encrypt_block_impl(ks, block) }
}

#[inline]
pub fn ctr32_xor(
    ks: &[[u8; 16]; ROUND_KEYS],
    tag: &[u8; 16],
    offset: u32,
    src: &[u8],
    dst: &mut [u8],
    width: usize,
) {
    unsafe { ctr32_xor_impl(ks, tag, offset, src, dst, width) }
}

#[inline]
pub fn polyval_mul_acc(acc: &mut [u8; 16], h: &[u8; 16], block: &[u8; 16]) {
    unsafe { polyval_mul_acc_impl(acc, h, block) }
}

#[inline]
pub fn build_htable(h: &[u8; 16], htbl: &mut [[u8; 16]; 8]) {
    unsafe { build_htable_impl(h, htbl) }
}

#[inline]
pub fn polyval_htable(acc: &mut [u8; 16], htbl: &[[u8; 16]; 8], data: &[u8]) {
    unsafe { polyval_htable_impl(acc, htbl, data) }
}
