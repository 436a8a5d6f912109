//! x86-64 AES-NI + PCLMULQDQ implementation.

#![allow(unsafe_code)]

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

/// Number of 128-bit round keys in an AES-256 schedule.
pub const ROUND_KEYS: usize = 15;

#[inline(always)]
unsafe fn load(block: &[u8; 16]) -> __m128i {
    _mm_loadu_si128(block.as_ptr() as *const __m128i)
}

#[inline(always)]
unsafe fn store(block: &mut [u8; 16], v: __m128i) {
    _mm_storeu_si128(block.as_mut_ptr() as *mut __m128i, v)
}

/// Prefix-xor fold used by the AES-256 key expansion: each 32-bit word of
/// the previous round key is xored into all of its successors, then the
/// (shuffled) aeskeygenassist output is mixed in.
#[inline(always)]
unsafe fn expand_fold(mut k: __m128i, assist: __m128i) -> __m128i {
    k = _mm_xor_si128(k, _mm_slli_si128(k, 4));
    k = _mm_xor_si128(k, _mm_slli_si128(k, 4));
    k = _mm_xor_si128(k, _mm_slli_si128(k, 4));
    _mm_xor_si128(k, assist)
}

/// AES-256 key expansion rounds 2..=14. Even round keys mix in
/// SubWord(RotWord(prev)) ^ rcon, odd ones SubWord(prev). `$emit` is
/// invoked with `(index, key)` after each round key is stored, letting the
/// fused schedule+encrypt variant advance a cipher state in lockstep.
macro_rules! expand_256_rounds {
    ($k0:ident, $k1:ident, $ks:ident, $emit:ident) => {
        $k0 = expand_fold($k0, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k1, 0x01), 0xff));
        store(&mut $ks[2], $k0);
        $emit!(2, $k0);
        $k1 = expand_fold($k1, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k0, 0), 0xaa));
        store(&mut $ks[3], $k1);
        $emit!(3, $k1);
        $k0 = expand_fold($k0, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k1, 0x02), 0xff));
        store(&mut $ks[4], $k0);
        $emit!(4, $k0);
        $k1 = expand_fold($k1, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k0, 0), 0xaa));
        store(&mut $ks[5], $k1);
        $emit!(5, $k1);
        $k0 = expand_fold($k0, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k1, 0x04), 0xff));
        store(&mut $ks[6], $k0);
        $emit!(6, $k0);
        $k1 = expand_fold($k1, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k0, 0), 0xaa));
        store(&mut $ks[7], $k1);
        $emit!(7, $k1);
        $k0 = expand_fold($k0, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k1, 0x08), 0xff));
        store(&mut $ks[8], $k0);
        $emit!(8, $k0);
        $k1 = expand_fold($k1, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k0, 0), 0xaa));
        store(&mut $ks[9], $k1);
        $emit!(9, $k1);
        $k0 = expand_fold($k0, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k1, 0x10), 0xff));
        store(&mut $ks[10], $k0);
        $emit!(10, $k0);
        $k1 = expand_fold($k1, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k0, 0), 0xaa));
        store(&mut $ks[11], $k1);
        $emit!(11, $k1);
        $k0 = expand_fold($k0, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k1, 0x20), 0xff));
        store(&mut $ks[12], $k0);
        $emit!(12, $k0);
        $k1 = expand_fold($k1, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k0, 0), 0xaa));
        store(&mut $ks[13], $k1);
        $emit!(13, $k1);
        $k0 = expand_fold($k0, _mm_shuffle_epi32(_mm_aeskeygenassist_si128($k1, 0x40), 0xff));
        store(&mut $ks[14], $k0);
        $emit!(14, $k0);
    };
}

#[target_feature(enable = "aes")]
unsafe fn key_schedule_impl(key: &[u8; 32], ks: &mut [[u8; 16]; ROUND_KEYS]) {
    let mut k0 = _mm_loadu_si128(key.as_ptr() as *const __m128i);
    let mut k1 = _mm_loadu_si128(key.as_ptr().add(16) as *const __m128i);
    store(&mut ks[0], k0);
    store(&mut ks[1], k1);
    macro_rules! emit_nothing {
        ($i:literal, $k:expr) => {};
    }
    expand_256_rounds!(k0, k1, ks, emit_nothing);
}

/// AES-256 key expansion fused with a first single-block encryption: the
/// cipher state advances one round as each round key is produced.
#[target_feature(enable = "aes")]
unsafe fn key_schedule_enc_impl(
    input: &[u8; 16],
    key: &[u8; 32],
    ks: &mut [[u8; 16]; ROUND_KEYS],
) -> [u8; 16] {
    let mut k0 = _mm_loadu_si128(key.as_ptr() as *const __m128i);
    let mut k1 = _mm_loadu_si128(key.as_ptr().add(16) as *const __m128i);
    store(&mut ks[0], k0);
    store(&mut ks[1], k1);
    let mut state = _mm_xor_si128(load(input), k0);
    state = _mm_aesenc_si128(state, k1);
    macro_rules! emit_round {
        (14, $k:expr) => {
            state = _mm_aesenclast_si128(state, $k);
        };
        ($i:literal, $k:expr) => {
            state = _mm_aesenc_si128(state, $k);
        };
    }
    expand_256_rounds!(k0, k1, ks, emit_round);
    let mut out = [0u8; 16];
    store(&mut out, state);
    out
}

#[target_feature(enable = "aes")]
unsafe fn encrypt_block_impl(ks: &[[u8; 16]; ROUND_KEYS], block: &[u8; 16]) -> [u8; 16] {
    let mut state = _mm_xor_si128(load(block), load(&ks[0]));
    for rk in ks.iter().take(14).skip(1) {
        state = _mm_aesenc_si128(state, load(rk));
    }
    state = _mm_aesenclast_si128(state, load(&ks[14]));
    let mut out = [0u8; 16];
    store(&mut out, state);
    out
}

#[inline(always)]
unsafe fn counter_block(template: &[u8; 16], ctr: u32) -> __m128i {
    let mut b = *template;
    b[..4].copy_from_slice(&ctr.to_le_bytes());
    load(&b)
}

/// Counter-mode encryption pipelined `width` blocks at a time.
///
/// The initial counter block is the tag with its most significant bit forced
/// on; the counter is a 32-bit little-endian wrapping value in bytes 0..4.
/// `offset` starts the counter `offset` blocks past the initial block so
/// callers can process a message in chunks.
#[target_feature(enable = "aes")]
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

    let mut rk = [_mm_setzero_si128(); ROUND_KEYS];
    for (r, k) in rk.iter_mut().zip(ks.iter()) {
        *r = load(k);
    }

    let mut template = *tag;
    template[15] |= 0x80;
    let mut counter =
        u32::from_le_bytes([template[0], template[1], template[2], template[3]]).wrapping_add(offset);

    let mut i = 0usize;
    let stride = 16 * width;
    while i + stride <= src.len() {
        let mut blocks = [_mm_setzero_si128(); 8];
        for (l, blk) in blocks.iter_mut().enumerate().take(width) {
            *blk = _mm_xor_si128(counter_block(&template, counter.wrapping_add(l as u32)), rk[0]);
        }
        for r in rk.iter().take(14).skip(1) {
            for blk in blocks.iter_mut().take(width) {
                *blk = _mm_aesenc_si128(*blk, *r);
            }
        }
        for (l, blk) in blocks.iter_mut().enumerate().take(width) {
            *blk = _mm_aesenclast_si128(*blk, rk[14]);
            let m = _mm_loadu_si128(src.as_ptr().add(i + 16 * l) as *const __m128i);
            _mm_storeu_si128(
                dst.as_mut_ptr().add(i + 16 * l) as *mut __m128i,
                _mm_xor_si128(*blk, m),
            );
        }
        counter = counter.wrapping_add(width as u32);
        i += stride;
    }

    while i < src.len() {
        let mut state = _mm_xor_si128(counter_block(&template, counter), rk[0]);
        for r in rk.iter().take(14).skip(1) {
            state = _mm_aesenc_si128(state, *r);
        }
        state = _mm_aesenclast_si128(state, rk[14]);
        let mut keystream = [0u8; 16];
        store(&mut keystream, state);

        let n = (src.len() - i).min(16);
        for j in 0..n {
            dst[i + j] = src[i + j] ^ keystream[j];
        }
        counter = counter.wrapping_add(1);
        i += n;
    }
}

/// POLYVAL field product a * b * x^-128 over GF(2^128).
///
/// Schoolbook carry-less multiply followed by the two-step Montgomery
/// reduction with x^127 + x^126 + x^121 (the 0xc2... constant); the x^128
/// and x^0 terms of the reduction polynomial fall out of the half swaps.
#[inline(always)]
unsafe fn polyval_dot(a: __m128i, b: __m128i) -> __m128i {
    let t0 = _mm_clmulepi64_si128(a, b, 0x00);
    let t1 = _mm_clmulepi64_si128(a, b, 0x10);
    let t2 = _mm_clmulepi64_si128(a, b, 0x01);
    let t3 = _mm_clmulepi64_si128(a, b, 0x11);
    let mid = _mm_xor_si128(t1, t2);
    let mut lo = _mm_xor_si128(t0, _mm_slli_si128(mid, 8));
    let hi = _mm_xor_si128(t3, _mm_srli_si128(mid, 8));

    let poly = _mm_set_epi64x(0xc200_0000_0000_0000u64 as i64, 0);
    let t = _mm_clmulepi64_si128(lo, poly, 0x10);
    lo = _mm_xor_si128(_mm_shuffle_epi32(lo, 78), t);
    let t = _mm_clmulepi64_si128(lo, poly, 0x10);
    lo = _mm_xor_si128(_mm_shuffle_epi32(lo, 78), t);
    _mm_xor_si128(lo, hi)
}

#[target_feature(enable = "pclmulqdq")]
unsafe fn polyval_mul_acc_impl(acc: &mut [u8; 16], h: &[u8; 16], block: &[u8; 16]) {
    let t = polyval_dot(_mm_xor_si128(load(acc), load(block)), load(h));
    store(acc, t);
}

#[target_feature(enable = "pclmulqdq")]
unsafe fn build_htable_impl(h: &[u8; 16], htbl: &mut [[u8; 16]; 8]) {
    let h_v = load(h);
    let mut power = h_v;
    store(&mut htbl[0], power);
    for entry in htbl.iter_mut().skip(1) {
        power = polyval_dot(power, h_v);
        store(entry, power);
    }
}

#[target_feature(enable = "pclmulqdq")]
unsafe fn polyval_htable_impl(acc: &mut [u8; 16], htbl: &[[u8; 16]; 8], data: &[u8]) {
    let n = data.len() / 16;
    debug_assert!(n >= 1 && n <= 8 && data.len() % 16 == 0);

    let first = _mm_xor_si128(load(acc), _mm_loadu_si128(data.as_ptr() as *const __m128i));
    let mut t = polyval_dot(first, load(&htbl[n - 1]));
    for j in 1..n {
        let blk = _mm_loadu_si128(data.as_ptr().add(16 * j) as *const __m128i);
        t = _mm_xor_si128(t, polyval_dot(blk, load(&htbl[n - 1 - j])));
    }
    store(acc, t);
}

/// Safe wrappers. Callers must have verified AES-NI and PCLMULQDQ support.
#[inline]
pub fn key_schedule(key: &[u8; 32], ks: &mut [[u8; 16]; ROUND_KEYS]) {
    unsafe { key_schedule_impl(key, ks) }
}

#[inline]
pub fn key_schedule_enc(
    input: &[u8; 16],
    key: &[u8; 32],
    ks: &mut [[u8; 16]; ROUND_KEYS],
) -> [u8; 16] {
    unsafe { key_schedule_enc_impl(input, key, ks) }
}

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
