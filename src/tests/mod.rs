//! Integration tests for the AEAD engine.


use crate::{decrypt, encrypt, is_hardware_available, Error, SivContext};

const KEY: [u8; 32] = [0x41u8; 32];
const NONCE: [u8; 16] = [0x42u8; 16];

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(167).wrapping_add(13)).collect()
}

#[test]
fn test_roundtrip_across_sizes() {
    if !is_hardware_available() {
        return;
    }
    // Sizes chosen to cross block, pipeline, and strategy boundaries.
    for msg_len in [0usize, 1, 15, 16, 17, 63, 64, 65, 100, 127, 128, 129, 255, 256, 1000] {
        for aad_len in [0usize, 1, 16, 30, 128] {
            let msg = sample(msg_len);
            let aad = sample(aad_len);
            let (ct, tag) = encrypt(&msg, &aad, &KEY, &NONCE).unwrap();
            assert_eq!(ct.len(), msg.len());
            let pt = decrypt(&ct, &tag, &aad, &KEY, &NONCE).unwrap();
            assert_eq!(pt, msg, "roundtrip failed for msg={msg_len} aad={aad_len}");
        }
    }
}

#[test]
fn test_determinism() {
    if !is_hardware_available() {
        return;
    }
    let msg = sample(200);
    let aad = sample(33);
    let (ct1, tag1) = encrypt(&msg, &aad, &KEY, &NONCE).unwrap();
    let (ct2, tag2) = encrypt(&msg, &aad, &KEY, &NONCE).unwrap();
    assert_eq!(ct1, ct2);
    assert_eq!(tag1, tag2);
}

#[test]
fn test_tamper_detection_ciphertext() {
    if !is_hardware_available() {
        return;
    }
    let msg = sample(150);
    let aad = sample(20);
    let (ct, tag) = encrypt(&msg, &aad, &KEY, &NONCE).unwrap();

    for pos in [0usize, 1, 17, 75, 149] {
        for bit in [0u8, 3, 7] {
            let mut tampered = ct.clone();
            tampered[pos] ^= 1 << bit;
            assert_eq!(
                decrypt(&tampered, &tag, &aad, &KEY, &NONCE),
                Err(Error::AuthenticationFailed),
                "bit {bit} of byte {pos} not detected"
            );
        }
    }
}

#[test]
fn test_tamper_detection_tag() {
    if !is_hardware_available() {
        return;
    }
    let msg = sample(40);
    let aad = sample(12);
    let (ct, tag) = encrypt(&msg, &aad, &KEY, &NONCE).unwrap();

    for pos in 0..16 {
        let mut bad_tag = tag;
        bad_tag[pos] ^= 0x80;
        assert_eq!(
            decrypt(&ct, &bad_tag, &aad, &KEY, &NONCE),
            Err(Error::AuthenticationFailed)
        );
    }
}

#[test]
fn test_wrong_aad_key_nonce_fail() {
    if !is_hardware_available() {
        return;
    }
    let msg = sample(64);
    let aad = sample(16);
    let (ct, tag) = encrypt(&msg, &aad, &KEY, &NONCE).unwrap();

    assert!(decrypt(&ct, &tag, b"other aad", &KEY, &NONCE).is_err());

    let mut other_key = KEY;
    other_key[31] ^= 1;
    assert!(decrypt(&ct, &tag, &aad, &other_key, &NONCE).is_err());

    let mut other_nonce = NONCE;
    other_nonce[0] ^= 1;
    assert!(decrypt(&ct, &tag, &aad, &KEY, &other_nonce).is_err());
}

#[test]
fn test_open_into_copy_back_on_failure() {
    if !is_hardware_available() {
        return;
    }
    // Sizes covering both an exact pipeline multiple and a ragged tail.
    for msg_len in [48usize, 128, 200] {
        let msg = sample(msg_len);
        let aad = sample(7);
        let (ct, tag) = encrypt(&msg, &aad, &KEY, &NONCE).unwrap();

        let mut tampered = ct.clone();
        tampered[msg_len / 2] ^= 0x10;

        let mut ctx = SivContext::new();
        let mut out = vec![0u8; msg_len];
        let res = ctx.open_into(&mut out, &tampered, &tag, &aad, &KEY, &NONCE);
        assert_eq!(res, Err(Error::AuthenticationFailed));
        // A caller that ignores the result sees ciphertext, not plaintext.
        assert_eq!(out, tampered);

        let mut out = vec![0u8; msg_len];
        ctx.open_into(&mut out, &ct, &tag, &aad, &KEY, &NONCE).unwrap();
        assert_eq!(out, msg);
    }
}

#[test]
fn test_open_into_length_mismatch() {
    if !is_hardware_available() {
        return;
    }
    let (ct, tag) = encrypt(&sample(32), b"", &KEY, &NONCE).unwrap();
    let mut ctx = SivContext::new();
    let mut short = vec![0u8; 31];
    assert_eq!(
        ctx.open_into(&mut short, &ct, &tag, b"", &KEY, &NONCE),
        Err(Error::OutputLengthMismatch)
    );
}

#[test]
fn test_context_reuse() {
    if !is_hardware_available() {
        return;
    }
    let mut ctx = SivContext::new();
    let msgs = [sample(10), sample(300), sample(0), sample(128)];
    for (i, msg) in msgs.iter().enumerate() {
        let mut nonce = NONCE;
        nonce[15] = i as u8;
        let (ct, tag) = ctx.seal(msg, b"hdr", &KEY, &nonce).unwrap();
        let pt = ctx.open(&ct, &tag, b"hdr", &KEY, &nonce).unwrap();
        assert_eq!(&pt, msg);
    }
}

#[test]
fn test_context_clear() {
    if !is_hardware_available() {
        return;
    }
    let mut ctx = SivContext::new();
    let msg = sample(200);
    let (ct, tag) = ctx.seal(&msg, b"aad", &KEY, &NONCE).unwrap();

    // The schedule and table hold key-derived material after use.
    assert_ne!(ctx.ks, [[0u8; 16]; crate::intrinsics::ROUND_KEYS]);
    assert_ne!(ctx.htbl, [[0u8; 16]; 8]);

    ctx.clear();
    assert_eq!(ctx.ks, [[0u8; 16]; crate::intrinsics::ROUND_KEYS]);
    assert_eq!(ctx.htbl, [[0u8; 16]; 8]);
    assert_eq!(ctx.scratch, [0u8; 256]);

    // Idempotent and usable afterwards.
    ctx.clear();
    let pt = ctx.open(&ct, &tag, b"aad", &KEY, &NONCE).unwrap();
    assert_eq!(pt, msg);
}

#[test]
fn test_nonce_misuse_reveals_only_equality() {
    if !is_hardware_available() {
        return;
    }
    let (ct1, tag1) = encrypt(b"same message", b"", &KEY, &NONCE).unwrap();
    let (ct2, tag2) = encrypt(b"same message", b"", &KEY, &NONCE).unwrap();
    let (ct3, tag3) = encrypt(b"other message", b"", &KEY, &NONCE).unwrap();

    // Identical input under a reused nonce is detectable...
    assert_eq!((&ct1, tag1), (&ct2, tag2));
    // ...but different input diverges in both tag and ciphertext.
    assert_ne!(tag1, tag3);
    assert_ne!(ct1, ct3);
}

#[test]
fn test_seal_uses_htable_only_past_threshold() {
    if !is_hardware_available() {
        return;
    }
    // At exactly 128 bytes of AAD + message the Horner path is taken and
    // the context table stays untouched; one byte more flips the strategy.
    let mut ctx = SivContext::new();
    ctx.seal(&sample(100), &sample(28), &KEY, &NONCE).unwrap();
    assert_eq!(ctx.htbl, [[0u8; 16]; 8]);

    ctx.seal(&sample(101), &sample(28), &KEY, &NONCE).unwrap();
    assert_ne!(ctx.htbl, [[0u8; 16]; 8]);
}
