#![no_main]
use gmsym_crypto::cipher::Aead;
use gmsym_crypto::modes::{Ccm, Gcm};
use gmsym_crypto::sm4::Sm4Key;
use libfuzzer_sys::fuzz_target;

// key(16) || nonce(12) || aad_len(1) || aad || ciphertext+tag
fuzz_target!(|data: &[u8]| {
    if data.len() < 29 {
        return;
    }
    let (key, rest) = data.split_at(16);
    let (nonce, rest) = rest.split_at(12);
    let aad_len = (rest[0] as usize).min(rest.len() - 1);
    let (aad, sealed) = rest[1..].split_at(aad_len);
    let Ok(cipher) = Sm4Key::new(key) else {
        return;
    };

    let gcm = Gcm::new(cipher.clone());
    if let Ok(pt) = gcm.decrypt(nonce, sealed, aad) {
        assert_eq!(gcm.encrypt(nonce, &pt, aad), sealed);
    }
    let ccm = Ccm::new(cipher);
    if let Ok(pt) = ccm.decrypt(nonce, sealed, aad) {
        assert_eq!(ccm.encrypt(nonce, &pt, aad), sealed);
    }
});
