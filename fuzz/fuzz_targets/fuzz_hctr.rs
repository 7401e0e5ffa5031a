#![no_main]
use gmsym_crypto::cipher::LengthPreservingMode;
use gmsym_crypto::modes::Hctr;
use gmsym_crypto::sm4::Sm4Key;
use libfuzzer_sys::fuzz_target;

// key(16) || tweak(16) || hash key(16) || message
fuzz_target!(|data: &[u8]| {
    if data.len() < 64 {
        return;
    }
    let (key, rest) = data.split_at(16);
    let (tweak, rest) = rest.split_at(16);
    let (hash_key, msg) = rest.split_at(16);
    let Ok(cipher) = Sm4Key::new(key) else {
        return;
    };
    let Ok(hctr) = Hctr::new(cipher, tweak, hash_key) else {
        return;
    };

    let mut ct = vec![0u8; msg.len()];
    hctr.encrypt(&mut ct, msg);
    let mut back = vec![0u8; msg.len()];
    hctr.decrypt(&mut back, &ct);
    assert_eq!(back, msg);
});
