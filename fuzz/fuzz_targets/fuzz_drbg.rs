#![no_main]
use gmsym_crypto::drbg::{CtrDrbg, DrbgConfig, HashDrbg, HmacDrbg};
use gmsym_crypto::provider::Drbg;
use gmsym_crypto::sm4::Sm4Key;
use gmsym_types::{HashAlgId, SecurityLevel};
use libfuzzer_sys::fuzz_target;

// Arbitrary seed material either instantiates or fails cleanly, and a live
// DRBG refuses requests above its own cap.
fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let out_len = usize::from(u16::from_le_bytes([data[2], data[3]]));
    let body = &data[4..];
    let ent_len = usize::from(data[0]).min(body.len());
    let (entropy, rest) = body.split_at(ent_len);
    let nonce_len = usize::from(data[1]).min(rest.len());
    let (nonce, pers) = rest.split_at(nonce_len);

    let config = DrbgConfig::gm(SecurityLevel::One);
    let mut drbgs: Vec<Box<dyn Drbg>> = Vec::new();
    if let Ok(d) = HashDrbg::new(HashAlgId::Sm3, config, entropy, nonce, pers) {
        drbgs.push(Box::new(d));
    }
    if let Ok(d) = HmacDrbg::new(HashAlgId::Sm3, config, entropy, nonce, pers) {
        drbgs.push(Box::new(d));
    }
    if let Ok(d) = CtrDrbg::new(Sm4Key::new, 16, config, entropy, nonce, pers) {
        drbgs.push(Box::new(d));
    }

    for drbg in &mut drbgs {
        let mut out = vec![0u8; out_len];
        let result = drbg.generate(&mut out, Some(pers));
        if out_len > drbg.max_bytes_per_request() {
            assert!(result.is_err());
        }
    }
});
