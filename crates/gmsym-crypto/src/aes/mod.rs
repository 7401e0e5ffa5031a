//! AES (Advanced Encryption Standard) block cipher implementation.
//!
//! Provides AES-128, AES-192, and AES-256 behind the [`BlockCipher`] trait so
//! the generic modes can be checked against NIST and RFC vectors.

mod soft;

use crate::provider::BlockCipher;
use gmsym_types::CryptoError;
use zeroize::Zeroize;

/// AES block size in bytes (128 bits).
pub const AES_BLOCK_SIZE: usize = 16;

/// An AES key with precomputed round keys.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct AesKey {
    round_keys: Vec<u32>,
    rounds: usize,
}

impl AesKey {
    /// Create a new AES key from raw bytes.
    ///
    /// Accepts 16, 24, or 32-byte keys for AES-128, AES-192, and AES-256.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let (round_keys, rounds) = soft::expand_key(key)?;
        Ok(Self { round_keys, rounds })
    }

    /// Return the key length in bytes.
    pub fn key_len(&self) -> usize {
        (self.rounds - 6) * 4
    }
}

fn load(src: &[u8]) -> [u8; AES_BLOCK_SIZE] {
    assert!(src.len() >= AES_BLOCK_SIZE, "aes: input not full block");
    let mut s = [0u8; AES_BLOCK_SIZE];
    s.copy_from_slice(&src[..AES_BLOCK_SIZE]);
    s
}

impl BlockCipher for AesKey {
    fn block_size(&self) -> usize {
        AES_BLOCK_SIZE
    }

    fn encrypt(&self, dst: &mut [u8], src: &[u8]) {
        let mut s = load(src);
        assert!(dst.len() >= AES_BLOCK_SIZE, "aes: output not full block");
        soft::encrypt_block(&self.round_keys, self.rounds, &mut s);
        dst[..AES_BLOCK_SIZE].copy_from_slice(&s);
    }

    fn decrypt(&self, dst: &mut [u8], src: &[u8]) {
        let mut s = load(src);
        assert!(dst.len() >= AES_BLOCK_SIZE, "aes: output not full block");
        soft::decrypt_block(&self.round_keys, self.rounds, &mut s);
        dst[..AES_BLOCK_SIZE].copy_from_slice(&s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    /// FIPS 197 Appendix B: AES-128 test vector
    #[test]
    fn aes128_fips197_appendix_b() {
        let aes = AesKey::new(&hex("2b7e151628aed2a6abf7158809cf4f3c")).unwrap();
        let mut block = [0u8; 16];
        aes.encrypt(&mut block, &hex("3243f6a8885a308d313198a2e0370734"));
        assert_eq!(block.to_vec(), hex("3925841d02dc09fbdc118597196a0b32"));
    }

    /// FIPS 197 Appendix C.2: AES-192
    #[test]
    fn aes192_fips197_appendix_c2() {
        let aes = AesKey::new(&hex("000102030405060708090a0b0c0d0e0f1011121314151617")).unwrap();
        assert_eq!(aes.key_len(), 24);
        let pt = hex("00112233445566778899aabbccddeeff");
        let mut block = [0u8; 16];
        aes.encrypt(&mut block, &pt);
        assert_eq!(block.to_vec(), hex("dda97ca4864cdfe06eaf70a0ec0d7191"));
        aes.decrypt_in_place(&mut block);
        assert_eq!(block.to_vec(), pt);
    }

    /// FIPS 197 Appendix C.3: AES-256
    #[test]
    fn aes256_fips197_appendix_c3() {
        let aes = AesKey::new(&hex(
            "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
        ))
        .unwrap();
        assert_eq!(aes.key_len(), 32);
        let pt = hex("00112233445566778899aabbccddeeff");
        let mut block = [0u8; 16];
        aes.encrypt(&mut block, &pt);
        assert_eq!(block.to_vec(), hex("8ea2b7ca516745bfeafc49904b496089"));
        let mut back = [0u8; 16];
        aes.decrypt(&mut back, &block);
        assert_eq!(back.to_vec(), pt);
    }

    #[test]
    fn invalid_key_length_rejected() {
        assert!(AesKey::new(&[0u8; 15]).is_err());
        assert!(AesKey::new(&[0u8; 17]).is_err());
        assert!(AesKey::new(&[0u8; 0]).is_err());
        assert!(AesKey::new(&[0u8; 33]).is_err());
    }

    #[test]
    #[should_panic(expected = "aes: input not full block")]
    fn short_block_panics() {
        let aes = AesKey::new(&[0u8; 16]).unwrap();
        let mut out = [0u8; 16];
        aes.encrypt(&mut out, &[0u8; 8]);
    }
}
