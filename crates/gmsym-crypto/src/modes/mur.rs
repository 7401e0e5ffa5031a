//! MUR (Misuse-Resistant AEAD), GM/T 0001.4-2024.
//!
//! The tag is keystream from `(K2, IV ⊕ GHASH(H, aad, P))` and the message
//! is encrypted under `(K1, IV ⊕ tag)`, so the data keystream depends on
//! the plaintext. Repeating an IV leaks only whether two messages are
//! equal.

use super::BLOCK_SIZE;
use crate::gf128::ProductTable;
use crate::provider::{StreamCipher, StreamCipherFactory};
use crate::util::{any_overlap, check_buffers, ct_eq, xor_in_place};
use gmsym_types::CryptoError;
use zeroize::Zeroize;

/// Longest IV accepted by [`Mur::seal`] and [`Mur::open`].
pub const MUR_MAX_IV_SIZE: usize = 32;
/// Default tag size.
pub const MUR_TAG_SIZE: usize = 16;
/// Smallest tag size accepted by [`Mur::with_tag_size`].
pub const MUR_MIN_TAG_SIZE: usize = 8;

/// MUR over a stream-cipher factory.
pub struct Mur<F> {
    factory: F,
    table: ProductTable,
    tag_size: usize,
}

impl<F: StreamCipherFactory> Mur<F> {
    /// MUR with a 16-byte tag.
    pub fn new(factory: F, hash_key: &[u8]) -> Result<Self, CryptoError> {
        Self::with_tag_size(factory, hash_key, MUR_TAG_SIZE)
    }

    /// MUR with a tag of 8 to 16 bytes.
    pub fn with_tag_size(factory: F, hash_key: &[u8], tag_size: usize) -> Result<Self, CryptoError> {
        if hash_key.len() != BLOCK_SIZE {
            return Err(CryptoError::InvalidArg);
        }
        if !(MUR_MIN_TAG_SIZE..=MUR_TAG_SIZE).contains(&tag_size) {
            return Err(CryptoError::InvalidTagLength);
        }
        Ok(Self {
            factory,
            table: ProductTable::new(hash_key),
            tag_size,
        })
    }

    pub fn tag_size(&self) -> usize {
        self.tag_size
    }

    pub fn overhead(&self) -> usize {
        self.tag_size
    }

    /// Tag for `plaintext` under `(k2, iv)`.
    fn auth(
        &self,
        iv: &[u8],
        k2: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<[u8; BLOCK_SIZE], CryptoError> {
        let mut tmp = [0u8; MUR_MAX_IV_SIZE];
        tmp[..iv.len()].copy_from_slice(iv);
        tmp[..BLOCK_SIZE].copy_from_slice(&self.table.ghash(aad, plaintext));
        xor_in_place(&mut tmp, iv);
        let tag_stream = self.factory.new_stream(k2, &tmp[..iv.len()]);
        tmp.zeroize();
        let mut tag = [0u8; BLOCK_SIZE];
        tag_stream?.xor_keystream(&mut tag[..self.tag_size], &[0u8; BLOCK_SIZE][..self.tag_size]);
        Ok(tag)
    }

    /// Keystream for the message body under `(k1, iv ⊕ tag)`.
    fn data_stream(&self, iv: &[u8], k1: &[u8], tag: &[u8]) -> Result<F::Stream, CryptoError> {
        let mut tmp = [0u8; MUR_MAX_IV_SIZE];
        tmp[..iv.len()].copy_from_slice(iv);
        xor_in_place(&mut tmp[..iv.len()], tag);
        let stream = self.factory.new_stream(k1, &tmp[..iv.len()]);
        tmp.zeroize();
        stream
    }

    fn check_iv(iv: &[u8]) {
        if iv.len() > MUR_MAX_IV_SIZE {
            panic!("mur: iv too large");
        }
    }

    /// Encrypt `plaintext` under `(k1, k2, iv)` and write
    /// `ciphertext || tag` to the front of `dst`.
    ///
    /// Errors only when the factory rejects a key or IV.
    ///
    /// # Panics
    ///
    /// Panics if `iv` is longer than 32 bytes or `dst` is shorter than
    /// `plaintext.len() + tag_size()`.
    pub fn seal<'a>(
        &self,
        dst: &'a mut [u8],
        iv: &[u8],
        k1: &[u8],
        k2: &[u8],
        plaintext: &[u8],
        aad: &[u8],
    ) -> Result<&'a [u8], CryptoError> {
        Self::check_iv(iv);
        let out_len = plaintext.len() + self.tag_size;
        if dst.len() < out_len {
            panic!("mur: output smaller than input");
        }
        check_buffers("mur", dst, plaintext);

        let mut tag = self.auth(iv, k2, plaintext, aad)?;
        let mut stream = self.data_stream(iv, k1, &tag[..self.tag_size])?;
        let (ct, tag_out) = dst[..out_len].split_at_mut(plaintext.len());
        stream.xor_keystream(ct, plaintext);
        tag_out.copy_from_slice(&tag[..self.tag_size]);
        tag.zeroize();
        Ok(&dst[..out_len])
    }

    /// Decrypt `ciphertext || tag` and verify it. On tag mismatch the
    /// plaintext region of `dst` is zeroed.
    ///
    /// # Panics
    ///
    /// Panics if `iv` is longer than 32 bytes, `dst` is shorter than the
    /// plaintext, or `dst` overlaps `aad`.
    pub fn open<'a>(
        &self,
        dst: &'a mut [u8],
        iv: &[u8],
        k1: &[u8],
        k2: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<&'a [u8], CryptoError> {
        Self::check_iv(iv);
        if ciphertext.len() < self.tag_size {
            return Err(CryptoError::AeadTagVerifyFail);
        }
        let (ct, tag) = ciphertext.split_at(ciphertext.len() - self.tag_size);
        check_buffers("mur", dst, ct);
        let out = &mut dst[..ct.len()];
        if any_overlap(out, aad) {
            panic!("mur: invalid buffer overlap of output and additional data");
        }

        self.data_stream(iv, k1, tag)?.xor_keystream(out, ct);
        let mut expected = match self.auth(iv, k2, out, aad) {
            Ok(t) => t,
            Err(e) => {
                out.fill(0);
                return Err(e);
            }
        };
        let ok = ct_eq(&expected[..self.tag_size], tag);
        expected.zeroize();
        if !ok {
            out.fill(0);
            log::debug!("mur: tag verification failed");
            return Err(CryptoError::AeadTagVerifyFail);
        }
        Ok(out)
    }
}

#[cfg(all(test, feature = "sm4"))]
mod tests {
    use super::*;
    use crate::modes::Ctr;
    use crate::sm4::Sm4Key;

    const HASH_KEY: [u8; 16] = [0x3c; 16];
    const K1: [u8; 16] = [1; 16];
    const K2: [u8; 16] = [2; 16];

    fn sm4_ctr(key: &[u8], iv: &[u8]) -> Result<Ctr<Sm4Key>, CryptoError> {
        if iv.len() != BLOCK_SIZE {
            return Err(CryptoError::InvalidIvLength);
        }
        Ok(Ctr::new(Sm4Key::new(key)?, iv))
    }

    fn keystream(key: &[u8], iv: &[u8], n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        sm4_ctr(key, iv).unwrap().xor_keystream(&mut out, &vec![0u8; n]);
        out
    }

    #[test]
    fn test_mur_matches_construction() {
        let mur = Mur::new(sm4_ctr, &HASH_KEY).unwrap();
        let iv = [0x77u8; 16];
        let pt: Vec<u8> = (0..37u8).collect();
        let aad = b"mur header";
        let sealed = mur.seal(&mut vec![0u8; 53], &iv, &K1, &K2, &pt, aad).unwrap().to_vec();

        let mut auth_iv = ProductTable::new(&HASH_KEY).ghash(aad, &pt);
        xor_in_place(&mut auth_iv, &iv);
        let tag = keystream(&K2, &auth_iv, 16);
        let mut data_iv = iv;
        xor_in_place(&mut data_iv, &tag);
        let mut ct = pt.clone();
        xor_in_place(&mut ct, &keystream(&K1, &data_iv, pt.len()));
        assert_eq!(sealed[..37], ct[..]);
        assert_eq!(sealed[37..], tag[..]);

        let mut back = vec![0u8; pt.len()];
        assert_eq!(mur.open(&mut back, &iv, &K1, &K2, &sealed, aad).unwrap(), &pt[..]);
    }

    #[test]
    fn test_mur_iv_reuse_depends_on_message() {
        let mur = Mur::with_tag_size(sm4_ctr, &HASH_KEY, 8).unwrap();
        let iv = [0u8; 16];
        let a = mur.seal(&mut [0u8; 24], &iv, &K1, &K2, b"message number 1", b"").unwrap().to_vec();
        let b = mur.seal(&mut [0u8; 24], &iv, &K1, &K2, b"message number 2", b"").unwrap().to_vec();
        let mut xa = a[..16].to_vec();
        xor_in_place(&mut xa, &b[..16]);
        let mut xp = b"message number 1".to_vec();
        xor_in_place(&mut xp, b"message number 2");
        assert_ne!(xa, xp);
        assert_ne!(a[16..], b[16..]);
    }

    #[test]
    fn test_mur_tamper_zeroes_output() {
        let mur = Mur::new(sm4_ctr, &HASH_KEY).unwrap();
        let iv = [9u8; 16];
        let mut sealed = mur.seal(&mut [0u8; 21], &iv, &K1, &K2, b"hello", b"ad").unwrap().to_vec();
        let mut out = [0xaau8; 5];
        assert!(mur.open(&mut out, &iv, &K1, &K2, &sealed, b"ae").is_err());
        assert_eq!(out, [0u8; 5]);
        sealed[20] ^= 1;
        assert_eq!(
            mur.open(&mut out, &iv, &K1, &K2, &sealed, b"ad"),
            Err(CryptoError::AeadTagVerifyFail)
        );
        assert!(mur.open(&mut out, &iv, &K1, &K2, &sealed[..15], b"ad").is_err());
    }

    #[test]
    fn test_mur_factory_error_propagates() {
        let mur = Mur::new(sm4_ctr, &HASH_KEY).unwrap();
        assert_eq!(
            mur.seal(&mut [0u8; 20], &[0u8; 12], &K1, &K2, b"abcd", b""),
            Err(CryptoError::InvalidIvLength)
        );
        assert!(matches!(
            mur.seal(&mut [0u8; 20], &[0u8; 16], &[0u8; 15], &K2, b"abcd", b""),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn test_mur_bad_parameters() {
        assert!(matches!(
            Mur::new(sm4_ctr, &[0u8; 17]),
            Err(CryptoError::InvalidArg)
        ));
        assert!(matches!(
            Mur::with_tag_size(sm4_ctr, &HASH_KEY, 4),
            Err(CryptoError::InvalidTagLength)
        ));
    }

    #[test]
    #[should_panic(expected = "mur: iv too large")]
    fn test_mur_long_iv_panics() {
        let mur = Mur::new(sm4_ctr, &HASH_KEY).unwrap();
        let _ = mur.seal(&mut [0u8; 20], &[0u8; 33], &K1, &K2, b"abcd", b"");
    }
}
