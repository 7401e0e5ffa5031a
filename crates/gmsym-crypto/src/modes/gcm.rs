//! GCM (Galois/Counter Mode) authenticated encryption.
//!
//! Implements GCM as defined in NIST SP 800-38D over any 16-byte block
//! cipher (AES-GCM, SM4-GCM per GB/T 36624 and RFC 8998).

use super::{assert_block_size, inc32, BLOCK_SIZE};
use crate::gf128::{Element, ProductTable};
use crate::provider::{Aead, BlockCipher};
use crate::util::{check_buffers, ct_eq, xor_bytes, xor_in_place};
use gmsym_types::CryptoError;
use zeroize::Zeroize;

/// Standard nonce size; other sizes go through GHASH to derive J0.
pub const GCM_STANDARD_NONCE_SIZE: usize = 12;
/// Default (and maximum) tag size.
pub const GCM_TAG_SIZE: usize = 16;
/// Smallest tag size accepted by [`Gcm::with_tag_size`].
pub const GCM_MIN_TAG_SIZE: usize = 12;

/// Longest plaintext: the 32-bit counter leaves 2^32 - 2 keystream blocks.
const GCM_MAX_PLAINTEXT: u64 = ((1u64 << 32) - 2) * BLOCK_SIZE as u64;

/// GCM over a keyed block cipher. Nonce and tag sizes are fixed at
/// construction.
pub struct Gcm<C> {
    cipher: C,
    table: ProductTable,
    nonce_size: usize,
    tag_size: usize,
}

impl<C: BlockCipher> Gcm<C> {
    /// GCM with a 12-byte nonce and a 16-byte tag.
    ///
    /// # Panics
    ///
    /// Panics if the cipher's block size is not 16.
    pub fn new(cipher: C) -> Self {
        Self::build(cipher, GCM_STANDARD_NONCE_SIZE, GCM_TAG_SIZE)
    }

    /// GCM with a non-standard nonce size. Only use this for compatibility
    /// with existing protocols; 12 bytes is the efficient choice.
    pub fn with_nonce_size(cipher: C, nonce_size: usize) -> Result<Self, CryptoError> {
        if nonce_size == 0 {
            return Err(CryptoError::InvalidNonceLength);
        }
        Ok(Self::build(cipher, nonce_size, GCM_TAG_SIZE))
    }

    /// GCM with a truncated tag of 12 to 16 bytes.
    pub fn with_tag_size(cipher: C, tag_size: usize) -> Result<Self, CryptoError> {
        if !(GCM_MIN_TAG_SIZE..=GCM_TAG_SIZE).contains(&tag_size) {
            return Err(CryptoError::InvalidTagLength);
        }
        Ok(Self::build(cipher, GCM_STANDARD_NONCE_SIZE, tag_size))
    }

    fn build(cipher: C, nonce_size: usize, tag_size: usize) -> Self {
        assert_block_size("gcm", &cipher);
        let mut h = [0u8; BLOCK_SIZE];
        cipher.encrypt_in_place(&mut h);
        let table = ProductTable::new(&h);
        h.zeroize();
        Self {
            cipher,
            table,
            nonce_size,
            tag_size,
        }
    }

    /// Derive the pre-counter block J0.
    fn derive_counter(&self, nonce: &[u8]) -> [u8; BLOCK_SIZE] {
        let mut j0 = [0u8; BLOCK_SIZE];
        if nonce.len() == GCM_STANDARD_NONCE_SIZE {
            j0[..GCM_STANDARD_NONCE_SIZE].copy_from_slice(nonce);
            j0[BLOCK_SIZE - 1] = 1;
        } else {
            log::trace!("gcm: deriving counter from {}-byte nonce", nonce.len());
            let mut y = Element::ZERO;
            self.table.update(&mut y, nonce);
            self.table.update_lengths(&mut y, 0, nonce.len() as u64);
            j0 = y.to_bytes();
        }
        j0
    }

    /// XOR `src` with the keystream starting at `counter`, stepping only the
    /// low 32 bits.
    fn counter_crypt(&self, dst: &mut [u8], src: &[u8], counter: &mut [u8; BLOCK_SIZE]) {
        let mut ks = [0u8; BLOCK_SIZE];
        for (d, s) in dst.chunks_mut(BLOCK_SIZE).zip(src.chunks(BLOCK_SIZE)) {
            self.cipher.encrypt(&mut ks, counter);
            inc32(counter);
            xor_bytes(d, s, &ks);
        }
        ks.zeroize();
    }

    fn auth(&self, ciphertext: &[u8], aad: &[u8], tag_mask: &[u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut tag = self.table.ghash(aad, ciphertext);
        xor_in_place(&mut tag, tag_mask);
        tag
    }

    fn check_nonce(&self, nonce: &[u8]) {
        if nonce.len() != self.nonce_size {
            panic!("gcm: incorrect nonce length given to GCM");
        }
    }
}

impl<C: BlockCipher> Aead for Gcm<C> {
    fn nonce_size(&self) -> usize {
        self.nonce_size
    }

    fn tag_size(&self) -> usize {
        self.tag_size
    }

    /// # Panics
    ///
    /// Panics if the nonce length is wrong, the plaintext is longer than
    /// (2^32 - 2) blocks, or `dst` cannot hold ciphertext and tag.
    fn seal<'a>(&self, dst: &'a mut [u8], nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> &'a [u8] {
        self.check_nonce(nonce);
        if plaintext.len() as u64 > GCM_MAX_PLAINTEXT {
            panic!("gcm: message too large for GCM");
        }
        let out_len = plaintext.len() + self.tag_size;
        if dst.len() < out_len {
            panic!("gcm: output smaller than input");
        }
        check_buffers("gcm", dst, plaintext);

        let mut counter = self.derive_counter(nonce);
        let mut tag_mask = [0u8; BLOCK_SIZE];
        self.cipher.encrypt(&mut tag_mask, &counter);
        inc32(&mut counter);

        let (ct, tag_out) = dst[..out_len].split_at_mut(plaintext.len());
        self.counter_crypt(ct, plaintext, &mut counter);
        let tag = self.auth(ct, aad, &tag_mask);
        tag_out.copy_from_slice(&tag[..self.tag_size]);
        tag_mask.zeroize();
        &dst[..out_len]
    }

    /// # Panics
    ///
    /// Panics if the nonce length is wrong or `dst` is shorter than the
    /// plaintext.
    fn open<'a>(
        &self,
        dst: &'a mut [u8],
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<&'a [u8], CryptoError> {
        self.check_nonce(nonce);
        if ciphertext.len() < self.tag_size
            || (ciphertext.len() - self.tag_size) as u64 > GCM_MAX_PLAINTEXT
        {
            return Err(CryptoError::AeadTagVerifyFail);
        }
        let (ct, tag) = ciphertext.split_at(ciphertext.len() - self.tag_size);
        check_buffers("gcm", dst, ct);

        let mut counter = self.derive_counter(nonce);
        let mut tag_mask = [0u8; BLOCK_SIZE];
        self.cipher.encrypt(&mut tag_mask, &counter);
        inc32(&mut counter);

        let expected = self.auth(ct, aad, &tag_mask);
        tag_mask.zeroize();
        let out = &mut dst[..ct.len()];
        if !ct_eq(&expected[..self.tag_size], tag) {
            out.fill(0);
            log::debug!("gcm: tag verification failed");
            return Err(CryptoError::AeadTagVerifyFail);
        }
        self.counter_crypt(out, ct, &mut counter);
        Ok(out)
    }
}
