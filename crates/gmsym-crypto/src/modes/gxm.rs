//! GXM (Galois XOR Mode), GM/T 0001.4-2024.
//!
//! A stream-cipher AEAD: the stream is already keyed and nonced (ZUC in the
//! standard). Its first `tag_size` keystream bytes become the tag mask, the
//! rest encrypt the message, and the tag is `GHASH(H, aad, ct) ⊕ mask`.
//!
//! A `Gxm` consumes its stream, so each instance seals or opens exactly one
//! message.

use super::BLOCK_SIZE;
use crate::gf128::ProductTable;
use crate::provider::StreamCipher;
use crate::util::{any_overlap, check_buffers, ct_eq, xor_in_place};
use gmsym_types::CryptoError;
use zeroize::Zeroize;

/// Default tag size.
pub const GXM_TAG_SIZE: usize = 16;
/// Smallest tag size accepted by [`Gxm::with_tag_size`].
pub const GXM_MIN_TAG_SIZE: usize = 8;

/// GXM over a keyed stream cipher.
pub struct Gxm<S> {
    stream: S,
    table: ProductTable,
    tag_size: usize,
    tag_mask: [u8; BLOCK_SIZE],
}

impl<S: StreamCipher> Gxm<S> {
    /// GXM with a 16-byte tag.
    pub fn new(stream: S, hash_key: &[u8]) -> Result<Self, CryptoError> {
        Self::with_tag_size(stream, hash_key, GXM_TAG_SIZE)
    }

    /// GXM with a tag of 8 to 16 bytes. Draws the tag mask from `stream`.
    pub fn with_tag_size(mut stream: S, hash_key: &[u8], tag_size: usize) -> Result<Self, CryptoError> {
        if hash_key.len() != BLOCK_SIZE {
            return Err(CryptoError::InvalidArg);
        }
        if !(GXM_MIN_TAG_SIZE..=GXM_TAG_SIZE).contains(&tag_size) {
            return Err(CryptoError::InvalidTagLength);
        }
        let mut tag_mask = [0u8; BLOCK_SIZE];
        stream.xor_keystream(&mut tag_mask[..tag_size], &[0u8; BLOCK_SIZE][..tag_size]);
        Ok(Self {
            stream,
            table: ProductTable::new(hash_key),
            tag_size,
            tag_mask,
        })
    }

    pub fn tag_size(&self) -> usize {
        self.tag_size
    }

    pub fn overhead(&self) -> usize {
        self.tag_size
    }

    fn auth(&self, ciphertext: &[u8], aad: &[u8]) -> [u8; BLOCK_SIZE] {
        let mut tag = self.table.ghash(aad, ciphertext);
        xor_in_place(&mut tag, &self.tag_mask);
        tag
    }

    /// Encrypt `plaintext` and write `ciphertext || tag` to the front of
    /// `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is shorter than `plaintext.len() + tag_size()` or
    /// overlaps `aad`.
    pub fn seal<'a>(&mut self, dst: &'a mut [u8], plaintext: &[u8], aad: &[u8]) -> &'a [u8] {
        let out_len = plaintext.len() + self.tag_size;
        if dst.len() < out_len {
            panic!("gxm: output smaller than input");
        }
        check_buffers("gxm", dst, plaintext);
        check_aad_overlap(&dst[..out_len], aad);
        let (ct, tag_out) = dst[..out_len].split_at_mut(plaintext.len());
        self.stream.xor_keystream(ct, plaintext);
        let tag = self.auth(ct, aad);
        tag_out.copy_from_slice(&tag[..self.tag_size]);
        &dst[..out_len]
    }

    /// Verify `ciphertext || tag` and decrypt into `dst`. The keystream is
    /// only consumed once the tag checks out; on failure the plaintext
    /// region of `dst` is zeroed.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is shorter than the plaintext or overlaps `aad`.
    pub fn open<'a>(
        &mut self,
        dst: &'a mut [u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<&'a [u8], CryptoError> {
        if ciphertext.len() < self.tag_size {
            return Err(CryptoError::AeadTagVerifyFail);
        }
        let (ct, tag) = ciphertext.split_at(ciphertext.len() - self.tag_size);
        check_buffers("gxm", dst, ct);
        check_aad_overlap(&dst[..ct.len()], aad);
        let out = &mut dst[..ct.len()];
        let expected = self.auth(ct, aad);
        if !ct_eq(&expected[..self.tag_size], tag) {
            out.fill(0);
            log::debug!("gxm: tag verification failed");
            return Err(CryptoError::AeadTagVerifyFail);
        }
        self.stream.xor_keystream(out, ct);
        Ok(out)
    }
}

fn check_aad_overlap(out: &[u8], aad: &[u8]) {
    if any_overlap(out, aad) {
        panic!("gxm: invalid buffer overlap of output and additional data");
    }
}

impl<S> Drop for Gxm<S> {
    fn drop(&mut self) {
        self.tag_mask.zeroize();
    }
}
