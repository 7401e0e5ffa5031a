//! ECB (Electronic Codebook) mode of operation.
//!
//! **Security warning**: ECB mode does not provide semantic security and
//! should generally not be used. It is provided for completeness and
//! specific low-level use cases only.

use super::{assert_block_size, check_block_input, BLOCK_SIZE};
use crate::provider::{BlockCipher, BlockMode};

/// ECB encryption over whole blocks.
pub struct EcbEncrypter<C> {
    cipher: C,
}

impl<C: BlockCipher> EcbEncrypter<C> {
    /// # Panics
    ///
    /// Panics if the cipher's block size is not 16.
    pub fn new(cipher: C) -> Self {
        assert_block_size("ecb", &cipher);
        Self { cipher }
    }
}

impl<C: BlockCipher> BlockMode for EcbEncrypter<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        check_block_input("ecb", dst, src);
        for (d, s) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            self.cipher.encrypt(d, s);
        }
    }
}

/// ECB decryption over whole blocks.
pub struct EcbDecrypter<C> {
    cipher: C,
}

impl<C: BlockCipher> EcbDecrypter<C> {
    /// # Panics
    ///
    /// Panics if the cipher's block size is not 16.
    pub fn new(cipher: C) -> Self {
        assert_block_size("ecb", &cipher);
        Self { cipher }
    }
}

impl<C: BlockCipher> BlockMode for EcbDecrypter<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        check_block_input("ecb", dst, src);
        for (d, s) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            self.cipher.decrypt(d, s);
        }
    }
}
