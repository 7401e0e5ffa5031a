//! BC (Block Chaining) mode, GB/T 17964-2021 §12.
//!
//! The chaining value is the IV XORed with every ciphertext block so far:
//! `C_i = E(P_i ⊕ F)`, then `F ← F ⊕ C_i`.

use super::{assert_block_size, check_block_input, iv_block, BLOCK_SIZE};
use crate::provider::{BlockCipher, BlockMode, SetIv};
use crate::util::xor_in_place;

/// BC encryption. The chaining value carries forward across calls.
pub struct BcEncrypter<C> {
    cipher: C,
    iv: [u8; BLOCK_SIZE],
}

impl<C: BlockCipher> BcEncrypter<C> {
    /// # Panics
    ///
    /// Panics if the block size is not 16 or `iv` is not one block.
    pub fn new(cipher: C, iv: &[u8]) -> Self {
        assert_block_size("bc", &cipher);
        Self {
            cipher,
            iv: iv_block("bc", iv),
        }
    }
}

impl<C: BlockCipher> BlockMode for BcEncrypter<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        check_block_input("bc", dst, src);
        let mut x = [0u8; BLOCK_SIZE];
        for (d, s) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            x.copy_from_slice(s);
            xor_in_place(&mut x, &self.iv);
            self.cipher.encrypt(d, &x);
            xor_in_place(&mut self.iv, d);
        }
    }
}

impl<C> SetIv for BcEncrypter<C> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.iv = iv_block("bc", iv);
    }
}

/// BC decryption. The chaining value carries forward across calls.
pub struct BcDecrypter<C> {
    cipher: C,
    iv: [u8; BLOCK_SIZE],
}

impl<C: BlockCipher> BcDecrypter<C> {
    /// # Panics
    ///
    /// Panics if the block size is not 16 or `iv` is not one block.
    pub fn new(cipher: C, iv: &[u8]) -> Self {
        assert_block_size("bc", &cipher);
        Self {
            cipher,
            iv: iv_block("bc", iv),
        }
    }
}

impl<C: BlockCipher> BlockMode for BcDecrypter<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        check_block_input("bc", dst, src);
        for (d, s) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            self.cipher.decrypt(d, s);
            xor_in_place(d, &self.iv);
            xor_in_place(&mut self.iv, s);
        }
    }
}

impl<C> SetIv for BcDecrypter<C> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.iv = iv_block("bc", iv);
    }
}
