//! CBC (Cipher Block Chaining) mode of operation, without padding.
//!
//! The decrypter can use a cipher's multi-block path: it decrypts
//! `concurrency` blocks at once and then chains each with the ciphertext
//! block before it.

use super::{assert_block_size, check_block_input, iv_block, BatchFn, BLOCK_SIZE};
use crate::provider::{BlockCipher, BlockCipherBatch, BlockMode, SetIv};
use crate::util::xor_in_place;

/// CBC encryption. The IV carries forward across calls.
pub struct CbcEncrypter<C> {
    cipher: C,
    iv: [u8; BLOCK_SIZE],
}

impl<C: BlockCipher> CbcEncrypter<C> {
    /// # Panics
    ///
    /// Panics if the block size is not 16 or `iv` is not one block.
    pub fn new(cipher: C, iv: &[u8]) -> Self {
        assert_block_size("cbc", &cipher);
        Self {
            cipher,
            iv: iv_block("cbc", iv),
        }
    }
}

impl<C: BlockCipher> BlockMode for CbcEncrypter<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        check_block_input("cbc", dst, src);
        let mut x = [0u8; BLOCK_SIZE];
        for (d, s) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            x.copy_from_slice(s);
            xor_in_place(&mut x, &self.iv);
            self.cipher.encrypt(d, &x);
            self.iv.copy_from_slice(&d[..BLOCK_SIZE]);
        }
    }
}

impl<C> SetIv for CbcEncrypter<C> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.iv = iv_block("cbc", iv);
    }
}

/// CBC decryption. The IV carries forward across calls.
pub struct CbcDecrypter<C> {
    cipher: C,
    iv: [u8; BLOCK_SIZE],
    batch: Option<BatchFn<C>>,
    /// Scratch for one batch of ciphertext blocks (empty without a batch path).
    scratch: Vec<u8>,
}

impl<C: BlockCipher> CbcDecrypter<C> {
    /// # Panics
    ///
    /// Panics if the block size is not 16 or `iv` is not one block.
    pub fn new(cipher: C, iv: &[u8]) -> Self {
        assert_block_size("cbc", &cipher);
        Self {
            cipher,
            iv: iv_block("cbc", iv),
            batch: None,
            scratch: Vec::new(),
        }
    }

    fn decrypt_one_by_one(&mut self, dst: &mut [u8], src: &[u8]) {
        let mut prev = self.iv;
        for (d, s) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            self.cipher.decrypt(d, s);
            xor_in_place(d, &prev);
            prev.copy_from_slice(s);
        }
        self.iv = prev;
    }
}

impl<C: BlockCipherBatch> CbcDecrypter<C> {
    /// Like [`new`](Self::new), but decrypts through the cipher's batch path.
    pub fn new_with_batch(cipher: C, iv: &[u8]) -> Self {
        let width = cipher.concurrency() * BLOCK_SIZE;
        let mut mode = Self::new(cipher, iv);
        mode.batch = Some(<C as BlockCipherBatch>::decrypt_blocks);
        mode.scratch = vec![0u8; width];
        mode
    }
}

impl<C: BlockCipher> BlockMode for CbcDecrypter<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        check_block_input("cbc", dst, src);
        let Some(batch) = self.batch else {
            self.decrypt_one_by_one(dst, src);
            return;
        };
        let width = self.scratch.len();
        let whole = src.len() - src.len() % width;
        for (d, s) in dst[..whole].chunks_exact_mut(width).zip(src[..whole].chunks_exact(width)) {
            self.scratch.copy_from_slice(s);
            batch(&self.cipher, d, &self.scratch);
            xor_in_place(&mut d[..BLOCK_SIZE], &self.iv);
            for (db, prev) in d[BLOCK_SIZE..]
                .chunks_exact_mut(BLOCK_SIZE)
                .zip(self.scratch.chunks_exact(BLOCK_SIZE))
            {
                xor_in_place(db, prev);
            }
            self.iv.copy_from_slice(&self.scratch[width - BLOCK_SIZE..]);
        }
        self.decrypt_one_by_one(&mut dst[whole..], &src[whole..]);
    }
}

impl<C> SetIv for CbcDecrypter<C> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.iv = iv_block("cbc", iv);
    }
}
