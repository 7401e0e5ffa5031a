//! OFB (Output Feedback) mode of operation (NIST SP 800-38A §6.4).
//!
//! Encryption and decryption are the same keystream XOR.

use super::{assert_block_size, iv_block, BLOCK_SIZE};
use crate::provider::{BlockCipher, SetIv, StreamCipher, StreamMode};
use crate::util::{check_buffers, xor_bytes};
use zeroize::Zeroize;

/// OFB keystream generator.
pub struct Ofb<C> {
    cipher: C,
    /// Last output block, initially the IV.
    block: [u8; BLOCK_SIZE],
    out_used: usize,
}

impl<C: BlockCipher> Ofb<C> {
    /// # Panics
    ///
    /// Panics if the block size is not 16 or `iv` is not one block.
    pub fn new(cipher: C, iv: &[u8]) -> Self {
        assert_block_size("ofb", &cipher);
        Self {
            cipher,
            block: iv_block("ofb", iv),
            out_used: BLOCK_SIZE,
        }
    }
}

impl<C: BlockCipher> StreamCipher for Ofb<C> {
    fn xor_keystream(&mut self, dst: &mut [u8], src: &[u8]) {
        check_buffers("ofb", dst, src);
        let mut i = 0;
        while i < src.len() {
            if self.out_used == BLOCK_SIZE {
                self.cipher.encrypt_in_place(&mut self.block);
                self.out_used = 0;
            }
            let n = xor_bytes(&mut dst[i..], &src[i..], &self.block[self.out_used..]);
            self.out_used += n;
            i += n;
        }
    }
}

impl<C: BlockCipher> StreamMode for Ofb<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }
}

impl<C> SetIv for Ofb<C> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.block = iv_block("ofb", iv);
        self.out_used = BLOCK_SIZE;
    }
}

impl<C> Drop for Ofb<C> {
    fn drop(&mut self) {
        self.block.zeroize();
    }
}
