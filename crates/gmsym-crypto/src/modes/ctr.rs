//! CTR (Counter) mode of operation (NIST SP 800-38A §6.5).
//!
//! The counter is the whole 16-byte IV incremented as a 128-bit big-endian
//! integer. Keystream is produced `concurrency` blocks at a time into a
//! reusable buffer, through the cipher's batch path when one was supplied.

use super::{add_be128, assert_block_size, inc_be128, iv_block, BatchFn, BLOCK_SIZE};
use crate::provider::{
    BlockCipher, BlockCipherBatch, SeekableStreamMode, SetIv, StreamCipher, StreamMode,
};
use crate::util::{check_buffers, xor_bytes};
use zeroize::Zeroize;

/// CTR keystream generator.
pub struct Ctr<C> {
    cipher: C,
    iv: [u8; BLOCK_SIZE],
    /// Counter for the first block not yet in `out`.
    ctr: [u8; BLOCK_SIZE],
    /// Keystream buffer of `concurrency` blocks.
    out: Vec<u8>,
    out_used: usize,
    batch: Option<BatchFn<C>>,
    /// Counter blocks fed to the batch path.
    counters: Vec<u8>,
}

impl<C: BlockCipher> Ctr<C> {
    /// # Panics
    ///
    /// Panics if the block size is not 16 or `iv` is not one block.
    pub fn new(cipher: C, iv: &[u8]) -> Self {
        Self::with_buffer(cipher, iv, 1, None)
    }

    fn with_buffer(cipher: C, iv: &[u8], blocks: usize, batch: Option<BatchFn<C>>) -> Self {
        assert_block_size("ctr", &cipher);
        let iv = iv_block("ctr", iv);
        let width = blocks * BLOCK_SIZE;
        Self {
            cipher,
            iv,
            ctr: iv,
            out: vec![0u8; width],
            out_used: width,
            counters: if batch.is_some() { vec![0u8; width] } else { Vec::new() },
            batch,
        }
    }

    fn refill(&mut self) {
        match self.batch {
            Some(batch) => {
                for block in self.counters.chunks_exact_mut(BLOCK_SIZE) {
                    block.copy_from_slice(&self.ctr);
                    inc_be128(&mut self.ctr);
                }
                batch(&self.cipher, &mut self.out, &self.counters);
            }
            None => {
                for block in self.out.chunks_exact_mut(BLOCK_SIZE) {
                    self.cipher.encrypt(block, &self.ctr);
                    inc_be128(&mut self.ctr);
                }
            }
        }
        self.out_used = 0;
    }
}

impl<C: BlockCipherBatch> Ctr<C> {
    /// Like [`new`](Self::new), but fills the keystream buffer through the
    /// cipher's batch path.
    pub fn new_with_batch(cipher: C, iv: &[u8]) -> Self {
        let blocks = cipher.concurrency();
        Self::with_buffer(
            cipher,
            iv,
            blocks,
            Some(<C as BlockCipherBatch>::encrypt_blocks),
        )
    }
}

impl<C: BlockCipher> StreamCipher for Ctr<C> {
    fn xor_keystream(&mut self, dst: &mut [u8], src: &[u8]) {
        check_buffers("ctr", dst, src);
        let mut i = 0;
        while i < src.len() {
            if self.out_used == self.out.len() {
                self.refill();
            }
            let n = xor_bytes(&mut dst[i..], &src[i..], &self.out[self.out_used..]);
            self.out_used += n;
            i += n;
        }
    }
}

impl<C: BlockCipher> StreamMode for Ctr<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }
}

impl<C: BlockCipher> SeekableStreamMode for Ctr<C> {
    fn xor_keystream_at(&self, dst: &mut [u8], src: &[u8], offset: u64) {
        check_buffers("ctr", dst, src);
        let mut ctr = self.iv;
        add_be128(&mut ctr, offset / BLOCK_SIZE as u64);
        let mut skip = (offset % BLOCK_SIZE as u64) as usize;
        let mut ks = [0u8; BLOCK_SIZE];
        let mut i = 0;
        while i < src.len() {
            self.cipher.encrypt(&mut ks, &ctr);
            inc_be128(&mut ctr);
            let n = xor_bytes(&mut dst[i..], &src[i..], &ks[skip..]);
            skip = 0;
            i += n;
        }
        ks.zeroize();
    }
}

impl<C> SetIv for Ctr<C> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.iv = iv_block("ctr", iv);
        self.ctr = self.iv;
        self.out.zeroize();
        self.out_used = self.out.len();
    }
}

impl<C> Drop for Ctr<C> {
    fn drop(&mut self) {
        self.out.zeroize();
    }
}
