//! HCTR mode: a length-preserving tweakable wide-block cipher.
//!
//! HCTR combines one block-cipher call, CTR mode and a GF(2^128) universal
//! hash (UHash) keyed by a separate hash key. The input must be at least 16
//! bytes and the output length always equals the input length.
//!
//! Encryption, with `P = P1 || P2`, `|P1| = 16`:
//!
//! ```text
//! Z1 = P1 ⊕ UHash(P2)     Z2 = E(Z1)
//! C2 = P2 ⊕ CTR(E, Z1 ⊕ Z2)
//! C1 = Z2 ⊕ UHash(C2)
//! ```

use super::{assert_block_size, BatchFn, BLOCK_SIZE};
use crate::gf128::{Element, ProductTable};
use crate::provider::{BlockCipher, BlockCipherBatch, LengthPreservingMode};
use crate::util::{check_buffers, xor_bytes, xor_in_place};
use gmsym_types::CryptoError;
use zeroize::Zeroize;

/// HCTR over a 16-byte block cipher.
pub struct Hctr<C> {
    cipher: C,
    tweak: [u8; BLOCK_SIZE],
    table: ProductTable,
    batch: Option<(usize, BatchFn<C>)>,
}

impl<C: BlockCipher> Hctr<C> {
    /// Build from a keyed cipher, a 16-byte tweak and a 16-byte hash key.
    ///
    /// # Panics
    ///
    /// Panics if the cipher's block size is not 16.
    pub fn new(cipher: C, tweak: &[u8], hash_key: &[u8]) -> Result<Self, CryptoError> {
        assert_block_size("hctr", &cipher);
        if tweak.len() != BLOCK_SIZE || hash_key.len() != BLOCK_SIZE {
            return Err(CryptoError::InvalidArg);
        }
        let mut t = [0u8; BLOCK_SIZE];
        t.copy_from_slice(tweak);
        Ok(Self {
            cipher,
            tweak: t,
            table: ProductTable::new(hash_key),
            batch: None,
        })
    }

    fn absorb(&self, y: &mut Element, block: &[u8]) {
        let b = Element::from_bytes(block);
        *y ^= b;
        self.table.mul(y);
    }

    /// Polynomial hash of `m` with the tweak appended, plus a length block.
    fn uhash(&self, m: &[u8]) -> [u8; BLOCK_SIZE] {
        let mut y = Element::ZERO;
        let mut blocks = m.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            self.absorb(&mut y, block);
        }
        let rest = blocks.remainder();
        let r = rest.len();
        if r > 0 {
            let mut partial = [0u8; BLOCK_SIZE];
            partial[..r].copy_from_slice(rest);
            partial[r..].copy_from_slice(&self.tweak[..BLOCK_SIZE - r]);
            self.absorb(&mut y, &partial);
            // The second block reuses the first: the tweak's tail goes to the
            // front and everything from offset r on is cleared.
            partial[..BLOCK_SIZE - r].copy_from_slice(&self.tweak[r..]);
            partial[r..].fill(0);
            self.absorb(&mut y, &partial);
            partial.zeroize();
        } else {
            self.absorb(&mut y, &self.tweak);
        }
        y.high ^= ((m.len() + BLOCK_SIZE) as u64).wrapping_mul(8);
        self.table.mul(&mut y);
        let out = y.to_bytes();
        y.zeroize();
        out
    }

    /// XOR `src` with `E(base ⊕ i)` for i = 1, 2, ..., the counter going
    /// big-endian into the last 8 bytes.
    fn ctr(&self, dst: &mut [u8], src: &[u8], base: &[u8; BLOCK_SIZE]) {
        let counter_block = |i: u64| {
            let mut block = *base;
            xor_in_place(&mut block[8..], &i.to_be_bytes());
            block
        };
        let mut i = 1u64;
        let mut off = 0;
        if let Some((blocks, batch)) = self.batch {
            let width = blocks * BLOCK_SIZE;
            let mut ctrs = vec![0u8; width];
            let mut ks = vec![0u8; width];
            while src.len() - off >= width {
                for c in ctrs.chunks_exact_mut(BLOCK_SIZE) {
                    c.copy_from_slice(&counter_block(i));
                    i += 1;
                }
                batch(&self.cipher, &mut ks, &ctrs);
                xor_bytes(&mut dst[off..off + width], &src[off..off + width], &ks);
                off += width;
            }
            ks.zeroize();
        }
        let mut ks = [0u8; BLOCK_SIZE];
        while off < src.len() {
            self.cipher.encrypt(&mut ks, &counter_block(i));
            off += xor_bytes(&mut dst[off..], &src[off..], &ks);
            i += 1;
        }
        ks.zeroize();
    }

    fn check(mode_dir: &str, dst: &[u8], src: &[u8]) {
        if src.len() < BLOCK_SIZE {
            panic!("hctr: {mode_dir} length is smaller than the block size");
        }
        check_buffers("hctr", dst, src);
    }
}

impl<C: BlockCipherBatch> Hctr<C> {
    /// Like [`new`](Self::new), but runs the CTR layer through the cipher's
    /// batch path.
    pub fn new_with_batch(cipher: C, tweak: &[u8], hash_key: &[u8]) -> Result<Self, CryptoError> {
        let blocks = cipher.concurrency();
        let mut mode = Self::new(cipher, tweak, hash_key)?;
        mode.batch = Some((blocks, <C as BlockCipherBatch>::encrypt_blocks));
        Ok(mode)
    }
}

impl<C: BlockCipher> LengthPreservingMode for Hctr<C> {
    /// # Panics
    ///
    /// Panics if `src` is shorter than 16 bytes, `dst` is shorter than
    /// `src`, or the buffers overlap inexactly.
    fn encrypt(&self, dst: &mut [u8], src: &[u8]) {
        Self::check("plaintext", dst, src);
        let (p1, p2) = src.split_at(BLOCK_SIZE);
        let mut z1 = self.uhash(p2);
        xor_in_place(&mut z1, p1);
        let mut z2 = [0u8; BLOCK_SIZE];
        self.cipher.encrypt(&mut z2, &z1);
        xor_in_place(&mut z1, &z2);

        let (c1, c2) = dst[..src.len()].split_at_mut(BLOCK_SIZE);
        self.ctr(c2, p2, &z1);
        let h = self.uhash(c2);
        xor_bytes(c1, &z2, &h);
        z1.zeroize();
        z2.zeroize();
    }

    /// # Panics
    ///
    /// Panics if `src` is shorter than 16 bytes, `dst` is shorter than
    /// `src`, or the buffers overlap inexactly.
    fn decrypt(&self, dst: &mut [u8], src: &[u8]) {
        Self::check("ciphertext", dst, src);
        let (c1, c2) = src.split_at(BLOCK_SIZE);
        let mut z2 = self.uhash(c2);
        xor_in_place(&mut z2, c1);
        let mut z1 = [0u8; BLOCK_SIZE];
        self.cipher.decrypt(&mut z1, &z2);
        xor_in_place(&mut z2, &z1);

        let (p1, p2) = dst[..src.len()].split_at_mut(BLOCK_SIZE);
        self.ctr(p2, c2, &z2);
        let h = self.uhash(p2);
        xor_bytes(p1, &z1, &h);
        z1.zeroize();
        z2.zeroize();
    }
}

impl<C> Drop for Hctr<C> {
    fn drop(&mut self) {
        self.tweak.zeroize();
    }
}
