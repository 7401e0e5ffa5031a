//! GF(2^128) arithmetic and the 4-bit product-table GHASH engine.
//!
//! Elements use the GCM bit order: the x^0 coefficient is the most
//! significant bit of byte 0. `low` holds bytes 0..8 and `high` bytes 8..16,
//! both big-endian, so x^127 is the least significant bit of `high`.
//!
//! The multiply indexes a 16-entry table with nibbles of the operand, so its
//! memory access pattern depends on secret data. It is not constant-time.

use zeroize::Zeroize;

/// Reduction constants: `RED[i]` is the contribution of the four bits shifted
/// out of x^124..x^127 when multiplying by x^4, folded back via
/// `1 + x + x^2 + x^7`.
const RED: [u64; 16] = [
    0x0000000000000000,
    0x1c20000000000000,
    0x3840000000000000,
    0x2460000000000000,
    0x7080000000000000,
    0x6ca0000000000000,
    0x48c0000000000000,
    0x54e0000000000000,
    0xe100000000000000,
    0xfd20000000000000,
    0xd940000000000000,
    0xc560000000000000,
    0x9180000000000000,
    0x8da0000000000000,
    0xa9c0000000000000,
    0xb5e0000000000000,
];

/// An element of GF(2^128).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroize)]
pub struct Element {
    pub low: u64,
    pub high: u64,
}

impl Element {
    pub const ZERO: Self = Self { low: 0, high: 0 };

    /// Load a 16-byte big-endian block.
    ///
    /// # Panics
    ///
    /// Panics if `b` is shorter than 16 bytes.
    pub fn from_bytes(b: &[u8]) -> Self {
        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        low.copy_from_slice(&b[..8]);
        high.copy_from_slice(&b[8..16]);
        Self {
            low: u64::from_be_bytes(low),
            high: u64::from_be_bytes(high),
        }
    }

    pub fn to_bytes(self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.low.to_be_bytes());
        out[8..].copy_from_slice(&self.high.to_be_bytes());
        out
    }

    /// Multiply by x.
    pub fn double(self) -> Self {
        let carry = self.high & 1;
        let mut low = self.low >> 1;
        if carry != 0 {
            low ^= 0xe1 << 56;
        }
        Self {
            low,
            high: (self.high >> 1) | (self.low << 63),
        }
    }

    fn xor_block(&mut self, b: &[u8]) {
        let e = Self::from_bytes(b);
        self.low ^= e.low;
        self.high ^= e.high;
    }
}

impl core::ops::BitXor for Element {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self {
            low: self.low ^ rhs.low,
            high: self.high ^ rhs.high,
        }
    }
}

impl core::ops::BitXorAssign for Element {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.low ^= rhs.low;
        self.high ^= rhs.high;
    }
}

/// Reverse the low four bits of `i`.
const fn bitrev4(i: usize) -> usize {
    ((i & 1) << 3) | ((i & 2) << 1) | ((i & 4) >> 1) | ((i & 8) >> 3)
}

/// Multiples of the hash key H, `table[bitrev4(i)] = i·H`.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct ProductTable {
    table: [Element; 16],
}

impl ProductTable {
    /// Build the table for hash key `h` (16 bytes).
    ///
    /// # Panics
    ///
    /// Panics if `h` is shorter than 16 bytes.
    pub fn new(h: &[u8]) -> Self {
        let x = Element::from_bytes(h);
        let mut table = [Element::ZERO; 16];
        table[bitrev4(1)] = x;
        for i in (2..16).step_by(2) {
            table[bitrev4(i)] = table[bitrev4(i / 2)].double();
            table[bitrev4(i + 1)] = table[bitrev4(i)] ^ x;
        }
        Self { table }
    }

    /// `y ← y·H`.
    pub fn mul(&self, y: &mut Element) {
        let mut z = Element::ZERO;
        for mut word in [y.high, y.low] {
            for _ in 0..16 {
                let msw = (z.high & 0xf) as usize;
                z.high = (z.high >> 4) | (z.low << 60);
                z.low >>= 4;
                z.low ^= RED[msw];
                z ^= self.table[(word & 0xf) as usize];
                word >>= 4;
            }
        }
        *y = z;
    }

    /// Absorb `data` into `y`, zero-padding a trailing partial block.
    pub fn update(&self, y: &mut Element, data: &[u8]) {
        let mut blocks = data.chunks_exact(16);
        for block in &mut blocks {
            y.xor_block(block);
            self.mul(y);
        }
        let rest = blocks.remainder();
        if !rest.is_empty() {
            let mut partial = [0u8; 16];
            partial[..rest.len()].copy_from_slice(rest);
            y.xor_block(&partial);
            self.mul(y);
        }
    }

    /// Absorb the GCM lengths block `bitlen(aad) || bitlen(ct)`.
    pub fn update_lengths(&self, y: &mut Element, aad_len: u64, ct_len: u64) {
        y.low ^= aad_len.wrapping_mul(8);
        y.high ^= ct_len.wrapping_mul(8);
        self.mul(y);
    }

    /// GHASH(H, aad, ct) as used by GCM and GXM.
    pub fn ghash(&self, aad: &[u8], ct: &[u8]) -> [u8; 16] {
        let mut y = Element::ZERO;
        self.update(&mut y, aad);
        self.update(&mut y, ct);
        self.update_lengths(&mut y, aad.len() as u64, ct.len() as u64);
        let out = y.to_bytes();
        y.zeroize();
        out
    }
}
