//! XTS (XEX-based Tweaked-codebook mode with ciphertext Stealing).
//!
//! XTS mode is designed for disk encryption and operates on data units
//! (typically 512-byte sectors). It uses two keys of equal size: K1 encrypts
//! data, K2 encrypts the initial tweak.
//!
//! Two tweak-doubling conventions are supported, selected by [`XtsDialect`]:
//! IEEE 1619 (little-endian shift, feedback 0x87) and GB/T 17964-2021
//! (bit-reflected shift, feedback 0xE1).
//!
//! The tweak carries forward across calls, so a data unit may be fed in
//! several whole-block pieces. A call whose length is not a multiple of 16
//! applies ciphertext stealing and ends the data unit.

use super::{assert_block_size, iv_block, BLOCK_SIZE};
use crate::provider::{BlockCipher, BlockMode, CipherFactory, SetIv};
use crate::util::{check_buffers, xor_in_place};
use gmsym_types::{CryptoError, XtsDialect};
use zeroize::Zeroize;

/// Largest data unit accepted by one call, exclusive.
pub const XTS_MAX_LEN: usize = 1 << 24;

/// Multiply the tweak by α in the dialect's field representation.
pub(crate) fn mul2(tweak: &mut [u8; BLOCK_SIZE], dialect: XtsDialect) {
    let mut carry_in = 0u8;
    match dialect {
        XtsDialect::Ieee => {
            for b in tweak.iter_mut() {
                let carry_out = *b >> 7;
                *b = (*b << 1) | carry_in;
                carry_in = carry_out;
            }
            if carry_in != 0 {
                tweak[0] ^= 0x87;
            }
        }
        XtsDialect::Gb => {
            for b in tweak.iter_mut() {
                let carry_out = (*b << 7) & 0x80;
                *b = (*b >> 1) | carry_in;
                carry_in = carry_out;
            }
            if carry_in != 0 {
                tweak[0] ^= 0xe1;
            }
        }
    }
}

fn sector_tweak(sector: u64) -> [u8; BLOCK_SIZE] {
    let mut tweak = [0u8; BLOCK_SIZE];
    tweak[..8].copy_from_slice(&sector.to_le_bytes());
    tweak
}

/// State shared by both directions.
struct XtsCore<C> {
    k1: C,
    k2: C,
    /// Encrypted tweak for the next block.
    tweak: [u8; BLOCK_SIZE],
    dialect: XtsDialect,
}

impl<C: BlockCipher> XtsCore<C> {
    fn new(k1: C, k2: C, tweak: &[u8], dialect: XtsDialect) -> Self {
        assert_block_size("xts", &k1);
        assert_block_size("xts", &k2);
        let mut core = Self {
            k1,
            k2,
            tweak: [0u8; BLOCK_SIZE],
            dialect,
        };
        core.set_tweak(tweak);
        core
    }

    fn from_key<F>(factory: &F, key: &[u8], tweak: &[u8], dialect: XtsDialect) -> Result<Self, CryptoError>
    where
        F: CipherFactory<Cipher = C>,
    {
        if key.is_empty() || key.len() % 2 != 0 {
            return Err(CryptoError::InvalidArg);
        }
        let (key1, key2) = key.split_at(key.len() / 2);
        let k1 = factory.new_cipher(key1)?;
        let k2 = factory.new_cipher(key2)?;
        if tweak.len() != BLOCK_SIZE {
            return Err(CryptoError::InvalidIvLength);
        }
        Ok(Self::new(k1, k2, tweak, dialect))
    }

    fn set_tweak(&mut self, tweak: &[u8]) {
        let tweak = iv_block("xts", tweak);
        self.k2.encrypt(&mut self.tweak, &tweak);
    }

    fn check(dst: &[u8], src: &[u8]) {
        if src.len() < BLOCK_SIZE {
            panic!("xts: input too short");
        }
        if src.len() >= XTS_MAX_LEN {
            panic!("xts: input too long");
        }
        check_buffers("xts", dst, src);
    }

    /// `dst = E(src ⊕ T) ⊕ T` (or with D), on one block.
    fn xex(&self, dst: &mut [u8], src: &[u8], tweak: &[u8; BLOCK_SIZE], encrypt: bool) {
        let mut x = [0u8; BLOCK_SIZE];
        x.copy_from_slice(&src[..BLOCK_SIZE]);
        xor_in_place(&mut x, tweak);
        if encrypt {
            self.k1.encrypt(dst, &x);
        } else {
            self.k1.decrypt(dst, &x);
        }
        xor_in_place(&mut dst[..BLOCK_SIZE], tweak);
    }

    fn encrypt(&mut self, dst: &mut [u8], src: &[u8]) {
        Self::check(dst, src);
        let rem = src.len() % BLOCK_SIZE;
        let full = src.len() - rem;
        for (d, s) in dst[..full]
            .chunks_exact_mut(BLOCK_SIZE)
            .zip(src[..full].chunks_exact(BLOCK_SIZE))
        {
            let t = self.tweak;
            self.xex(d, s, &t, true);
            mul2(&mut self.tweak, self.dialect);
        }
        if rem == 0 {
            return;
        }
        // Steal: the tail borrows the end of the previous ciphertext block,
        // which moves into the tail position.
        let last = full - BLOCK_SIZE;
        let mut x = [0u8; BLOCK_SIZE];
        x[..rem].copy_from_slice(&src[full..]);
        x[rem..].copy_from_slice(&dst[last + rem..full]);
        let (head, tail) = dst.split_at_mut(full);
        tail[..rem].copy_from_slice(&head[last..last + rem]);
        let t = self.tweak;
        self.xex(&mut head[last..], &x, &t, true);
    }

    fn decrypt(&mut self, dst: &mut [u8], src: &[u8]) {
        Self::check(dst, src);
        let rem = src.len() % BLOCK_SIZE;
        let full = if rem == 0 {
            src.len()
        } else {
            src.len() - rem - BLOCK_SIZE
        };
        for (d, s) in dst[..full]
            .chunks_exact_mut(BLOCK_SIZE)
            .zip(src[..full].chunks_exact(BLOCK_SIZE))
        {
            let t = self.tweak;
            self.xex(d, s, &t, false);
            mul2(&mut self.tweak, self.dialect);
        }
        if rem == 0 {
            return;
        }
        // The last full ciphertext block was produced under the next tweak.
        let mut next = self.tweak;
        mul2(&mut next, self.dialect);
        let mut pp = [0u8; BLOCK_SIZE];
        self.xex(&mut pp, &src[full..full + BLOCK_SIZE], &next, false);

        let mut x = [0u8; BLOCK_SIZE];
        x[..rem].copy_from_slice(&src[full + BLOCK_SIZE..]);
        x[rem..].copy_from_slice(&pp[rem..]);
        dst[full + BLOCK_SIZE..full + BLOCK_SIZE + rem].copy_from_slice(&pp[..rem]);
        let t = self.tweak;
        self.xex(&mut dst[full..full + BLOCK_SIZE], &x, &t, false);
        pp.zeroize();
    }
}

impl<C> Drop for XtsCore<C> {
    fn drop(&mut self) {
        self.tweak.zeroize();
    }
}

macro_rules! xts_direction {
    ($name:ident, $method:ident, $doc:literal) => {
        #[doc = $doc]
        pub struct $name<C> {
            core: XtsCore<C>,
        }

        impl<C: BlockCipher> $name<C> {
            /// Build from a data cipher `k1`, a tweak cipher `k2` and a
            /// 16-byte tweak.
            ///
            /// # Panics
            ///
            /// Panics if a block size is not 16 or `tweak` is not 16 bytes.
            pub fn new(k1: C, k2: C, tweak: &[u8], dialect: XtsDialect) -> Self {
                Self {
                    core: XtsCore::new(k1, k2, tweak, dialect),
                }
            }

            /// Use `sector` (little-endian in the first 8 bytes) as the tweak.
            pub fn with_sector(k1: C, k2: C, sector: u64, dialect: XtsDialect) -> Self {
                Self::new(k1, k2, &sector_tweak(sector), dialect)
            }

            /// Split `key` into K1 || K2 halves and key both through `factory`.
            pub fn from_key<F>(
                factory: &F,
                key: &[u8],
                tweak: &[u8],
                dialect: XtsDialect,
            ) -> Result<Self, CryptoError>
            where
                F: CipherFactory<Cipher = C>,
            {
                Ok(Self {
                    core: XtsCore::from_key(factory, key, tweak, dialect)?,
                })
            }
        }

        impl<C: BlockCipher> BlockMode for $name<C> {
            fn block_size(&self) -> usize {
                BLOCK_SIZE
            }

            /// # Panics
            ///
            /// Panics if `src` is shorter than 16 bytes or at least 2^24
            /// bytes, or on the usual buffer violations.
            fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
                self.core.$method(dst, src);
            }
        }

        impl<C: BlockCipher> SetIv for $name<C> {
            /// Start a new data unit with `iv` as the (unencrypted) tweak.
            fn set_iv(&mut self, iv: &[u8]) {
                self.core.set_tweak(iv);
            }
        }
    };
}

xts_direction!(XtsEncrypter, encrypt, "XTS encryption of one data unit.");
xts_direction!(XtsDecrypter, decrypt, "XTS decryption of one data unit.");
