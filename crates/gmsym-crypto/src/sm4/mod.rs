//! SM4 block cipher implementation.
//!
//! SM4 is a 128-bit block cipher standardized by the Chinese government
//! (GB/T 32907-2016). It uses a 128-bit key and 32 rounds of an unbalanced
//! Feistel network over four 32-bit words.

use crate::provider::{BlockCipher, BlockCipherBatch};
use gmsym_types::CryptoError;
use zeroize::Zeroize;

/// SM4 block size in bytes (128 bits).
pub const SM4_BLOCK_SIZE: usize = 16;

/// SM4 key size in bytes (128 bits).
pub const SM4_KEY_SIZE: usize = 16;

/// Blocks per call on the batch path.
const SM4_CONCURRENCY: usize = 4;

// τ: the SM4 S-box (GB/T 32907-2016 §6.2).
const SBOX: [u8; 256] = [
    0xd6, 0x90, 0xe9, 0xfe, 0xcc, 0xe1, 0x3d, 0xb7, 0x16, 0xb6, 0x14, 0xc2, 0x28, 0xfb, 0x2c, 0x05,
    0x2b, 0x67, 0x9a, 0x76, 0x2a, 0xbe, 0x04, 0xc3, 0xaa, 0x44, 0x13, 0x26, 0x49, 0x86, 0x06, 0x99,
    0x9c, 0x42, 0x50, 0xf4, 0x91, 0xef, 0x98, 0x7a, 0x33, 0x54, 0x0b, 0x43, 0xed, 0xcf, 0xac, 0x62,
    0xe4, 0xb3, 0x1c, 0xa9, 0xc9, 0x08, 0xe8, 0x95, 0x80, 0xdf, 0x94, 0xfa, 0x75, 0x8f, 0x3f, 0xa6,
    0x47, 0x07, 0xa7, 0xfc, 0xf3, 0x73, 0x17, 0xba, 0x83, 0x59, 0x3c, 0x19, 0xe6, 0x85, 0x4f, 0xa8,
    0x68, 0x6b, 0x81, 0xb2, 0x71, 0x64, 0xda, 0x8b, 0xf8, 0xeb, 0x0f, 0x4b, 0x70, 0x56, 0x9d, 0x35,
    0x1e, 0x24, 0x0e, 0x5e, 0x63, 0x58, 0xd1, 0xa2, 0x25, 0x22, 0x7c, 0x3b, 0x01, 0x21, 0x78, 0x87,
    0xd4, 0x00, 0x46, 0x57, 0x9f, 0xd3, 0x27, 0x52, 0x4c, 0x36, 0x02, 0xe7, 0xa0, 0xc4, 0xc8, 0x9e,
    0xea, 0xbf, 0x8a, 0xd2, 0x40, 0xc7, 0x38, 0xb5, 0xa3, 0xf7, 0xf2, 0xce, 0xf9, 0x61, 0x15, 0xa1,
    0xe0, 0xae, 0x5d, 0xa4, 0x9b, 0x34, 0x1a, 0x55, 0xad, 0x93, 0x32, 0x30, 0xf5, 0x8c, 0xb1, 0xe3,
    0x1d, 0xf6, 0xe2, 0x2e, 0x82, 0x66, 0xca, 0x60, 0xc0, 0x29, 0x23, 0xab, 0x0d, 0x53, 0x4e, 0x6f,
    0xd5, 0xdb, 0x37, 0x45, 0xde, 0xfd, 0x8e, 0x2f, 0x03, 0xff, 0x6a, 0x72, 0x6d, 0x6c, 0x5b, 0x51,
    0x8d, 0x1b, 0xaf, 0x92, 0xbb, 0xdd, 0xbc, 0x7f, 0x11, 0xd9, 0x5c, 0x41, 0x1f, 0x10, 0x5a, 0xd8,
    0x0a, 0xc1, 0x31, 0x88, 0xa5, 0xcd, 0x7b, 0xbd, 0x2d, 0x74, 0xd0, 0x12, 0xb8, 0xe5, 0xb4, 0xb0,
    0x89, 0x69, 0x97, 0x4a, 0x0c, 0x96, 0x77, 0x7e, 0x65, 0xb9, 0xf1, 0x09, 0xc5, 0x6e, 0xc6, 0x84,
    0x18, 0xf0, 0x7d, 0xec, 0x3a, 0xdc, 0x4d, 0x20, 0x79, 0xee, 0x5f, 0x3e, 0xd7, 0xcb, 0x39, 0x48,
];

// System parameter FK.
const FK: [u32; 4] = [0xa3b1_bac6, 0x56aa_3350, 0x677d_9197, 0xb270_22dc];

// Fixed parameter CK: byte j of CK[i] is (4i + j) * 7 mod 256.
const CK: [u32; 32] = [
    0x0007_0e15, 0x1c23_2a31, 0x383f_464d, 0x545b_6269, 0x7077_7e85, 0x8c93_9aa1, 0xa8af_b6bd,
    0xc4cb_d2d9, 0xe0e7_eef5, 0xfc03_0a11, 0x181f_262d, 0x343b_4249, 0x5057_5e65, 0x6c73_7a81,
    0x888f_969d, 0xa4ab_b2b9, 0xc0c7_ced5, 0xdce3_eaf1, 0xf8ff_060d, 0x141b_2229, 0x3037_3e45,
    0x4c53_5a61, 0x686f_767d, 0x848b_9299, 0xa0a7_aeb5, 0xbcc3_cad1, 0xd8df_e6ed, 0xf4fb_0209,
    0x1017_1e25, 0x2c33_3a41, 0x484f_565d, 0x646b_7279,
];

#[inline]
fn tau(x: u32) -> u32 {
    let b = x.to_be_bytes();
    u32::from_be_bytes([
        SBOX[b[0] as usize],
        SBOX[b[1] as usize],
        SBOX[b[2] as usize],
        SBOX[b[3] as usize],
    ])
}

/// Round transform T = L ∘ τ.
#[inline]
fn t(x: u32) -> u32 {
    let b = tau(x);
    b ^ b.rotate_left(2) ^ b.rotate_left(10) ^ b.rotate_left(18) ^ b.rotate_left(24)
}

/// Key-schedule transform T' = L' ∘ τ.
#[inline]
fn t_prime(x: u32) -> u32 {
    let b = tau(x);
    b ^ b.rotate_left(13) ^ b.rotate_left(23)
}

fn crypt_block(rk: &[u32; 32], dst: &mut [u8], src: &[u8]) {
    assert!(
        src.len() >= SM4_BLOCK_SIZE,
        "sm4: input not full block"
    );
    assert!(
        dst.len() >= SM4_BLOCK_SIZE,
        "sm4: output not full block"
    );
    let mut x = [0u32; 4];
    for (i, w) in x.iter_mut().enumerate() {
        *w = u32::from_be_bytes([src[4 * i], src[4 * i + 1], src[4 * i + 2], src[4 * i + 3]]);
    }
    for r in (0..32).step_by(4) {
        x[0] ^= t(x[1] ^ x[2] ^ x[3] ^ rk[r]);
        x[1] ^= t(x[2] ^ x[3] ^ x[0] ^ rk[r + 1]);
        x[2] ^= t(x[3] ^ x[0] ^ x[1] ^ rk[r + 2]);
        x[3] ^= t(x[0] ^ x[1] ^ x[2] ^ rk[r + 3]);
    }
    // R(X32..X35) = (X35, X34, X33, X32)
    for (i, w) in x.iter().rev().enumerate() {
        dst[4 * i..4 * i + 4].copy_from_slice(&w.to_be_bytes());
    }
}

/// An SM4 key with precomputed round keys.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Sm4Key {
    /// Encryption round keys rk[0..32].
    enc: [u32; 32],
    /// Decryption round keys, `dec[i] == enc[31 - i]`.
    dec: [u32; 32],
}

impl Sm4Key {
    /// Create a new SM4 key from 16 raw bytes.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != SM4_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: SM4_KEY_SIZE,
                got: key.len(),
            });
        }
        let mut k = [0u32; 4];
        for (i, w) in k.iter_mut().enumerate() {
            *w = u32::from_be_bytes([key[4 * i], key[4 * i + 1], key[4 * i + 2], key[4 * i + 3]])
                ^ FK[i];
        }
        let mut enc = [0u32; 32];
        for i in 0..32 {
            let next = k[i % 4] ^ t_prime(k[(i + 1) % 4] ^ k[(i + 2) % 4] ^ k[(i + 3) % 4] ^ CK[i]);
            k[i % 4] = next;
            enc[i] = next;
        }
        k.zeroize();
        let mut dec = [0u32; 32];
        for (i, rk) in dec.iter_mut().enumerate() {
            *rk = enc[31 - i];
        }
        Ok(Self { enc, dec })
    }

    /// Encrypt a single 16-byte block in place.
    pub fn encrypt_block(&self, block: &mut [u8]) {
        self.encrypt_in_place(block);
    }

    /// Decrypt a single 16-byte block in place.
    pub fn decrypt_block(&self, block: &mut [u8]) {
        self.decrypt_in_place(block);
    }
}

impl BlockCipher for Sm4Key {
    fn block_size(&self) -> usize {
        SM4_BLOCK_SIZE
    }

    fn encrypt(&self, dst: &mut [u8], src: &[u8]) {
        crypt_block(&self.enc, dst, src);
    }

    fn decrypt(&self, dst: &mut [u8], src: &[u8]) {
        crypt_block(&self.dec, dst, src);
    }
}

impl BlockCipherBatch for Sm4Key {
    fn concurrency(&self) -> usize {
        SM4_CONCURRENCY
    }

    fn encrypt_blocks(&self, dst: &mut [u8], src: &[u8]) {
        let n = SM4_CONCURRENCY * SM4_BLOCK_SIZE;
        assert!(src.len() >= n && dst.len() >= n, "sm4: batch input too short");
        for (d, s) in dst[..n]
            .chunks_exact_mut(SM4_BLOCK_SIZE)
            .zip(src[..n].chunks_exact(SM4_BLOCK_SIZE))
        {
            crypt_block(&self.enc, d, s);
        }
    }

    fn decrypt_blocks(&self, dst: &mut [u8], src: &[u8]) {
        let n = SM4_CONCURRENCY * SM4_BLOCK_SIZE;
        assert!(src.len() >= n && dst.len() >= n, "sm4: batch input too short");
        for (d, s) in dst[..n]
            .chunks_exact_mut(SM4_BLOCK_SIZE)
            .zip(src[..n].chunks_exact(SM4_BLOCK_SIZE))
        {
            crypt_block(&self.dec, d, s);
        }
    }
}
