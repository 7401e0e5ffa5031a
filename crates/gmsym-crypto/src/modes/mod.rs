//! Block cipher modes of operation.
//!
//! Every mode is generic over a [`BlockCipher`](crate::provider::BlockCipher)
//! with a 16-byte block:
//!
//! - confidentiality: ECB, CBC, CFB, OFB, CTR, XTS and the GB/T 17964 modes
//!   BC and OFBNLF;
//! - length-preserving: HCTR;
//! - AEAD: GCM, CCM and the GM/T 0001.4 stream-cipher AEADs GXM and MUR.
//!
//! Misuse (short output buffers, partial blocks given to block modes,
//! overlapping buffers, wrong IV length) panics with a message prefixed by
//! the mode name.

pub mod bc;
pub mod cbc;
pub mod ccm;
pub mod cfb;
pub mod ctr;
pub mod ecb;
pub mod gcm;
pub mod gxm;
pub mod hctr;
pub mod mur;
pub mod ofb;
pub mod ofbnlf;
pub mod xts;

pub use bc::{BcDecrypter, BcEncrypter};
pub use cbc::{CbcDecrypter, CbcEncrypter};
pub use ccm::Ccm;
pub use cfb::Cfb;
pub use ctr::Ctr;
pub use ecb::{EcbDecrypter, EcbEncrypter};
pub use gcm::Gcm;
pub use gxm::Gxm;
pub use hctr::Hctr;
pub use mur::Mur;
pub use ofb::Ofb;
pub use ofbnlf::{OfbNlfDecrypter, OfbNlfEncrypter};
pub use xts::{XtsDecrypter, XtsEncrypter};

use crate::provider::BlockCipher;
use crate::util::check_buffers;

/// The only block size supported by the modes.
pub const BLOCK_SIZE: usize = 16;

/// Batch function pointer captured by `new_with_batch` constructors.
pub(crate) type BatchFn<C> = fn(&C, &mut [u8], &[u8]);

/// # Panics
///
/// Panics if the cipher's block size is not 16.
pub(crate) fn assert_block_size<C: BlockCipher + ?Sized>(mode: &str, cipher: &C) {
    if cipher.block_size() != BLOCK_SIZE {
        panic!("{mode}: block size must be {BLOCK_SIZE}");
    }
}

pub(crate) fn iv_block(mode: &str, iv: &[u8]) -> [u8; BLOCK_SIZE] {
    if iv.len() != BLOCK_SIZE {
        panic!("{mode}: IV length must equal block size");
    }
    let mut out = [0u8; BLOCK_SIZE];
    out.copy_from_slice(iv);
    out
}

/// Block-mode preconditions: whole blocks, room in `dst`, no inexact overlap.
pub(crate) fn check_block_input(mode: &str, dst: &[u8], src: &[u8]) {
    if src.len() % BLOCK_SIZE != 0 {
        panic!("{mode}: input not full blocks");
    }
    check_buffers(mode, dst, src);
}

/// Big-endian increment over the whole 16-byte block.
pub(crate) fn inc_be128(counter: &mut [u8; BLOCK_SIZE]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Add `n` to a 16-byte big-endian counter modulo 2^128.
pub(crate) fn add_be128(counter: &mut [u8; BLOCK_SIZE], n: u64) {
    let value = u128::from_be_bytes(*counter).wrapping_add(u128::from(n));
    *counter = value.to_be_bytes();
}

/// Big-endian increment of the last four bytes only (GCM's inc32).
pub(crate) fn inc32(counter: &mut [u8; BLOCK_SIZE]) {
    let ctr =
        u32::from_be_bytes([counter[12], counter[13], counter[14], counter[15]]).wrapping_add(1);
    counter[12..16].copy_from_slice(&ctr.to_be_bytes());
}

#[cfg(test)]
pub(crate) mod test_util {
    /// 64-byte plaintext from NIST SP 800-38A.
    pub const NIST_PT: &str = "6bc1bee22e409f96e93d7e117393172aae2d8a571e03ac9c9eb76fac45af8e51\
                               30c81c46a35ce411e5fbc1191a0a52eff69f2445df4f9b17ad2b417be66c3710";

    pub fn hex_to_bytes(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }
}
