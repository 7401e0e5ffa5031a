#![doc = "SM4, block cipher modes, GHASH-based AEADs and DRBGs for the gmsym workspace."]
#![forbid(unsafe_code)]

// Core traits
pub mod provider;
pub mod util;

// Hash algorithms
#[cfg(feature = "sha2")]
pub mod sha2;
#[cfg(feature = "sm3")]
pub mod sm3;

pub mod hash;

// Symmetric ciphers
#[cfg(feature = "aes")]
pub mod aes;
#[cfg(feature = "sm4")]
pub mod sm4;

// GF(2^128) arithmetic shared by GCM, GXM, MUR and HCTR
pub mod gf128;

// Modes of operation
#[cfg(feature = "modes")]
pub mod modes;

pub mod cipher {
    //! Unified symmetric cipher interface.
    pub use super::provider::{
        Aead, BlockCipher, BlockCipherBatch, BlockMode, LengthPreservingMode,
        SeekableStreamMode, SetIv, StreamCipher, StreamMode,
    };
}

// MAC algorithms
#[cfg(feature = "hmac")]
pub mod hmac;

// Random bit generation
#[cfg(feature = "drbg")]
pub mod drbg;
#[cfg(feature = "entropy")]
pub mod entropy;
