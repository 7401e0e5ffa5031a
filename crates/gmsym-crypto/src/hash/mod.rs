//! Unified hash module.
//!
//! Re-exports the hash implementations and maps a [`HashAlgId`] to a boxed
//! [`Digest`], which is how HMAC and the hash-based DRBGs pick their hash.

pub use crate::provider::Digest;
use gmsym_types::{CryptoError, HashAlgId};

#[cfg(feature = "sha2")]
pub use crate::sha2::{Sha256, Sha384, Sha512};

#[cfg(feature = "sm3")]
pub use crate::sm3::Sm3;

/// Create a fresh digest context for `alg`.
///
/// Returns [`CryptoError::InvalidArg`] when the algorithm's feature is
/// disabled.
pub fn new_digest(alg: HashAlgId) -> Result<Box<dyn Digest>, CryptoError> {
    match alg {
        #[cfg(feature = "sm3")]
        HashAlgId::Sm3 => Ok(Box::new(Sm3::new())),
        #[cfg(feature = "sha2")]
        HashAlgId::Sha256 => Ok(Box::new(Sha256::new())),
        #[cfg(feature = "sha2")]
        HashAlgId::Sha384 => Ok(Box::new(Sha384::new())),
        #[cfg(feature = "sha2")]
        HashAlgId::Sha512 => Ok(Box::new(Sha512::new())),
        #[allow(unreachable_patterns)]
        _ => Err(CryptoError::InvalidArg),
    }
}

/// One-shot digest of the concatenation of `parts`.
pub fn digest_parts(alg: HashAlgId, parts: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
    let mut ctx = new_digest(alg)?;
    for part in parts {
        ctx.update(part)?;
    }
    let mut out = vec![0u8; ctx.output_size()];
    ctx.finish(&mut out)?;
    Ok(out)
}
