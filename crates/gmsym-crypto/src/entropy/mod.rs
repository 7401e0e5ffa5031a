//! Operating-system entropy for seeding DRBGs.
//!
//! [`SystemEntropy`] implements [`EntropySource`] on top of `getrandom`,
//! which reads `getrandom(2)`, `getentropy()` or the platform equivalent.
//! The OS output is treated as full entropy, so no conditioning is applied.
//!
//! # Example
//!
//! ```
//! use gmsym_crypto::entropy::SystemEntropy;
//! use gmsym_crypto::provider::EntropySource;
//!
//! let mut es = SystemEntropy;
//! let mut buf = [0u8; 32];
//! es.fill_entropy(&mut buf).expect("entropy acquisition failed");
//! ```

use crate::provider::EntropySource;
use gmsym_types::CryptoError;

/// System entropy source wrapping `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn fill_entropy(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
        if buf.is_empty() {
            return Ok(());
        }
        getrandom::getrandom(buf).map_err(|e| {
            log::warn!("entropy: getrandom failed: {e}");
            CryptoError::DrbgEntropyFail
        })
    }
}
