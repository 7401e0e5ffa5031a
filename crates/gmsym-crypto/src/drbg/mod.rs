//! Deterministic Random Bit Generators (NIST SP 800-90A / GM/T 0105-2021).
//!
//! Provides three DRBG variants, each in a NIST and a GM dialect:
//! - Hash-DRBG (SP 800-90A §10.1.1) over SM3 or SHA-2
//! - HMAC-DRBG (SP 800-90A §10.1.2) over SM3 or SHA-2
//! - CTR-DRBG (SP 800-90A §10.2, with derivation function) over any
//!   16-byte block cipher
//!
//! plus [`DrbgPrng`], which keeps a DRBG seeded from an
//! [`EntropySource`](crate::provider::EntropySource) and implements
//! [`std::io::Read`].

use gmsym_types::{CryptoError, DrbgDialect, SecurityLevel};
use std::time::{Duration, Instant};

pub mod ctr_drbg;
pub mod hash_drbg;
pub mod hmac_drbg;
pub mod prng;

pub use ctr_drbg::CtrDrbg;
pub use hash_drbg::HashDrbg;
pub use hmac_drbg::HmacDrbg;
pub use prng::DrbgPrng;

/// Upper bound (exclusive) on entropy, personalization and additional input.
pub const MAX_BYTES: usize = 1 << 27;

/// Per-request output cap for the NIST dialect.
pub const NIST_MAX_BYTES_PER_REQUEST: usize = 1 << 16;

const NIST_RESEED_COUNTER_LIMIT: u64 = 1 << 48;
const GM_LEVEL1_RESEED_COUNTER_LIMIT: u64 = 1 << 20;
const GM_LEVEL2_RESEED_COUNTER_LIMIT: u64 = 1 << 10;
const TEST_RESEED_COUNTER_LIMIT: u64 = 8;

/// Dialect and security level of a DRBG instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrbgConfig {
    pub dialect: DrbgDialect,
    pub security_level: SecurityLevel,
}

impl DrbgConfig {
    /// NIST SP 800-90A at security level one.
    pub fn nist() -> Self {
        Self::default()
    }

    /// GM/T 0105-2021 at the given level.
    pub fn gm(security_level: SecurityLevel) -> Self {
        Self {
            dialect: DrbgDialect::Gm,
            security_level,
        }
    }

    pub fn is_gm(&self) -> bool {
        self.dialect == DrbgDialect::Gm
    }

    /// Generate calls allowed between reseeds.
    pub fn reseed_counter_limit(&self) -> u64 {
        match (self.dialect, self.security_level) {
            (_, SecurityLevel::Test) => TEST_RESEED_COUNTER_LIMIT,
            (DrbgDialect::Nist, _) => NIST_RESEED_COUNTER_LIMIT,
            (DrbgDialect::Gm, SecurityLevel::One) => GM_LEVEL1_RESEED_COUNTER_LIMIT,
            (DrbgDialect::Gm, SecurityLevel::Two) => GM_LEVEL2_RESEED_COUNTER_LIMIT,
        }
    }

    /// Time allowed between reseeds. Only the GM dialect has one.
    pub fn reseed_time_limit(&self) -> Option<Duration> {
        if !self.is_gm() {
            return None;
        }
        let secs = match self.security_level {
            SecurityLevel::One => 600,
            SecurityLevel::Two => 60,
            SecurityLevel::Test => 6,
        };
        Some(Duration::from_secs(secs))
    }

    /// Output cap per generate call: `output_block` bytes in the GM dialect
    /// (hash or cipher block size), 2^16 bytes otherwise.
    pub fn max_bytes_per_request(&self, output_block: usize) -> usize {
        if self.is_gm() {
            output_block
        } else {
            NIST_MAX_BYTES_PER_REQUEST
        }
    }
}

/// Round a requested security strength (bytes) up to 14, 16, 24 or 32.
/// Larger requests are returned unchanged.
pub fn select_security_strength(requested: usize) -> usize {
    match requested {
        0..=14 => 14,
        15..=16 => 16,
        17..=24 => 24,
        25..=32 => 32,
        _ => requested,
    }
}

/// Reseed bookkeeping shared by every variant.
#[derive(Debug)]
pub(crate) struct ReseedState {
    config: DrbgConfig,
    counter: u64,
    counter_limit: u64,
    time_limit: Option<Duration>,
    reseeded_at: Instant,
    destroyed: bool,
}

impl ReseedState {
    pub(crate) fn new(config: DrbgConfig) -> Self {
        Self {
            config,
            counter: 1,
            counter_limit: config.reseed_counter_limit(),
            time_limit: config.reseed_time_limit(),
            reseeded_at: Instant::now(),
            destroyed: false,
        }
    }

    pub(crate) fn config(&self) -> DrbgConfig {
        self.config
    }

    pub(crate) fn is_gm(&self) -> bool {
        self.config.is_gm()
    }

    pub(crate) fn counter(&self) -> u64 {
        self.counter
    }

    pub(crate) fn needs_reseed(&self) -> bool {
        self.destroyed
            || self.counter > self.counter_limit
            || self
                .time_limit
                .is_some_and(|limit| self.reseeded_at.elapsed() > limit)
    }

    pub(crate) fn ensure_live(&self) -> Result<(), CryptoError> {
        if self.destroyed {
            return Err(CryptoError::DrbgInvalidState);
        }
        Ok(())
    }

    /// Common generate preconditions, in the order the checks must fail.
    pub(crate) fn check_generate(
        &self,
        requested: usize,
        max: usize,
        additional: &[u8],
    ) -> Result<(), CryptoError> {
        self.ensure_live()?;
        if self.needs_reseed() {
            return Err(CryptoError::DrbgReseedRequired);
        }
        check_additional(additional)?;
        if requested > max {
            return Err(CryptoError::DrbgRequestTooLarge {
                max,
                got: requested,
            });
        }
        Ok(())
    }

    pub(crate) fn advance(&mut self) {
        self.counter += 1;
    }

    pub(crate) fn reseeded(&mut self) {
        self.counter = 1;
        self.reseeded_at = Instant::now();
    }

    pub(crate) fn destroy(&mut self) {
        self.destroyed = true;
    }
}

pub(crate) fn check_entropy(entropy: &[u8], min: usize) -> Result<(), CryptoError> {
    if entropy.is_empty() || entropy.len() < min || entropy.len() >= MAX_BYTES {
        return Err(CryptoError::DrbgInvalidEntropyLength);
    }
    Ok(())
}

pub(crate) fn check_nonce(nonce: &[u8], min: usize) -> Result<(), CryptoError> {
    if nonce.is_empty() || nonce.len() < min || nonce.len() >= MAX_BYTES >> 1 {
        return Err(CryptoError::DrbgInvalidNonceLength);
    }
    Ok(())
}

pub(crate) fn check_personalization(personalization: &[u8]) -> Result<(), CryptoError> {
    if personalization.len() >= MAX_BYTES {
        return Err(CryptoError::DrbgPersonalizationTooLong);
    }
    Ok(())
}

pub(crate) fn check_additional(additional: &[u8]) -> Result<(), CryptoError> {
    if additional.len() >= MAX_BYTES {
        return Err(CryptoError::DrbgAdditionalInputTooLong);
    }
    Ok(())
}

/// `v = (v + addend) mod 2^(8·|v|)`, `addend` right-aligned.
pub(crate) fn add_be(v: &mut [u8], addend: &[u8]) {
    let offset = v.len() - addend.len().min(v.len());
    let addend = &addend[addend.len() - (v.len() - offset)..];
    let mut carry = 0u16;
    for i in (0..v.len()).rev() {
        let a = if i >= offset { u16::from(addend[i - offset]) } else { 0 };
        let sum = u16::from(v[i]) + a + carry;
        v[i] = sum as u8;
        carry = sum >> 8;
    }
}
