//! HMAC-DRBG (NIST SP 800-90A Section 10.1.2).
//!
//! GM/T 0105 does not define an HMAC construction; the GM dialect only
//! changes the reseed policy and the minimum reseed entropy. Output is capped
//! at the NIST per-request limit in both dialects.

use super::{
    check_additional, check_entropy, check_nonce, check_personalization, DrbgConfig,
    ReseedState, NIST_MAX_BYTES_PER_REQUEST,
};
use crate::hmac::Hmac;
use crate::provider::Drbg;
use gmsym_types::{CryptoError, HashAlgId};
use zeroize::Zeroize;

/// HMAC-DRBG context.
pub struct HmacDrbg {
    alg: HashAlgId,
    /// HMAC key K (hash-size bytes).
    k: Vec<u8>,
    /// HMAC value V (hash-size bytes).
    v: Vec<u8>,
    state: ReseedState,
}

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.k.zeroize();
        self.v.zeroize();
    }
}

impl HmacDrbg {
    /// Instantiate an HMAC-DRBG (SP 800-90A §10.1.2.3).
    pub fn new(
        alg: HashAlgId,
        config: DrbgConfig,
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        check_entropy(entropy, 0)?;
        check_nonce(nonce, 0)?;
        check_personalization(personalization)?;

        let hash_size = alg.output_size();
        let mut drbg = Self {
            alg,
            k: vec![0x00; hash_size],
            v: vec![0x01; hash_size],
            state: ReseedState::new(config),
        };
        drbg.update(&[entropy, nonce, personalization])?;

        log::debug!(
            "hmac-drbg: instantiated ({:?}, {:?}, {:?}, seedlen {})",
            alg,
            config.dialect,
            config.security_level,
            hash_size
        );
        Ok(drbg)
    }

    /// NIST SP 800-90A HMAC-DRBG over `alg`.
    pub fn nist(
        alg: HashAlgId,
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        Self::new(alg, DrbgConfig::nist(), entropy, nonce, personalization)
    }

    pub fn algorithm(&self) -> HashAlgId {
        self.alg
    }

    pub fn config(&self) -> DrbgConfig {
        self.state.config()
    }

    /// HMAC_DRBG_Update (SP 800-90A §10.1.2.2) over the concatenation of
    /// `provided`.
    fn update(&mut self, provided: &[&[u8]]) -> Result<(), CryptoError> {
        self.step(0x00, provided)?;
        if provided.iter().all(|p| p.is_empty()) {
            return Ok(());
        }
        self.step(0x01, provided)
    }

    /// K = HMAC(K, V || sep || provided); V = HMAC(K, V)
    fn step(&mut self, sep: u8, provided: &[&[u8]]) -> Result<(), CryptoError> {
        let sep = [sep];
        let mut parts: Vec<&[u8]> = Vec::with_capacity(provided.len() + 2);
        parts.push(&self.v);
        parts.push(&sep);
        parts.extend_from_slice(provided);
        let k = Hmac::mac_parts(self.alg, &self.k, &parts)?;
        self.k.zeroize();
        self.k = k;
        let v = Hmac::mac(self.alg, &self.k, &self.v)?;
        self.v.copy_from_slice(&v);
        Ok(())
    }
}

impl Drbg for HmacDrbg {
    fn reseed(&mut self, entropy: &[u8], additional: Option<&[u8]>) -> Result<(), CryptoError> {
        self.state.ensure_live()?;
        let min = if self.state.is_gm() {
            self.alg.output_size()
        } else {
            0
        };
        check_entropy(entropy, min)?;
        let additional = additional.unwrap_or_default();
        check_additional(additional)?;

        self.update(&[entropy, additional])?;
        self.state.reseeded();
        log::debug!("hmac-drbg: reseeded");
        Ok(())
    }

    fn needs_reseed(&self) -> bool {
        self.state.needs_reseed()
    }

    fn generate(&mut self, out: &mut [u8], additional: Option<&[u8]>) -> Result<(), CryptoError> {
        let additional = additional.unwrap_or_default();
        self.state
            .check_generate(out.len(), self.max_bytes_per_request(), additional)?;
        log::trace!("hmac-drbg: generate {} bytes", out.len());

        if !additional.is_empty() {
            self.update(&[additional])?;
        }
        for chunk in out.chunks_mut(self.alg.output_size()) {
            let v = Hmac::mac(self.alg, &self.k, &self.v)?;
            self.v.copy_from_slice(&v);
            chunk.copy_from_slice(&self.v[..chunk.len()]);
        }
        self.update(&[additional])?;
        self.state.advance();
        Ok(())
    }

    fn max_bytes_per_request(&self) -> usize {
        NIST_MAX_BYTES_PER_REQUEST
    }

    fn destroy(&mut self) {
        self.k.as_mut_slice().zeroize();
        self.v.as_mut_slice().zeroize();
        self.state.destroy();
    }
}
