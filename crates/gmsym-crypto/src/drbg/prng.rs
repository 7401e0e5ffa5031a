//! PRNG adapter: a DRBG kept seeded from an [`EntropySource`].
//!
//! [`DrbgPrng`] draws `security_strength` bytes of entropy and a nonce of
//! half that length at construction, splits reads into chunks the DRBG
//! accepts, and reseeds from the same source whenever the DRBG asks for it.

use super::{select_security_strength, CtrDrbg, DrbgConfig, HashDrbg, HmacDrbg};
use crate::provider::{CipherFactory, Drbg, EntropySource};
use gmsym_types::{CryptoError, HashAlgId, SecurityLevel};
use std::io;
use zeroize::Zeroize;

#[cfg(feature = "sm4")]
use super::ctr_drbg::Sm4Factory;
#[cfg(feature = "sm4")]
use crate::sm4::Sm4Key;

/// Minimum security strength (bytes) for the GM Hash and CTR adapters.
const GM_MIN_STRENGTH: usize = 32;

/// Byte reader over a self-reseeding DRBG.
pub struct DrbgPrng<E: EntropySource> {
    entropy: E,
    security_strength: usize,
    drbg: Box<dyn Drbg + Send>,
}

impl<E: EntropySource> DrbgPrng<E> {
    /// Hash-DRBG adapter over `alg`.
    ///
    /// `requested_strength` is rounded up by [`select_security_strength`].
    /// The GM dialect rejects strengths below 32 bytes.
    pub fn new_hash(
        entropy: E,
        alg: HashAlgId,
        config: DrbgConfig,
        requested_strength: usize,
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        let strength = gm_checked_strength(config, requested_strength)?;
        Self::instantiate(entropy, strength, |ent, nonce| {
            let drbg = HashDrbg::new(alg, config, ent, nonce, personalization)?;
            Ok(Box::new(drbg) as Box<dyn Drbg + Send>)
        })
    }

    /// HMAC-DRBG adapter over `alg`.
    pub fn new_hmac(
        entropy: E,
        alg: HashAlgId,
        config: DrbgConfig,
        requested_strength: usize,
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        let strength = select_security_strength(requested_strength);
        Self::instantiate(entropy, strength, |ent, nonce| {
            let drbg = HmacDrbg::new(alg, config, ent, nonce, personalization)?;
            Ok(Box::new(drbg) as Box<dyn Drbg + Send>)
        })
    }

    /// CTR-DRBG adapter over the ciphers built by `factory`.
    ///
    /// The GM dialect rejects strengths below 32 bytes.
    pub fn new_ctr<F>(
        entropy: E,
        factory: F,
        key_len: usize,
        config: DrbgConfig,
        requested_strength: usize,
        personalization: &[u8],
    ) -> Result<Self, CryptoError>
    where
        F: CipherFactory + Send + 'static,
        F::Cipher: 'static,
    {
        let strength = gm_checked_strength(config, requested_strength)?;
        Self::instantiate(entropy, strength, |ent, nonce| {
            let drbg = CtrDrbg::new(factory, key_len, config, ent, nonce, personalization)?;
            Ok(Box::new(drbg) as Box<dyn Drbg + Send>)
        })
    }

    /// GM/T 0105 Hash-DRBG (SM3) adapter at 32-byte strength.
    pub fn new_gm_hash(
        entropy: E,
        level: SecurityLevel,
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        Self::new_hash(
            entropy,
            HashAlgId::Sm3,
            DrbgConfig::gm(level),
            GM_MIN_STRENGTH,
            personalization,
        )
    }

    /// GM/T 0105 CTR-DRBG (SM4) adapter at 32-byte strength.
    #[cfg(feature = "sm4")]
    pub fn new_gm_ctr(
        entropy: E,
        level: SecurityLevel,
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        Self::new_ctr(
            entropy,
            Sm4Key::new as Sm4Factory,
            16,
            DrbgConfig::gm(level),
            GM_MIN_STRENGTH,
            personalization,
        )
    }

    fn instantiate(
        mut entropy: E,
        security_strength: usize,
        build: impl FnOnce(&[u8], &[u8]) -> Result<Box<dyn Drbg + Send>, CryptoError>,
    ) -> Result<Self, CryptoError> {
        let mut seed = vec![0u8; security_strength + security_strength / 2];
        if let Err(e) = entropy.fill_entropy(&mut seed) {
            log::warn!("prng: entropy source failed during instantiate: {e}");
            seed.zeroize();
            return Err(e);
        }
        let (ent, nonce) = seed.split_at(security_strength);
        let drbg = build(ent, nonce);
        seed.zeroize();
        Ok(Self {
            entropy,
            security_strength,
            drbg: drbg?,
        })
    }

    pub fn security_strength(&self) -> usize {
        self.security_strength
    }

    /// Tear down the DRBG and hand back the entropy source.
    pub fn into_entropy(mut self) -> E {
        self.drbg.destroy();
        self.entropy
    }

    /// Pull fresh entropy and reseed the DRBG.
    pub fn reseed(&mut self) -> Result<(), CryptoError> {
        let mut ent = vec![0u8; self.security_strength];
        if let Err(e) = self.entropy.fill_entropy(&mut ent) {
            log::warn!("prng: entropy source failed during reseed: {e}");
            ent.zeroize();
            return Err(e);
        }
        let result = self.drbg.reseed(&ent, None);
        ent.zeroize();
        result
    }

    /// Fill `buf` with pseudorandom bytes, reseeding as needed.
    pub fn fill_bytes(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
        let max = self.drbg.max_bytes_per_request();
        for chunk in buf.chunks_mut(max) {
            if self.drbg.needs_reseed() {
                log::debug!("prng: reseed interval reached, reseeding");
                self.reseed()?;
            }
            match self.drbg.generate(chunk, None) {
                Err(CryptoError::DrbgReseedRequired) => {
                    log::debug!("prng: drbg requested reseed, reseeding");
                    self.reseed()?;
                    self.drbg.generate(chunk, None)?;
                }
                other => other?,
            }
        }
        Ok(())
    }
}

impl<E: EntropySource> io::Read for DrbgPrng<E> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.fill_bytes(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }
}

fn gm_checked_strength(config: DrbgConfig, requested: usize) -> Result<usize, CryptoError> {
    let strength = select_security_strength(requested);
    if config.is_gm() && strength < GM_MIN_STRENGTH {
        return Err(CryptoError::DrbgInvalidSecurityStrength);
    }
    Ok(strength)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmsym_types::DrbgDialect;
    use std::io::Read;

    /// Counter-based fixture; counts calls.
    struct CountingEntropy {
        next: u8,
        calls: usize,
    }

    impl CountingEntropy {
        fn new() -> Self {
            Self { next: 0, calls: 0 }
        }
    }

    impl EntropySource for CountingEntropy {
        fn fill_entropy(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
            self.calls += 1;
            for b in buf.iter_mut() {
                *b = self.next;
                self.next = self.next.wrapping_add(1);
            }
            Ok(())
        }
    }

    struct FailingEntropy;

    impl EntropySource for FailingEntropy {
        fn fill_entropy(&mut self, _buf: &mut [u8]) -> Result<(), CryptoError> {
            Err(CryptoError::DrbgEntropyFail)
        }
    }

    #[test]
    fn test_prng_gm_hash_matches_direct_drbg() {
        let mut prng =
            DrbgPrng::new_gm_hash(CountingEntropy::new(), SecurityLevel::One, b"").unwrap();
        assert_eq!(prng.security_strength(), 32);

        // entropy = 0..32, nonce = 32..48
        let seed: Vec<u8> = (0u8..48).collect();
        let mut direct = HashDrbg::gm(SecurityLevel::One, &seed[..32], &seed[32..], b"").unwrap();
        let mut expected = [0u8; 32];
        direct.generate(&mut expected, None).unwrap();

        let mut out = [0u8; 32];
        prng.fill_bytes(&mut out).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_prng_read_splits_requests() {
        let mut prng =
            DrbgPrng::new_gm_ctr(CountingEntropy::new(), SecurityLevel::One, b"prng").unwrap();
        let mut out = vec![0u8; 100];
        assert_eq!(prng.read(&mut out).unwrap(), 100);
        assert!(out.chunks(16).all(|c| c.iter().any(|&b| b != 0)));
    }

    #[test]
    fn test_prng_reseeds_automatically() {
        let config = DrbgConfig {
            dialect: DrbgDialect::Nist,
            security_level: SecurityLevel::Test,
        };
        let mut prng =
            DrbgPrng::new_hmac(CountingEntropy::new(), HashAlgId::Sha256, config, 16, b"")
                .unwrap();
        assert_eq!(prng.entropy.calls, 1);
        let mut out = [0u8; 8];
        for _ in 0..20 {
            prng.fill_bytes(&mut out).unwrap();
        }
        // 8 generates per seed: reseeded before calls 9 and 17
        assert_eq!(prng.entropy.calls, 3);
    }

    #[test]
    fn test_prng_gm_strength() {
        assert!(matches!(
            DrbgPrng::new_hash(
                CountingEntropy::new(),
                HashAlgId::Sm3,
                DrbgConfig::gm(SecurityLevel::One),
                16,
                b""
            ),
            Err(CryptoError::DrbgInvalidSecurityStrength)
        ));
        assert!(matches!(
            DrbgPrng::new_ctr(
                CountingEntropy::new(),
                Sm4Key::new,
                16,
                DrbgConfig::gm(SecurityLevel::Two),
                24,
                b""
            ),
            Err(CryptoError::DrbgInvalidSecurityStrength)
        ));
        let prng = DrbgPrng::new_hash(
            CountingEntropy::new(),
            HashAlgId::Sha256,
            DrbgConfig::nist(),
            20,
            b"",
        )
        .unwrap();
        assert_eq!(prng.security_strength(), 24);
    }

    #[test]
    fn test_prng_entropy_failure() {
        assert!(matches!(
            DrbgPrng::new_gm_hash(FailingEntropy, SecurityLevel::One, b""),
            Err(CryptoError::DrbgEntropyFail)
        ));
    }

    #[test]
    fn test_prng_read_maps_errors() {
        let config = DrbgConfig {
            dialect: DrbgDialect::Nist,
            security_level: SecurityLevel::Test,
        };
        let mut prng =
            DrbgPrng::new_hash(CountingEntropy::new(), HashAlgId::Sm3, config, 32, b"").unwrap();
        let mut out = [0u8; 4];
        prng.read_exact(&mut out).unwrap();
        prng.drbg.destroy();
        let err = prng.read(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(err.to_string(), CryptoError::DrbgInvalidState.to_string());
    }
}
