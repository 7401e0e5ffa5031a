//! Hash-DRBG (Hash-based Deterministic Random Bit Generator).
//!
//! Implements NIST SP 800-90A Section 10.1.1 over SM3, SHA-256, SHA-384 or
//! SHA-512, and the GM/T 0105-2021 variant, which reorders the reseed
//! operands and emits a single hash block per request.

use super::{
    add_be, check_additional, check_entropy, check_nonce, check_personalization, DrbgConfig,
    ReseedState,
};
use crate::hash::digest_parts;
use crate::provider::Drbg;
use gmsym_types::{CryptoError, HashAlgId, SecurityLevel};
use zeroize::Zeroize;

/// Seed length in bytes (SP 800-90A Table 2).
fn seed_len(alg: HashAlgId) -> usize {
    if alg.output_size() <= 32 {
        55
    } else {
        111
    }
}

/// Hash_df: Hash derivation function (SP 800-90A §10.3.1).
///
/// Derives `output_len` bytes from the concatenation of `input`.
fn hash_df(alg: HashAlgId, input: &[&[u8]], output_len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut temp = Vec::with_capacity(output_len + alg.output_size());
    let bits = ((output_len * 8) as u32).to_be_bytes();
    let mut counter: u8 = 1;

    while temp.len() < output_len {
        // Hash(counter || no_of_bits_to_return || input_string)
        let ctr = [counter];
        let mut parts: Vec<&[u8]> = Vec::with_capacity(input.len() + 2);
        parts.push(&ctr);
        parts.push(&bits);
        parts.extend_from_slice(input);
        temp.extend_from_slice(&digest_parts(alg, &parts)?);
        counter = counter.wrapping_add(1);
    }

    temp.truncate(output_len);
    Ok(temp)
}

/// Hash-DRBG context.
pub struct HashDrbg {
    alg: HashAlgId,
    /// State value V (seedlen bytes).
    v: Vec<u8>,
    /// Constant C (seedlen bytes).
    c: Vec<u8>,
    seed_len: usize,
    state: ReseedState,
}

impl Drop for HashDrbg {
    fn drop(&mut self) {
        self.v.zeroize();
        self.c.zeroize();
    }
}

impl HashDrbg {
    /// Instantiate a Hash-DRBG (SP 800-90A §10.1.1.2).
    ///
    /// In the GM dialect the entropy must be at least one hash output long
    /// and the nonce at least half of that.
    pub fn new(
        alg: HashAlgId,
        config: DrbgConfig,
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        let hash_size = alg.output_size();
        let (min_entropy, min_nonce) = if config.is_gm() {
            (hash_size, hash_size / 2)
        } else {
            (0, 0)
        };
        check_entropy(entropy, min_entropy)?;
        check_nonce(nonce, min_nonce)?;
        check_personalization(personalization)?;

        let seed_len = seed_len(alg);
        let v = hash_df(alg, &[entropy, nonce, personalization], seed_len)?;
        let c = hash_df(alg, &[&[0x00], &v], seed_len)?;

        log::debug!(
            "hash-drbg: instantiated ({:?}, {:?}, {:?}, seedlen {})",
            alg,
            config.dialect,
            config.security_level,
            seed_len
        );
        Ok(Self {
            alg,
            v,
            c,
            seed_len,
            state: ReseedState::new(config),
        })
    }

    /// NIST SP 800-90A Hash-DRBG over `alg`.
    pub fn nist(
        alg: HashAlgId,
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        Self::new(alg, DrbgConfig::nist(), entropy, nonce, personalization)
    }

    /// GM/T 0105 Hash-DRBG over SM3.
    pub fn gm(
        level: SecurityLevel,
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        Self::new(
            HashAlgId::Sm3,
            DrbgConfig::gm(level),
            entropy,
            nonce,
            personalization,
        )
    }

    pub fn algorithm(&self) -> HashAlgId {
        self.alg
    }

    pub fn config(&self) -> DrbgConfig {
        self.state.config()
    }

    fn hash(&self, parts: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
        digest_parts(self.alg, parts)
    }

    /// Hashgen (SP 800-90A §10.1.1.4): H(V) || H(V+1) || ...
    fn hashgen(&self, output: &mut [u8]) -> Result<(), CryptoError> {
        let mut data = self.v.clone();
        for chunk in output.chunks_mut(self.alg.output_size()) {
            let digest = self.hash(&[&data])?;
            chunk.copy_from_slice(&digest[..chunk.len()]);
            add_be(&mut data, &[0x01]);
        }
        data.zeroize();
        Ok(())
    }
}

impl Drbg for HashDrbg {
    /// Reseed (SP 800-90A §10.1.1.3). The GM dialect hashes
    /// `0x01 || entropy || V || additional`.
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

        let v = if self.state.is_gm() {
            hash_df(self.alg, &[&[0x01], entropy, &self.v, additional], self.seed_len)?
        } else {
            hash_df(self.alg, &[&[0x01], &self.v, entropy, additional], self.seed_len)?
        };
        let c = hash_df(self.alg, &[&[0x00], &v], self.seed_len)?;
        self.v.zeroize();
        self.c.zeroize();
        self.v = v;
        self.c = c;
        self.state.reseeded();
        log::debug!("hash-drbg: reseeded");
        Ok(())
    }

    fn needs_reseed(&self) -> bool {
        self.state.needs_reseed()
    }

    fn generate(&mut self, out: &mut [u8], additional: Option<&[u8]>) -> Result<(), CryptoError> {
        let additional = additional.unwrap_or_default();
        self.state
            .check_generate(out.len(), self.max_bytes_per_request(), additional)?;
        log::trace!("hash-drbg: generate {} bytes", out.len());

        if !additional.is_empty() {
            // V = (V + Hash(0x02 || V || additional)) mod 2^seedlen
            let w = self.hash(&[&[0x02], &self.v, additional])?;
            add_be(&mut self.v, &w);
        }

        if self.state.is_gm() {
            let digest = self.hash(&[&self.v])?;
            out.copy_from_slice(&digest[..out.len()]);
        } else {
            self.hashgen(out)?;
        }

        // V = (V + Hash(0x03 || V) + C + reseed_counter) mod 2^seedlen
        let h = self.hash(&[&[0x03], &self.v])?;
        add_be(&mut self.v, &h);
        add_be(&mut self.v, &self.c);
        add_be(&mut self.v, &self.state.counter().to_be_bytes());
        self.state.advance();
        Ok(())
    }

    fn max_bytes_per_request(&self) -> usize {
        self.state
            .config()
            .max_bytes_per_request(self.alg.output_size())
    }

    fn destroy(&mut self) {
        // Wipe in place; the lengths stay so the wipe can be observed.
        self.v.as_mut_slice().zeroize();
        self.c.as_mut_slice().zeroize();
        self.state.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmsym_types::DrbgDialect;

    fn hex_to_bytes(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    fn entropy() -> Vec<u8> {
        (0u8..32).collect()
    }

    fn nonce() -> Vec<u8> {
        (0x40u8..0x50).collect()
    }

    fn reseed_entropy() -> Vec<u8> {
        (0x80u8..0xa0).collect()
    }

    const PERS: &[u8] = b"gmsym personalization";

    #[test]
    fn test_hash_drbg_sha256_cavs() {
        // SP 800-90A CAVS, Hash_DRBG SHA-256, no reseed, no additional input
        let ent = hex_to_bytes("a65ad0f345db4e0effe875c3a2e71f42c7129d620ff5c119a9ef55f05185e0fb");
        let nonce = hex_to_bytes("8581f9317517276e06e9607ddbcbcc2e");
        let mut drbg = HashDrbg::nist(HashAlgId::Sha256, &ent, &nonce, &[]).unwrap();
        let mut out = [0u8; 128];
        drbg.generate(&mut out, None).unwrap();
        drbg.generate(&mut out, None).unwrap();
        assert_eq!(
            hex::encode(out),
            "d3e160c35b99f340b2628264d1751060e0045da383ff57a57d73a673d2b8d80d\
             aaf6a6c35a91bb4579d73fd0c8fed111b0391306828adfed528f018121b3febd\
             c343e797b87dbb63db1333ded9d1ece177cfa6b71fe8ab1da46624ed6415e51c\
             cde2c7ca86e283990eeaeb91120415528b2295910281b02dd431f4c9f70427df"
        );
    }

    #[test]
    fn test_hash_drbg_gm_sm3() {
        let mut drbg = HashDrbg::gm(SecurityLevel::One, &entropy(), &nonce(), PERS).unwrap();
        assert_eq!(drbg.max_bytes_per_request(), 32);

        let mut out = [0u8; 32];
        drbg.generate(&mut out, None).unwrap();
        assert_eq!(
            hex::encode(out),
            "f00f26180383d0a88f3aff5b4e07a04cfac4def5fc31e62a94973df6af845047"
        );

        let mut out = [0u8; 20];
        drbg.generate(&mut out, Some(b"extra")).unwrap();
        assert_eq!(hex::encode(out), "99e15154913849d5af88338071f551b6d6debc20");

        drbg.reseed(&reseed_entropy(), Some(b"reseed add")).unwrap();
        let mut out = [0u8; 32];
        drbg.generate(&mut out, None).unwrap();
        assert_eq!(
            hex::encode(out),
            "ecb902e3fbfac8bc8eb8ef3ce3b48064afff51da3e620a5dff01ac1e2a332811"
        );
    }

    #[test]
    fn test_hash_drbg_nist_sm3() {
        let mut drbg = HashDrbg::nist(HashAlgId::Sm3, &entropy(), &nonce(), PERS).unwrap();
        let mut out = [0u8; 100];
        drbg.generate(&mut out, None).unwrap();
        // The first block agrees with the GM dialect; later blocks come from V+1, V+2.
        assert_eq!(
            hex::encode(out),
            "f00f26180383d0a88f3aff5b4e07a04cfac4def5fc31e62a94973df6af845047\
             8a1b582dc5848826951e51af02282763908155221bb7ce09e2c6c300e65776b3\
             8ce4ca7377a6795b2edc640feffc14c57c004ecf7c09bb0c1a8f0441c1e50b21\
             35fc38fe"
        );

        drbg.reseed(&reseed_entropy(), Some(b"reseed add")).unwrap();
        let mut out = [0u8; 40];
        drbg.generate(&mut out, Some(b"extra")).unwrap();
        assert_eq!(
            hex::encode(out),
            "ff92b0002be0412c60ef3b9e86403cdc898b1a200a85e468cebccf46c501f05bd88e715ee21713ce"
        );
    }

    #[test]
    fn test_hash_drbg_sha512_seedlen() {
        let mut drbg = HashDrbg::nist(HashAlgId::Sha512, &entropy(), &nonce(), &[]).unwrap();
        assert_eq!(drbg.seed_len, 111);
        let mut out = [0u8; 80];
        drbg.generate(&mut out, None).unwrap();
        assert_eq!(
            hex::encode(out),
            "ceb73f9892bda65394f0a1852a037621ed7029a0d680ea3c3efaf59f4623823f\
             4a7e69a0f258bdbebb02d66d00c88b7d68d15091825519eee073df476d15adfb\
             bafd8e0dcc70299bb875fdb8dea0be37"
        );
    }

    #[test]
    fn test_hash_drbg_successive_outputs_differ() {
        let mut drbg = HashDrbg::nist(HashAlgId::Sha384, &entropy(), &nonce(), &[]).unwrap();
        let mut a = [0u8; 16];
        let mut b = [0u8; 16];
        drbg.generate(&mut a, None).unwrap();
        drbg.generate(&mut b, None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_drbg_gm_input_lengths() {
        assert!(matches!(
            HashDrbg::gm(SecurityLevel::One, &[0u8; 31], &nonce(), &[]),
            Err(CryptoError::DrbgInvalidEntropyLength)
        ));
        assert!(matches!(
            HashDrbg::gm(SecurityLevel::One, &entropy(), &[0u8; 15], &[]),
            Err(CryptoError::DrbgInvalidNonceLength)
        ));
        assert!(matches!(
            HashDrbg::nist(HashAlgId::Sha256, &[], &nonce(), &[]),
            Err(CryptoError::DrbgInvalidEntropyLength)
        ));
        // NIST dialect has no minimum beyond non-empty
        assert!(HashDrbg::nist(HashAlgId::Sha256, &[1], &[2], &[]).is_ok());

        let mut drbg = HashDrbg::gm(SecurityLevel::One, &entropy(), &nonce(), &[]).unwrap();
        assert_eq!(
            drbg.reseed(&[0u8; 16], None),
            Err(CryptoError::DrbgInvalidEntropyLength)
        );
    }

    #[test]
    fn test_hash_drbg_gm_request_cap() {
        let mut drbg = HashDrbg::gm(SecurityLevel::Two, &entropy(), &nonce(), &[]).unwrap();
        let mut out = [0u8; 33];
        assert_eq!(
            drbg.generate(&mut out, None),
            Err(CryptoError::DrbgRequestTooLarge { max: 32, got: 33 })
        );
        assert_eq!(out, [0u8; 33]);
    }

    #[test]
    fn test_hash_drbg_reseed_required() {
        let config = DrbgConfig {
            dialect: DrbgDialect::Nist,
            security_level: SecurityLevel::Test,
        };
        let mut drbg =
            HashDrbg::new(HashAlgId::Sha256, config, &entropy(), &nonce(), &[]).unwrap();
        let mut out = [0u8; 16];
        for _ in 0..8 {
            drbg.generate(&mut out, None).unwrap();
        }
        assert!(drbg.needs_reseed());
        let mut untouched = [0x5au8; 16];
        assert_eq!(
            drbg.generate(&mut untouched, None),
            Err(CryptoError::DrbgReseedRequired)
        );
        assert_eq!(untouched, [0x5au8; 16]);

        drbg.reseed(&reseed_entropy(), None).unwrap();
        assert!(!drbg.needs_reseed());
        drbg.generate(&mut out, None).unwrap();
    }

    #[test]
    fn test_hash_drbg_destroy() {
        let mut drbg = HashDrbg::nist(HashAlgId::Sm3, &entropy(), &nonce(), &[]).unwrap();
        drbg.destroy();
        assert!(drbg.needs_reseed());
        let mut out = [0u8; 8];
        assert_eq!(
            drbg.generate(&mut out, None),
            Err(CryptoError::DrbgInvalidState)
        );
        assert_eq!(
            drbg.reseed(&reseed_entropy(), None),
            Err(CryptoError::DrbgInvalidState)
        );
    }

    #[test]
    fn test_hash_drbg_destroy_wipes_state() {
        let mut drbg = HashDrbg::nist(HashAlgId::Sha256, &entropy(), &nonce(), &[]).unwrap();
        assert!(drbg.v.iter().any(|&b| b != 0));
        assert!(drbg.c.iter().any(|&b| b != 0));
        drbg.destroy();
        assert_eq!(drbg.v.len(), 55);
        assert_eq!(drbg.c.len(), 55);
        assert!(drbg.v.iter().all(|&b| b == 0));
        assert!(drbg.c.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_hash_df_length() {
        let out = hash_df(HashAlgId::Sha256, &[b"abc"], 55).unwrap();
        assert_eq!(out.len(), 55);
        let split = hash_df(HashAlgId::Sha256, &[b"a", b"bc"], 55).unwrap();
        assert_eq!(out, split);
    }
}
