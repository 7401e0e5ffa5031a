//! CTR-DRBG (Counter-mode Deterministic Random Bit Generator).
//!
//! Implements NIST SP 800-90A Section 10.2 with the Block_Cipher_df
//! derivation function over any 16-byte block cipher, and the GM/T 0105
//! variant (SM4, one block per request, stricter seed lengths).

use super::{
    add_be, check_additional, check_entropy, check_nonce, check_personalization, DrbgConfig,
    ReseedState,
};
use crate::provider::{BlockCipher, CipherFactory, Drbg};
use crate::util::xor_in_place;
use gmsym_types::CryptoError;
use zeroize::Zeroize;

#[cfg(feature = "sm4")]
use crate::sm4::Sm4Key;
#[cfg(feature = "sm4")]
use gmsym_types::SecurityLevel;

const BLOCK_LEN: usize = 16;
/// GM dialect minimum entropy length.
const GM_MIN_ENTROPY: usize = 32;
/// GM dialect minimum nonce length.
const GM_MIN_NONCE: usize = 16;

/// Factory used by [`CtrDrbg::gm`].
#[cfg(feature = "sm4")]
pub type Sm4Factory = fn(&[u8]) -> Result<Sm4Key, CryptoError>;

/// CTR-DRBG context. `F` re-keys the cipher on every update.
pub struct CtrDrbg<F: CipherFactory> {
    factory: F,
    cipher: F::Cipher,
    /// Current key K (key_len bytes).
    key: Vec<u8>,
    /// Counter block V.
    v: [u8; BLOCK_LEN],
    key_len: usize,
    state: ReseedState,
}

impl<F: CipherFactory> Drop for CtrDrbg<F> {
    fn drop(&mut self) {
        self.key.zeroize();
        self.v.zeroize();
    }
}

/// BCC chaining step: `chain = E(chain ^ block)`.
fn bcc_block<C: BlockCipher>(cipher: &C, chain: &mut [u8; BLOCK_LEN], block: &[u8]) {
    xor_in_place(chain, block);
    cipher.encrypt_in_place(chain);
}

impl<F: CipherFactory> CtrDrbg<F> {
    /// Instantiate a CTR-DRBG with derivation function (SP 800-90A §10.2.1.3.2).
    ///
    /// `key_len` is the cipher key length; the seed length is
    /// `key_len + 16`. Fails with [`CryptoError::InvalidArg`] if the cipher's
    /// block size is not 16, or with the factory's error if it rejects a
    /// `key_len`-byte key.
    pub fn new(
        factory: F,
        key_len: usize,
        config: DrbgConfig,
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        let (min_entropy, min_nonce) = if config.is_gm() {
            (GM_MIN_ENTROPY, GM_MIN_NONCE)
        } else {
            (0, 0)
        };
        check_entropy(entropy, min_entropy)?;
        check_nonce(nonce, min_nonce)?;
        check_personalization(personalization)?;

        let key = vec![0u8; key_len];
        let cipher = factory.new_cipher(&key)?;
        if cipher.block_size() != BLOCK_LEN {
            return Err(CryptoError::InvalidArg);
        }
        let mut drbg = Self {
            factory,
            cipher,
            key,
            v: [0u8; BLOCK_LEN],
            key_len,
            state: ReseedState::new(config),
        };
        let mut seed = drbg.derive(&[entropy, nonce, personalization])?;
        let updated = drbg.update(&seed);
        seed.zeroize();
        updated?;

        log::debug!(
            "ctr-drbg: instantiated ({:?}, {:?}, seedlen {})",
            config.dialect,
            config.security_level,
            drbg.seed_len()
        );
        Ok(drbg)
    }

    /// NIST SP 800-90A CTR-DRBG.
    pub fn nist(
        factory: F,
        key_len: usize,
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        Self::new(
            factory,
            key_len,
            DrbgConfig::nist(),
            entropy,
            nonce,
            personalization,
        )
    }

    pub fn config(&self) -> DrbgConfig {
        self.state.config()
    }

    fn seed_len(&self) -> usize {
        self.key_len + BLOCK_LEN
    }

    /// Block_Cipher_df (SP 800-90A §10.3.2), producing seedlen bytes from
    /// the concatenation of `input`.
    fn derive(&self, input: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
        let seed_len = self.seed_len();
        let input_len: usize = input.iter().map(|p| p.len()).sum();

        // S = L || N || input_string || 0x80, zero-padded to a block multiple
        let mut s = Vec::with_capacity(8 + input_len + BLOCK_LEN);
        s.extend_from_slice(&(input_len as u32).to_be_bytes());
        s.extend_from_slice(&(seed_len as u32).to_be_bytes());
        for part in input {
            s.extend_from_slice(part);
        }
        s.push(0x80);
        s.resize(s.len().div_ceil(BLOCK_LEN) * BLOCK_LEN, 0);

        let bcc_key: Vec<u8> = (0..self.key_len).map(|i| i as u8).collect();
        let bcc_cipher = self.factory.new_cipher(&bcc_key)?;
        let mut temp = Vec::with_capacity(seed_len + BLOCK_LEN);
        let mut i: u32 = 0;
        while temp.len() < seed_len {
            let mut iv = [0u8; BLOCK_LEN];
            iv[..4].copy_from_slice(&i.to_be_bytes());
            let mut chain = [0u8; BLOCK_LEN];
            bcc_block(&bcc_cipher, &mut chain, &iv);
            for block in s.chunks(BLOCK_LEN) {
                bcc_block(&bcc_cipher, &mut chain, block);
            }
            temp.extend_from_slice(&chain);
            i += 1;
        }
        s.zeroize();

        let cipher = self.factory.new_cipher(&temp[..self.key_len]);
        let mut x = [0u8; BLOCK_LEN];
        x.copy_from_slice(&temp[self.key_len..seed_len]);
        temp.zeroize();
        let cipher = cipher?;

        let mut out = vec![0u8; seed_len];
        for chunk in out.chunks_mut(BLOCK_LEN) {
            cipher.encrypt_in_place(&mut x);
            chunk.copy_from_slice(&x[..chunk.len()]);
        }
        x.zeroize();
        Ok(out)
    }

    /// CTR_DRBG_Update (SP 800-90A §10.2.1.2). `provided` is empty or
    /// seedlen bytes.
    fn update(&mut self, provided: &[u8]) -> Result<(), CryptoError> {
        let mut temp = vec![0u8; self.seed_len()];
        for chunk in temp.chunks_mut(BLOCK_LEN) {
            add_be(&mut self.v, &[0x01]);
            let mut block = [0u8; BLOCK_LEN];
            self.cipher.encrypt(&mut block, &self.v);
            chunk.copy_from_slice(&block[..chunk.len()]);
        }
        xor_in_place(&mut temp, provided);

        self.key.zeroize();
        self.key = temp[..self.key_len].to_vec();
        self.v.copy_from_slice(&temp[self.key_len..]);
        temp.zeroize();
        self.cipher = self.factory.new_cipher(&self.key)?;
        Ok(())
    }
}

#[cfg(feature = "sm4")]
impl CtrDrbg<Sm4Factory> {
    /// GM/T 0105 CTR-DRBG over SM4.
    pub fn gm(
        level: SecurityLevel,
        entropy: &[u8],
        nonce: &[u8],
        personalization: &[u8],
    ) -> Result<Self, CryptoError> {
        Self::new(
            Sm4Key::new as Sm4Factory,
            16,
            DrbgConfig::gm(level),
            entropy,
            nonce,
            personalization,
        )
    }
}

impl<F: CipherFactory> Drbg for CtrDrbg<F> {
    fn reseed(&mut self, entropy: &[u8], additional: Option<&[u8]>) -> Result<(), CryptoError> {
        self.state.ensure_live()?;
        let min = if self.state.is_gm() { GM_MIN_ENTROPY } else { 0 };
        check_entropy(entropy, min)?;
        let additional = additional.unwrap_or_default();
        check_additional(additional)?;

        let mut seed = self.derive(&[entropy, additional])?;
        let updated = self.update(&seed);
        seed.zeroize();
        updated?;
        self.state.reseeded();
        log::debug!("ctr-drbg: reseeded");
        Ok(())
    }

    fn needs_reseed(&self) -> bool {
        self.state.needs_reseed()
    }

    fn generate(&mut self, out: &mut [u8], additional: Option<&[u8]>) -> Result<(), CryptoError> {
        let additional = additional.unwrap_or_default();
        self.state
            .check_generate(out.len(), self.max_bytes_per_request(), additional)?;
        log::trace!("ctr-drbg: generate {} bytes", out.len());

        let mut provided = Vec::new();
        if !additional.is_empty() {
            provided = self.derive(&[additional])?;
            self.update(&provided)?;
        }
        for chunk in out.chunks_mut(BLOCK_LEN) {
            add_be(&mut self.v, &[0x01]);
            let mut block = [0u8; BLOCK_LEN];
            self.cipher.encrypt(&mut block, &self.v);
            chunk.copy_from_slice(&block[..chunk.len()]);
            block.zeroize();
        }
        let updated = self.update(&provided);
        provided.zeroize();
        updated?;
        self.state.advance();
        Ok(())
    }

    fn max_bytes_per_request(&self) -> usize {
        self.state.config().max_bytes_per_request(BLOCK_LEN)
    }

    fn destroy(&mut self) {
        self.key.as_mut_slice().zeroize();
        self.v.zeroize();
        // Drop the keyed schedule in favour of one under the all-zero key.
        if let Ok(cipher) = self.factory.new_cipher(&self.key) {
            self.cipher = cipher;
        }
        self.state.destroy();
    }
}
