//! OFBNLF (Output Feedback with a Non-Linear Function), GB/T 17964-2021 §13.
//!
//! Each block gets a fresh key: `K_i = E(master, S)`, `C_i = E(K_i, P_i)`,
//! `S ← K_i`. Keying a cipher per block needs a [`CipherFactory`].

use super::{assert_block_size, check_block_input, iv_block, BLOCK_SIZE};
use crate::provider::{BlockCipher, BlockMode, CipherFactory, SetIv};
use gmsym_types::CryptoError;
use zeroize::Zeroize;

struct OfbNlfCore<F: CipherFactory> {
    factory: F,
    master: F::Cipher,
    /// Running state S; the next block key is E(master, S).
    iv: [u8; BLOCK_SIZE],
}

impl<F: CipherFactory> OfbNlfCore<F> {
    fn new(factory: F, key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        let master = factory.new_cipher(key)?;
        assert_block_size("ofbnlf", &master);
        if iv.len() != BLOCK_SIZE {
            return Err(CryptoError::InvalidIvLength);
        }
        Ok(Self {
            factory,
            master,
            iv: iv_block("ofbnlf", iv),
        })
    }

    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8], encrypt: bool) {
        check_block_input("ofbnlf", dst, src);
        let mut k = [0u8; BLOCK_SIZE];
        for (d, s) in dst.chunks_exact_mut(BLOCK_SIZE).zip(src.chunks_exact(BLOCK_SIZE)) {
            self.master.encrypt(&mut k, &self.iv);
            let cipher = match self.factory.new_cipher(&k) {
                Ok(c) => c,
                Err(e) => panic!("ofbnlf: cannot key block cipher: {e}"),
            };
            if encrypt {
                cipher.encrypt(d, s);
            } else {
                cipher.decrypt(d, s);
            }
            self.iv = k;
        }
        k.zeroize();
    }
}

impl<F: CipherFactory> Drop for OfbNlfCore<F> {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}

/// OFBNLF encryption.
pub struct OfbNlfEncrypter<F: CipherFactory> {
    core: OfbNlfCore<F>,
}

impl<F: CipherFactory> OfbNlfEncrypter<F> {
    /// Key the master cipher through `factory`.
    pub fn new(factory: F, key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            core: OfbNlfCore::new(factory, key, iv)?,
        })
    }
}

impl<F: CipherFactory> BlockMode for OfbNlfEncrypter<F> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// # Panics
    ///
    /// Panics on the usual buffer violations, or if the factory rejects a
    /// derived 16-byte block key.
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        self.core.crypt_blocks(dst, src, true);
    }
}

impl<F: CipherFactory> SetIv for OfbNlfEncrypter<F> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.core.iv = iv_block("ofbnlf", iv);
    }
}

/// OFBNLF decryption.
pub struct OfbNlfDecrypter<F: CipherFactory> {
    core: OfbNlfCore<F>,
}

impl<F: CipherFactory> OfbNlfDecrypter<F> {
    /// Key the master cipher through `factory`.
    pub fn new(factory: F, key: &[u8], iv: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            core: OfbNlfCore::new(factory, key, iv)?,
        })
    }
}

impl<F: CipherFactory> BlockMode for OfbNlfDecrypter<F> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// # Panics
    ///
    /// Panics on the usual buffer violations, or if the factory rejects a
    /// derived 16-byte block key.
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]) {
        self.core.crypt_blocks(dst, src, false);
    }
}

impl<F: CipherFactory> SetIv for OfbNlfDecrypter<F> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.core.iv = iv_block("ofbnlf", iv);
    }
}
