//! Trait-based provider mechanism for the symmetric core.
//!
//! Block ciphers sit at the bottom; modes of operation are generic over
//! [`BlockCipher`] and expose [`BlockMode`], [`StreamMode`], [`Aead`] or
//! [`LengthPreservingMode`] upward. DRBGs implement [`Drbg`] and pull fresh
//! entropy through an [`EntropySource`].
//!
//! Every mode in this crate requires `block_size() == 16`.

use gmsym_types::CryptoError;

/// A hash / message digest algorithm.
pub trait Digest: Send + Sync {
    /// The output size in bytes.
    fn output_size(&self) -> usize;

    /// The internal block size in bytes.
    fn block_size(&self) -> usize;

    /// Feed data into the hash state.
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;

    /// Finalize the hash and write the digest to `out`.
    /// The length of `out` must be at least `output_size()`.
    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError>;

    /// Reset the hash state to process a new message.
    fn reset(&mut self);
}

/// A block cipher (e.g., AES, SM4) with a frozen key schedule.
///
/// `encrypt` and `decrypt` take `&self`, so a keyed cipher can be shared by
/// any number of readers.
pub trait BlockCipher: Send + Sync {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Encrypt the first block of `src` into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `src` or `dst` is shorter than one block.
    fn encrypt(&self, dst: &mut [u8], src: &[u8]);

    /// Decrypt the first block of `src` into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `src` or `dst` is shorter than one block.
    fn decrypt(&self, dst: &mut [u8], src: &[u8]);

    /// Encrypt a single 16-byte block in place.
    fn encrypt_in_place(&self, block: &mut [u8]) {
        let mut tmp = [0u8; 16];
        tmp.copy_from_slice(&block[..16]);
        self.encrypt(block, &tmp);
    }

    /// Decrypt a single 16-byte block in place.
    fn decrypt_in_place(&self, block: &mut [u8]) {
        let mut tmp = [0u8; 16];
        tmp.copy_from_slice(&block[..16]);
        self.decrypt(block, &tmp);
    }
}

impl<C: BlockCipher + ?Sized> BlockCipher for &C {
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn encrypt(&self, dst: &mut [u8], src: &[u8]) {
        (**self).encrypt(dst, src)
    }

    fn decrypt(&self, dst: &mut [u8], src: &[u8]) {
        (**self).decrypt(dst, src)
    }
}

/// Optional multi-block capability of a [`BlockCipher`].
///
/// Modes that can use it offer a `new_with_batch` constructor next to `new`.
pub trait BlockCipherBatch: BlockCipher {
    /// Number of blocks processed per batch call (a power of two).
    fn concurrency(&self) -> usize;

    /// Encrypt `concurrency()` contiguous blocks of `src` into `dst`.
    fn encrypt_blocks(&self, dst: &mut [u8], src: &[u8]);

    /// Decrypt `concurrency()` contiguous blocks of `src` into `dst`.
    fn decrypt_blocks(&self, dst: &mut [u8], src: &[u8]);
}

impl<C: BlockCipherBatch + ?Sized> BlockCipherBatch for &C {
    fn concurrency(&self) -> usize {
        (**self).concurrency()
    }

    fn encrypt_blocks(&self, dst: &mut [u8], src: &[u8]) {
        (**self).encrypt_blocks(dst, src)
    }

    fn decrypt_blocks(&self, dst: &mut [u8], src: &[u8]) {
        (**self).decrypt_blocks(dst, src)
    }
}

/// Builds a keyed block cipher from raw key bytes.
///
/// Implemented for every `Fn(&[u8]) -> Result<C, CryptoError>`, so
/// constructors such as `Sm4Key::new` can be passed directly.
pub trait CipherFactory {
    type Cipher: BlockCipher;

    /// Create a cipher keyed with `key`.
    fn new_cipher(&self, key: &[u8]) -> Result<Self::Cipher, CryptoError>;
}

impl<F, C> CipherFactory for F
where
    F: Fn(&[u8]) -> Result<C, CryptoError>,
    C: BlockCipher,
{
    type Cipher = C;

    fn new_cipher(&self, key: &[u8]) -> Result<C, CryptoError> {
        self(key)
    }
}

/// A block-aligned mode (ECB, CBC, BC, OFBNLF, XTS).
pub trait BlockMode {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Encrypt or decrypt whole blocks of `src` into `dst`.
    ///
    /// Successive calls continue the chaining state, so processing a
    /// message in several pieces gives the same output as one call.
    fn crypt_blocks(&mut self, dst: &mut [u8], src: &[u8]);
}

/// Modes whose running IV can be replaced.
pub trait SetIv {
    /// Reset the chaining state to `iv`.
    ///
    /// # Panics
    ///
    /// Panics if `iv` is not one block long.
    fn set_iv(&mut self, iv: &[u8]);
}

/// A keystream generator (a stream cipher, or a block cipher in CFB/OFB/CTR).
pub trait StreamCipher {
    /// XOR the next `src.len()` keystream bytes with `src` into `dst`.
    fn xor_keystream(&mut self, dst: &mut [u8], src: &[u8]);
}

/// A [`StreamCipher`] built from a block cipher.
pub trait StreamMode: StreamCipher {
    /// Block size of the underlying cipher.
    fn block_size(&self) -> usize;
}

/// A stream mode that can produce keystream at an arbitrary byte offset.
pub trait SeekableStreamMode: StreamMode {
    /// XOR the keystream starting `offset` bytes after the IV with `src`.
    /// The running position used by `xor_keystream` is left untouched.
    fn xor_keystream_at(&self, dst: &mut [u8], src: &[u8], offset: u64);
}

/// Builds a keyed, nonced stream cipher (used by MUR).
///
/// Implemented for every `Fn(&[u8], &[u8]) -> Result<S, CryptoError>`
/// taking `(key, iv)`.
pub trait StreamCipherFactory {
    type Stream: StreamCipher;

    /// Create a stream cipher for `key` and `iv`.
    fn new_stream(&self, key: &[u8], iv: &[u8]) -> Result<Self::Stream, CryptoError>;
}

impl<F, S> StreamCipherFactory for F
where
    F: Fn(&[u8], &[u8]) -> Result<S, CryptoError>,
    S: StreamCipher,
{
    type Stream = S;

    fn new_stream(&self, key: &[u8], iv: &[u8]) -> Result<S, CryptoError> {
        self(key, iv)
    }
}

/// An Authenticated Encryption with Associated Data (AEAD) algorithm.
pub trait Aead {
    /// The expected nonce size in bytes.
    fn nonce_size(&self) -> usize;

    /// The length of the authentication tag in bytes.
    fn tag_size(&self) -> usize;

    /// Maximum difference between ciphertext and plaintext length.
    fn overhead(&self) -> usize {
        self.tag_size()
    }

    /// Encrypt and authenticate `plaintext`, writing `ciphertext || tag`
    /// to the front of `dst` and returning that slice.
    ///
    /// # Panics
    ///
    /// Panics if the nonce length is wrong, if `dst` is shorter than
    /// `plaintext.len() + overhead()`, or if `plaintext` exceeds the mode's
    /// length limit.
    fn seal<'a>(&self, dst: &'a mut [u8], nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> &'a [u8];

    /// Verify and decrypt `ciphertext || tag` into `dst`.
    ///
    /// On tag mismatch `dst[..ciphertext.len() - tag_size()]` is zeroed and
    /// [`CryptoError::AeadTagVerifyFail`] is returned.
    ///
    /// # Panics
    ///
    /// Panics if the nonce length is wrong or `dst` is too short.
    fn open<'a>(
        &self,
        dst: &'a mut [u8],
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<&'a [u8], CryptoError>;

    /// Allocating variant of [`seal`](Aead::seal).
    fn encrypt(&self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; plaintext.len() + self.overhead()];
        self.seal(&mut out, nonce, plaintext, aad);
        out
    }

    /// Allocating variant of [`open`](Aead::open).
    fn decrypt(&self, nonce: &[u8], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < self.tag_size() {
            return Err(CryptoError::AeadTagVerifyFail);
        }
        let mut out = vec![0u8; ciphertext.len() - self.tag_size()];
        self.open(&mut out, nonce, ciphertext, aad)?;
        Ok(out)
    }
}

/// A tweakable wide-block cipher whose output length equals its input length.
pub trait LengthPreservingMode {
    /// Encrypt `src` (at least 16 bytes) into `dst`.
    fn encrypt(&self, dst: &mut [u8], src: &[u8]);

    /// Decrypt `src` (at least 16 bytes) into `dst`.
    fn decrypt(&self, dst: &mut [u8], src: &[u8]);
}

/// A deterministic random bit generator (NIST SP 800-90A / GM/T 0105-2021).
///
/// Instantiation is performed by each variant's constructor.
pub trait Drbg {
    /// Mix fresh entropy (and optional additional input) into the state.
    fn reseed(&mut self, entropy: &[u8], additional: Option<&[u8]>) -> Result<(), CryptoError>;

    /// Whether the reseed counter or (GM only) reseed time limit is exceeded.
    fn needs_reseed(&self) -> bool;

    /// Fill `out` with pseudorandom bytes.
    ///
    /// Returns [`CryptoError::DrbgReseedRequired`] without touching `out`
    /// when [`needs_reseed`](Drbg::needs_reseed) is true.
    fn generate(&mut self, out: &mut [u8], additional: Option<&[u8]>) -> Result<(), CryptoError>;

    /// Largest `out.len()` accepted by a single `generate` call.
    fn max_bytes_per_request(&self) -> usize;

    /// Wipe the internal state. Every later call fails with
    /// [`CryptoError::DrbgInvalidState`].
    fn destroy(&mut self);
}

/// A source of full-entropy bytes for seeding DRBGs.
pub trait EntropySource {
    /// Fill `buf` completely with entropy.
    fn fill_entropy(&mut self, buf: &mut [u8]) -> Result<(), CryptoError>;
}
