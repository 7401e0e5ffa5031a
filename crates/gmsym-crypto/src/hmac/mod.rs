//! HMAC (RFC 2104) over the hashes selectable by [`HashAlgId`].
//!
//! HMAC(K, m) = H((K' XOR opad) || H((K' XOR ipad) || m))
//!
//! where K' is the key padded/hashed to block size, ipad = 0x36, opad = 0x5c.
//! The HMAC-DRBG rekeys on every update, so construction is kept cheap.

use crate::hash::{new_digest, Digest};
use gmsym_types::{CryptoError, HashAlgId};
use zeroize::Zeroize;

const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Keyed HMAC context.
pub struct Hmac {
    alg: HashAlgId,
    inner: Box<dyn Digest>,
    outer: Box<dyn Digest>,
    /// Key padded (or hashed then padded) to the hash block size.
    key_block: Vec<u8>,
}

impl Hmac {
    /// Create an HMAC context over `alg` keyed with `key`.
    pub fn new(alg: HashAlgId, key: &[u8]) -> Result<Self, CryptoError> {
        let mut inner = new_digest(alg)?;
        let block_size = inner.block_size();

        let mut key_block = vec![0u8; block_size];
        if key.len() > block_size {
            inner.update(key)?;
            inner.finish(&mut key_block)?;
        } else {
            key_block[..key.len()].copy_from_slice(key);
        }

        let mut ctx = Self {
            alg,
            inner,
            outer: new_digest(alg)?,
            key_block,
        };
        ctx.load_pads()?;
        Ok(ctx)
    }

    fn load_pads(&mut self) -> Result<(), CryptoError> {
        self.inner.reset();
        self.outer.reset();
        let mut pad = self.key_block.clone();
        pad.iter_mut().for_each(|b| *b ^= IPAD);
        self.inner.update(&pad)?;
        pad.iter_mut().for_each(|b| *b ^= IPAD ^ OPAD);
        self.outer.update(&pad)?;
        pad.zeroize();
        Ok(())
    }

    /// The underlying hash.
    pub fn algorithm(&self) -> HashAlgId {
        self.alg
    }

    /// MAC length in bytes.
    pub fn output_size(&self) -> usize {
        self.alg.output_size()
    }

    /// Feed data into the HMAC computation.
    pub fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        self.inner.update(data)
    }

    /// Finalize into `out` (at least [`output_size`](Self::output_size) bytes)
    /// and re-arm the context for the same key.
    pub fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        let n = self.output_size();
        if out.len() < n {
            return Err(CryptoError::BufferTooSmall {
                need: n,
                got: out.len(),
            });
        }
        let mut inner_hash = [0u8; 64];
        self.inner.finish(&mut inner_hash[..n])?;
        self.outer.update(&inner_hash[..n])?;
        inner_hash.zeroize();
        self.outer.finish(out)?;
        self.load_pads()
    }

    /// Discard any buffered message and restart with the same key.
    pub fn reset(&mut self) -> Result<(), CryptoError> {
        self.load_pads()
    }

    /// One-shot HMAC of the concatenation of `parts`.
    pub fn mac_parts(alg: HashAlgId, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>, CryptoError> {
        let mut ctx = Self::new(alg, key)?;
        for part in parts {
            ctx.update(part)?;
        }
        let mut out = vec![0u8; ctx.output_size()];
        ctx.finish(&mut out)?;
        Ok(out)
    }

    /// One-shot HMAC computation.
    pub fn mac(alg: HashAlgId, key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Self::mac_parts(alg, key, &[data])
    }
}

impl Drop for Hmac {
    fn drop(&mut self) {
        self.key_block.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 4231 Test Case 1
    #[cfg(feature = "sha2")]
    #[test]
    fn test_hmac_sha256_case1() {
        let key = [0x0b; 20];
        let result = Hmac::mac(HashAlgId::Sha256, &key, b"Hi There").unwrap();
        assert_eq!(
            hex::encode(result),
            "b0344c61d8db38535ca8afceaf0bf12b881dc200c9833da726e9376c2e32cff7"
        );
    }

    // RFC 4231 Test Case 2
    #[cfg(all(feature = "sha2", feature = "sm3"))]
    #[test]
    fn test_hmac_case2_all_hashes() {
        let key = b"Jefe";
        let data = b"what do ya want for nothing?";
        let cases = [
            (
                HashAlgId::Sha256,
                "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843",
            ),
            (
                HashAlgId::Sha384,
                "af45d2e376484031617f78d2b58a6b1b9c7ef464f5a01b47e42ec3736322445e\
                 8e2240ca5e69e2c78b3239ecfab21649",
            ),
            (
                HashAlgId::Sha512,
                "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
                 9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737",
            ),
            (
                HashAlgId::Sm3,
                "2e87f1d16862e6d964b50a5200bf2b10b764faa9680a296a2405f24bec39f882",
            ),
        ];
        for (alg, expected) in cases {
            let result = Hmac::mac(alg, key, data).unwrap();
            assert_eq!(hex::encode(result), expected, "{alg:?}");
        }
    }

    // RFC 4231 Test Case 6 (key longer than block size)
    #[cfg(all(feature = "sha2", feature = "sm3"))]
    #[test]
    fn test_hmac_long_key() {
        let key = [0xaa; 131];
        let data = b"Test Using Larger Than Block-Size Key - Hash Key First";
        let result = Hmac::mac(HashAlgId::Sha256, &key, data).unwrap();
        assert_eq!(
            hex::encode(result),
            "60e431591ee0b67f0d8a26aacbf5b77f8e0bc6213728c5140546040f0ee37f54"
        );
        let result = Hmac::mac(HashAlgId::Sm3, &key, data).unwrap();
        assert_eq!(
            hex::encode(result),
            "b4fd844e13342002f0b2e0690ea7741f1497d993a70494cea601e657bedf67a0"
        );
    }

    #[cfg(feature = "sha2")]
    #[test]
    fn test_hmac_reuse_after_finish() {
        let mut ctx = Hmac::new(HashAlgId::Sha256, b"Jefe").unwrap();
        ctx.update(b"garbage").unwrap();
        ctx.reset().unwrap();
        ctx.update(b"what do ya want ").unwrap();
        ctx.update(b"for nothing?").unwrap();
        let mut out1 = [0u8; 32];
        ctx.finish(&mut out1).unwrap();

        ctx.update(b"what do ya want for nothing?").unwrap();
        let mut out2 = [0u8; 32];
        ctx.finish(&mut out2).unwrap();
        assert_eq!(out1, out2);
        assert_eq!(
            hex::encode(out1),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[cfg(feature = "sha2")]
    #[test]
    fn test_hmac_short_output() {
        let mut ctx = Hmac::new(HashAlgId::Sha256, b"k").unwrap();
        let mut out = [0u8; 16];
        assert_eq!(
            ctx.finish(&mut out),
            Err(CryptoError::BufferTooSmall { need: 32, got: 16 })
        );
    }
}
