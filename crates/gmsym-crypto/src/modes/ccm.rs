//! CCM (Counter with CBC-MAC) authenticated encryption.
//!
//! Implements CCM mode as defined in NIST SP 800-38C and RFC 3610 over any
//! 16-byte block cipher.

use super::{assert_block_size, BLOCK_SIZE};
use crate::provider::{Aead, BlockCipher};
use crate::util::{check_buffers, ct_eq, xor_bytes, xor_in_place};
use gmsym_types::CryptoError;
use zeroize::Zeroize;

/// Default nonce size (L = 3).
pub const CCM_NONCE_SIZE: usize = 12;
/// Default tag size.
pub const CCM_TAG_SIZE: usize = 16;

/// CCM over a keyed block cipher.
pub struct Ccm<C> {
    cipher: C,
    nonce_size: usize,
    tag_size: usize,
}

/// Running CBC-MAC over an unaligned byte stream.
struct CbcMac<'a, C> {
    cipher: &'a C,
    x: [u8; BLOCK_SIZE],
    pos: usize,
}

impl<'a, C: BlockCipher> CbcMac<'a, C> {
    fn new(cipher: &'a C, b0: &[u8; BLOCK_SIZE]) -> Self {
        let mut x = [0u8; BLOCK_SIZE];
        cipher.encrypt(&mut x, b0);
        Self { cipher, x, pos: 0 }
    }

    fn update(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let n = (BLOCK_SIZE - self.pos).min(data.len());
            xor_in_place(&mut self.x[self.pos..self.pos + n], &data[..n]);
            self.pos += n;
            data = &data[n..];
            if self.pos == BLOCK_SIZE {
                self.cipher.encrypt_in_place(&mut self.x);
                self.pos = 0;
            }
        }
    }

    /// Zero-pad to a block boundary.
    fn pad(&mut self) {
        if self.pos > 0 {
            self.cipher.encrypt_in_place(&mut self.x);
            self.pos = 0;
        }
    }
}

impl<C> Drop for CbcMac<'_, C> {
    fn drop(&mut self) {
        self.x.zeroize();
    }
}

/// Length prefix for non-empty AAD (RFC 3610 §2.2): 2, 6 or 10 bytes.
fn aad_length_header(n: u64) -> ([u8; 10], usize) {
    let mut header = [0u8; 10];
    if n < 0xff00 {
        header[..2].copy_from_slice(&(n as u16).to_be_bytes());
        (header, 2)
    } else if n <= u64::from(u32::MAX) {
        header[..2].copy_from_slice(&[0xff, 0xfe]);
        header[2..6].copy_from_slice(&(n as u32).to_be_bytes());
        (header, 6)
    } else {
        header[..2].copy_from_slice(&[0xff, 0xff]);
        header[2..].copy_from_slice(&n.to_be_bytes());
        (header, 10)
    }
}

impl<C: BlockCipher> Ccm<C> {
    /// CCM with a 12-byte nonce and a 16-byte tag.
    ///
    /// # Panics
    ///
    /// Panics if the cipher's block size is not 16.
    pub fn new(cipher: C) -> Self {
        assert_block_size("ccm", &cipher);
        Self {
            cipher,
            nonce_size: CCM_NONCE_SIZE,
            tag_size: CCM_TAG_SIZE,
        }
    }

    /// CCM with a 7..=13 byte nonce and an even tag of 4..=16 bytes.
    pub fn with_nonce_and_tag_size(
        cipher: C,
        nonce_size: usize,
        tag_size: usize,
    ) -> Result<Self, CryptoError> {
        if !(7..=13).contains(&nonce_size) {
            return Err(CryptoError::InvalidNonceLength);
        }
        if !(4..=16).contains(&tag_size) || tag_size % 2 != 0 {
            return Err(CryptoError::InvalidTagLength);
        }
        assert_block_size("ccm", &cipher);
        Ok(Self {
            cipher,
            nonce_size,
            tag_size,
        })
    }

    /// Width of the length field.
    fn l(&self) -> usize {
        15 - self.nonce_size
    }

    /// Longest message: `2^(8L) - 1`, capped at `u32::MAX`.
    pub fn max_length(&self) -> u64 {
        let bits = 8 * self.l() as u32;
        if bits >= 32 {
            u64::from(u32::MAX)
        } else {
            (1u64 << bits) - 1
        }
    }

    /// Counter block A_i = `(L-1) || nonce || i`.
    fn counter_block(&self, nonce: &[u8], i: u64) -> [u8; BLOCK_SIZE] {
        let l = self.l();
        let mut a = [0u8; BLOCK_SIZE];
        a[0] = (l - 1) as u8;
        a[1..1 + self.nonce_size].copy_from_slice(nonce);
        let be = i.to_be_bytes();
        let width = l.min(8);
        a[BLOCK_SIZE - width..].copy_from_slice(&be[8 - width..]);
        a
    }

    fn counter_crypt(&self, dst: &mut [u8], src: &[u8], nonce: &[u8]) {
        let mut ks = [0u8; BLOCK_SIZE];
        for (i, (d, s)) in dst.chunks_mut(BLOCK_SIZE).zip(src.chunks(BLOCK_SIZE)).enumerate() {
            self.cipher.encrypt(&mut ks, &self.counter_block(nonce, i as u64 + 1));
            xor_bytes(d, s, &ks);
        }
        ks.zeroize();
    }

    /// Encrypted tag over `aad` and `plaintext`.
    fn auth(&self, nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> [u8; BLOCK_SIZE] {
        let l = self.l();
        let mut b0 = [0u8; BLOCK_SIZE];
        b0[0] = (if aad.is_empty() { 0 } else { 0x40 })
            | ((((self.tag_size - 2) / 2) as u8) << 3)
            | (l - 1) as u8;
        b0[1..1 + self.nonce_size].copy_from_slice(nonce);
        let q = (plaintext.len() as u64).to_be_bytes();
        let width = l.min(8);
        b0[BLOCK_SIZE - width..].copy_from_slice(&q[8 - width..]);

        let mut mac = CbcMac::new(&self.cipher, &b0);
        if !aad.is_empty() {
            let (header, len) = aad_length_header(aad.len() as u64);
            mac.update(&header[..len]);
            mac.update(aad);
            mac.pad();
        }
        mac.update(plaintext);
        mac.pad();

        let mut tag = [0u8; BLOCK_SIZE];
        self.cipher.encrypt(&mut tag, &self.counter_block(nonce, 0));
        xor_in_place(&mut tag, &mac.x);
        tag
    }

    fn check_nonce(&self, nonce: &[u8]) {
        if nonce.len() != self.nonce_size {
            panic!("ccm: incorrect nonce length given to CCM");
        }
    }
}

impl<C: BlockCipher> Aead for Ccm<C> {
    fn nonce_size(&self) -> usize {
        self.nonce_size
    }

    fn tag_size(&self) -> usize {
        self.tag_size
    }

    /// # Panics
    ///
    /// Panics if the nonce length is wrong, the plaintext exceeds
    /// [`max_length`](Ccm::max_length), or `dst` cannot hold ciphertext and
    /// tag.
    fn seal<'a>(&self, dst: &'a mut [u8], nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> &'a [u8] {
        self.check_nonce(nonce);
        if plaintext.len() as u64 > self.max_length() {
            panic!("ccm: plaintext too long for nonce size");
        }
        let out_len = plaintext.len() + self.tag_size;
        if dst.len() < out_len {
            panic!("ccm: output smaller than input");
        }
        check_buffers("ccm", dst, plaintext);

        let mut tag = self.auth(nonce, plaintext, aad);
        let (ct, tag_out) = dst[..out_len].split_at_mut(plaintext.len());
        self.counter_crypt(ct, plaintext, nonce);
        tag_out.copy_from_slice(&tag[..self.tag_size]);
        tag.zeroize();
        &dst[..out_len]
    }

    /// # Panics
    ///
    /// Panics if the nonce length is wrong or `dst` is shorter than the
    /// plaintext.
    fn open<'a>(
        &self,
        dst: &'a mut [u8],
        nonce: &[u8],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<&'a [u8], CryptoError> {
        self.check_nonce(nonce);
        if ciphertext.len() < self.tag_size {
            return Err(CryptoError::AeadTagVerifyFail);
        }
        let (ct, tag) = ciphertext.split_at(ciphertext.len() - self.tag_size);
        if ct.len() as u64 > self.max_length() {
            return Err(CryptoError::InputOverflow);
        }
        check_buffers("ccm", dst, ct);

        let out = &mut dst[..ct.len()];
        self.counter_crypt(out, ct, nonce);
        let mut expected = self.auth(nonce, out, aad);
        let ok = ct_eq(&expected[..self.tag_size], tag);
        expected.zeroize();
        if !ok {
            out.fill(0);
            log::debug!("ccm: tag verification failed");
            return Err(CryptoError::AeadTagVerifyFail);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(feature = "aes")]
    use crate::aes::AesKey;
    #[cfg(feature = "sm4")]
    use crate::sm4::Sm4Key;

    fn hex_to_bytes(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    fn check(ccm: &impl Aead, nonce: &str, aad: &str, pt: &str, expected: &str) {
        let (nonce, aad, pt) = (hex_to_bytes(nonce), hex_to_bytes(aad), hex_to_bytes(pt));
        let sealed = ccm.encrypt(&nonce, &pt, &aad);
        assert_eq!(hex::encode(&sealed), expected);
        assert_eq!(ccm.decrypt(&nonce, &sealed, &aad).unwrap(), pt);
    }

    #[cfg(feature = "aes")]
    fn nist_ccm(nonce_size: usize, tag_size: usize) -> Ccm<AesKey> {
        let key = hex_to_bytes("404142434445464748494a4b4c4d4e4f");
        Ccm::with_nonce_and_tag_size(AesKey::new(&key).unwrap(), nonce_size, tag_size).unwrap()
    }

    // NIST SP 800-38C Examples 1-3
    #[cfg(feature = "aes")]
    #[test]
    fn test_ccm_nist_examples() {
        check(&nist_ccm(7, 4), "10111213141516", "0001020304050607", "20212223", "7162015b4dac255d");
        check(
            &nist_ccm(8, 6),
            "1011121314151617",
            "000102030405060708090a0b0c0d0e0f",
            "202122232425262728292a2b2c2d2e2f",
            "d2a1f0e051ea5f62081a7792073d593d1fc64fbfaccd",
        );
        check(
            &nist_ccm(12, 8),
            "101112131415161718191a1b",
            "000102030405060708090a0b0c0d0e0f10111213",
            "202122232425262728292a2b2c2d2e2f3031323334353637",
            "e3b201a9f5b71a7a9b1ceaeccd97e70b6176aad9a4428aa5484392fbc1b09951",
        );
    }

    // RFC 3610 Packet Vector #1
    #[cfg(feature = "aes")]
    #[test]
    fn test_ccm_rfc3610_packet1() {
        let key = hex_to_bytes("c0c1c2c3c4c5c6c7c8c9cacbcccdcecf");
        let ccm = Ccm::with_nonce_and_tag_size(AesKey::new(&key).unwrap(), 13, 8).unwrap();
        check(
            &ccm,
            "00000003020100a0a1a2a3a4a5",
            "0001020304050607",
            "08090a0b0c0d0e0f101112131415161718191a1b1c1d1e",
            "588c979a61c663d2f066d0c2c0f989806d5f6b61dac38417e8d12cfdf926e0",
        );
    }

    // RFC 8998 Appendix A.2: SM4-CCM
    #[cfg(feature = "sm4")]
    #[test]
    fn test_sm4_ccm_rfc8998() {
        let key = hex_to_bytes("0123456789abcdeffedcba9876543210");
        let ccm = Ccm::new(Sm4Key::new(&key).unwrap());
        let pt: String = ["aa", "bb", "cc", "dd", "ee", "ff", "ee", "aa"]
            .iter()
            .map(|b| b.repeat(8))
            .collect();
        check(
            &ccm,
            "00001234567800000000abcd",
            "feedfacedeadbeeffeedfacedeadbeefabaddad2",
            &pt,
            "48af93501fa62adbcd414cce6034d895dda1bf8f132f042098661572e7483094\
             fd12e518ce062c98acee28d95df4416bed31a2f04476c18bb40c84a74b97dc5b\
             16842d4fa186f56ab33256971fa110f4",
        );
    }

    #[cfg(feature = "sm4")]
    #[test]
    fn test_ccm_long_aad_header() {
        let ccm = Ccm::with_nonce_and_tag_size(Sm4Key::new(&[0u8; 16]).unwrap(), 7, 10).unwrap();
        let aad: Vec<u8> = (0..0x10000usize).map(|i| (i % 251) as u8).collect();
        let nonce: Vec<u8> = (0..7).collect();
        let sealed = ccm.encrypt(&nonce, b"long aad framing", &aad);
        assert_eq!(
            hex::encode(&sealed),
            "155ed27216ffa1b62980ae2d232b71b4d68a61212b1819676382"
        );
        assert_eq!(ccm.decrypt(&nonce, &sealed, &aad).unwrap(), b"long aad framing");
    }

    #[test]
    fn test_ccm_aad_length_header() {
        let header = |n: u64| {
            let (buf, len) = aad_length_header(n);
            hex::encode(&buf[..len])
        };
        assert_eq!(header(1), "0001");
        assert_eq!(header(0xfeff), "feff");
        assert_eq!(header(0xff00), "fffe0000ff00");
        assert_eq!(header(u64::from(u32::MAX)), "fffeffffffff");
        assert_eq!(header(u64::from(u32::MAX) + 1), "ffff0000000100000000");
    }

    #[cfg(feature = "sm4")]
    #[test]
    fn test_ccm_bad_parameters() {
        let c = || Sm4Key::new(&[0u8; 16]).unwrap();
        assert!(matches!(
            Ccm::with_nonce_and_tag_size(c(), 6, 16),
            Err(CryptoError::InvalidNonceLength)
        ));
        assert!(matches!(
            Ccm::with_nonce_and_tag_size(c(), 14, 16),
            Err(CryptoError::InvalidNonceLength)
        ));
        for tag in [2usize, 5, 15, 18] {
            assert!(matches!(
                Ccm::with_nonce_and_tag_size(c(), 12, tag),
                Err(CryptoError::InvalidTagLength)
            ));
        }
    }

    #[cfg(feature = "sm4")]
    #[test]
    fn test_ccm_auth_failure_zeroes_output() {
        let ccm = Ccm::new(Sm4Key::new(&[0x42u8; 16]).unwrap());
        let nonce = [0u8; 12];
        let mut sealed = ccm.encrypt(&nonce, b"secret message", b"authenticated data");
        sealed[0] ^= 0xff;
        let mut out = [0x55u8; 14];
        assert_eq!(
            ccm.open(&mut out, &nonce, &sealed, b"authenticated data"),
            Err(CryptoError::AeadTagVerifyFail)
        );
        assert_eq!(out, [0u8; 14]);
    }

    #[cfg(feature = "aes")]
    #[test]
    fn test_ccm_empty_plaintext() {
        let ccm = Ccm::with_nonce_and_tag_size(AesKey::new(&[0u8; 16]).unwrap(), 12, 8).unwrap();
        let nonce = [0u8; 12];
        let sealed = ccm.encrypt(&nonce, &[], b"aad");
        assert_eq!(sealed.len(), 8);
        assert!(ccm.decrypt(&nonce, &sealed, b"aad").unwrap().is_empty());
    }

    #[cfg(feature = "sm4")]
    #[test]
    fn test_ccm_length_limit() {
        let ccm = Ccm::with_nonce_and_tag_size(Sm4Key::new(&[1u8; 16]).unwrap(), 13, 4).unwrap();
        assert_eq!(ccm.max_length(), 0xffff);
        assert_eq!(Ccm::new(Sm4Key::new(&[1u8; 16]).unwrap()).max_length(), 0xff_ffff);
        let too_long = vec![0u8; 0x10000 + 4];
        let mut out = vec![0u8; 0x10000];
        assert_eq!(
            ccm.open(&mut out, &[0u8; 13], &too_long, &[]),
            Err(CryptoError::InputOverflow)
        );
    }

    #[cfg(feature = "sm4")]
    #[test]
    #[should_panic(expected = "ccm: plaintext too long")]
    fn test_ccm_seal_too_long_panics() {
        let ccm = Ccm::with_nonce_and_tag_size(Sm4Key::new(&[1u8; 16]).unwrap(), 13, 4).unwrap();
        ccm.encrypt(&[0u8; 13], &vec![0u8; 0x10000], &[]);
    }
}
