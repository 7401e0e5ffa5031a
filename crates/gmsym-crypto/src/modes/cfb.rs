//! CFB (Cipher Feedback) mode of operation.
//!
//! Implements full-block CFB-128 as defined in NIST SP 800-38A §6.3,
//! byte-granular: partial blocks are buffered and successive calls continue
//! the stream.

use super::{assert_block_size, iv_block, BLOCK_SIZE};
use crate::provider::{BlockCipher, SetIv, StreamCipher, StreamMode};
use crate::util::{check_buffers, xor_bytes};
use zeroize::Zeroize;

/// CFB-128 in one direction.
pub struct Cfb<C> {
    cipher: C,
    /// Feedback register: the next block to encrypt.
    next: [u8; BLOCK_SIZE],
    /// Current keystream block.
    out: [u8; BLOCK_SIZE],
    out_used: usize,
    decrypt: bool,
}

impl<C: BlockCipher> Cfb<C> {
    fn new(cipher: C, iv: &[u8], decrypt: bool) -> Self {
        assert_block_size("cfb", &cipher);
        Self {
            cipher,
            next: iv_block("cfb", iv),
            out: [0u8; BLOCK_SIZE],
            out_used: BLOCK_SIZE,
            decrypt,
        }
    }

    /// # Panics
    ///
    /// Panics if the block size is not 16 or `iv` is not one block.
    pub fn new_encrypter(cipher: C, iv: &[u8]) -> Self {
        Self::new(cipher, iv, false)
    }

    /// # Panics
    ///
    /// Panics if the block size is not 16 or `iv` is not one block.
    pub fn new_decrypter(cipher: C, iv: &[u8]) -> Self {
        Self::new(cipher, iv, true)
    }
}

impl<C: BlockCipher> StreamCipher for Cfb<C> {
    fn xor_keystream(&mut self, dst: &mut [u8], src: &[u8]) {
        check_buffers("cfb", dst, src);
        let mut i = 0;
        while i < src.len() {
            if self.out_used == BLOCK_SIZE {
                self.cipher.encrypt(&mut self.out, &self.next);
                self.out_used = 0;
            }
            let used = self.out_used;
            let n = xor_bytes(&mut dst[i..], &src[i..], &self.out[used..]);
            // The register takes ciphertext in both directions.
            let ct = if self.decrypt { &src[i..i + n] } else { &dst[i..i + n] };
            self.next[used..used + n].copy_from_slice(ct);
            self.out_used += n;
            i += n;
        }
    }
}

impl<C: BlockCipher> StreamMode for Cfb<C> {
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }
}

impl<C> SetIv for Cfb<C> {
    fn set_iv(&mut self, iv: &[u8]) {
        self.next = iv_block("cfb", iv);
        self.out.zeroize();
        self.out_used = BLOCK_SIZE;
    }
}

impl<C> Drop for Cfb<C> {
    fn drop(&mut self) {
        self.out.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(feature = "aes")]
    use crate::aes::AesKey;
    use crate::modes::test_util::{hex_to_bytes, NIST_PT};
    #[cfg(feature = "sm4")]
    use crate::sm4::Sm4Key;

    // NIST SP 800-38A F.3.13: CFB128-AES128
    #[cfg(feature = "aes")]
    #[test]
    fn test_cfb_aes128() {
        let key = hex_to_bytes("2b7e151628aed2a6abf7158809cf4f3c");
        let iv = hex_to_bytes("000102030405060708090a0b0c0d0e0f");
        let pt = hex_to_bytes(NIST_PT);
        let expected = "3b3fd92eb72dad20333449f8e83cfb4ac8a64537a0b3a93fcde3cdad9f1ce58b\
                        26751f67a3cbb140b1808cf187a4f4dfc04b05357c5d1c0eeac4c66f9ff7f2e6";

        let mut ct = vec![0u8; pt.len()];
        Cfb::new_encrypter(AesKey::new(&key).unwrap(), &iv).xor_keystream(&mut ct, &pt);
        assert_eq!(hex::encode(&ct), expected);

        let mut decrypted = vec![0u8; ct.len()];
        Cfb::new_decrypter(AesKey::new(&key).unwrap(), &iv).xor_keystream(&mut decrypted, &ct);
        assert_eq!(decrypted, pt);
    }

    #[cfg(feature = "sm4")]
    #[test]
    fn test_cfb_sm4_vector() {
        let key = hex_to_bytes("2b7e151628aed2a6abf7158809cf4f3c");
        let iv = hex_to_bytes("000102030405060708090a0b0c0d0e0f");
        let pt = hex_to_bytes(NIST_PT);
        let expected = "bc710d762d070b26361da82b54565e46a4cd42786a3a5293a3c6cbc123f0b354\
                        407055b1c1a5d9982c187d5c3ee0ced84b82c40f2f0a4e0341797f1f307b8047";
        let mut ct = vec![0u8; pt.len()];
        Cfb::new_encrypter(Sm4Key::new(&key).unwrap(), &iv).xor_keystream(&mut ct, &pt);
        assert_eq!(hex::encode(&ct), expected);
    }

    #[cfg(feature = "sm4")]
    #[test]
    fn test_cfb_byte_granular_chunks() {
        let cipher = Sm4Key::new(&[0x42u8; 16]).unwrap();
        let iv = [9u8; 16];
        let pt: Vec<u8> = (0..77u8).collect();
        let mut whole = vec![0u8; pt.len()];
        Cfb::new_encrypter(&cipher, &iv).xor_keystream(&mut whole, &pt);

        let mut enc = Cfb::new_encrypter(&cipher, &iv);
        let mut pieces = vec![0u8; pt.len()];
        let mut off = 0;
        for len in [1usize, 15, 3, 16, 29, 13] {
            enc.xor_keystream(&mut pieces[off..off + len], &pt[off..off + len]);
            off += len;
        }
        assert_eq!(pieces, whole);

        let mut dec = Cfb::new_decrypter(&cipher, &iv);
        let mut back = vec![0u8; pt.len()];
        dec.xor_keystream(&mut back[..5], &whole[..5]);
        dec.xor_keystream(&mut back[5..], &whole[5..]);
        assert_eq!(back, pt);
    }

    #[cfg(feature = "sm4")]
    #[test]
    fn test_cfb_set_iv_restarts() {
        let cipher = Sm4Key::new(&[1u8; 16]).unwrap();
        let mut enc = Cfb::new_encrypter(&cipher, &[0u8; 16]);
        let mut a = [0u8; 20];
        enc.xor_keystream(&mut a, &[0u8; 20]);
        enc.set_iv(&[0u8; 16]);
        let mut b = [0u8; 20];
        enc.xor_keystream(&mut b, &[0u8; 20]);
        assert_eq!(a, b);
    }
}
