//! AES-256-CFB encryption (C11, §4.10).
use aes::Aes256;
use anyhow::{Context, Result};
use cfb_mode::Encryptor;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};

type Cfb = Encryptor<Aes256>;

/// A zero IV, matching the reference encoder: the key itself is per-build and
/// never reused across different plaintext under the same preset within a run.
const ZERO_IV: [u8; 16] = [0u8; 16];

/// Encrypts `data` with AES-256 in CFB mode under `key`, returning the ciphertext.
///
/// CFB chains each block's keystream off the previous block's ciphertext, so the
/// whole buffer must be encrypted in one call rather than split across several —
/// `cipher::AsyncStreamCipher::encrypt` consumes the cipher for exactly that
/// reason. Callers that build up a payload incrementally (the directory index,
/// §6.1) must finish assembling it in memory first, then encrypt it whole.
pub fn encrypt_cfb(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>> {
    let cipher = Cfb::new_from_slices(key, &ZERO_IV).context("invalid AES-256 key material")?;
    let mut buf = data.to_vec();
    cipher.encrypt(&mut buf);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_any_32_byte_key() {
        let key = [0x11u8; 32];
        assert!(encrypt_cfb(&key, b"hello").is_ok());
    }

    #[test]
    fn produces_ciphertext_of_equal_length_and_differs_from_plaintext() {
        let key = [0x22u8; 32];
        let ciphertext = encrypt_cfb(&key, b"hello world").unwrap();
        assert_eq!(ciphertext.len(), b"hello world".len());
        assert_ne!(ciphertext, b"hello world");
    }

    #[test]
    fn same_key_and_plaintext_round_trip_through_decrypt() {
        use cfb_mode::Decryptor;
        use cfb_mode::cipher::KeyIvInit as _;
        let key = [0x33u8; 32];
        let ciphertext = encrypt_cfb(&key, b"hello world").unwrap();
        let decryptor = Decryptor::<Aes256>::new_from_slices(&key, &ZERO_IV).unwrap();
        let mut buf = ciphertext;
        decryptor.decrypt(&mut buf);
        assert_eq!(buf, b"hello world");
    }

    #[test]
    fn splitting_a_buffer_into_two_encrypt_calls_changes_the_result() {
        // Demonstrates why body/directory encryption must assemble the full
        // buffer before calling `encrypt_cfb` once, rather than calling it
        // piecewise: CFB's chaining makes two independent one-shot calls
        // produce different ciphertext than a single call over the same bytes.
        let key = [0x44u8; 32];
        let whole = encrypt_cfb(&key, b"hello world").unwrap();
        let mut split = encrypt_cfb(&key, b"hello ").unwrap();
        split.extend(encrypt_cfb(&key, b"world").unwrap());
        assert_ne!(whole, split);
    }
}
