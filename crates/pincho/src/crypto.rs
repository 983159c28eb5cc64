//! Client-side message encryption.
//!
//! Only the message body (or the AI input text) is ever encrypted; title,
//! type, tags and URLs stay cleartext so the server can still filter and
//! route. The scheme must match the companion mobile app's decryption:
//! AES-128-CBC with PKCS#7 padding, a key derived from the user's password,
//! and a random per-message IV sent alongside the ciphertext as hex.
//!
//! Key derivation uses SHA-1 for compatibility with the existing apps, not
//! for security margin; the password itself never leaves the process.

use aes::Aes128;
use cipher::{BlockModeEncrypt, KeyIvInit, block_padding::Pkcs7};
use rand::Rng;
use sha1::{Digest, Sha1};

use crate::error::PushError;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;

/// AES-128-CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// Derive the 128-bit AES key for a password.
///
/// The app contract is "the first 32 lowercase-hex characters of the SHA-1
/// digest, decoded back to bytes", which is exactly the first 16 digest
/// bytes, so no hex round trip is needed.
pub fn derive_key(password: &str) -> [u8; 16] {
    let digest = Sha1::digest(password.as_bytes());
    let mut key = [0u8; 16];
    key.copy_from_slice(&digest[..16]);
    key
}

/// A random initialization vector plus its hex transport encoding.
#[derive(Debug, Clone)]
pub struct Iv {
    bytes: [u8; IV_LEN],
    hex: String,
}

impl Iv {
    /// Generate a fresh IV from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_LEN];
        rand::rng().fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        let hex = hex::encode(bytes);
        Self { bytes, hex }
    }

    pub fn bytes(&self) -> &[u8; IV_LEN] {
        &self.bytes
    }

    /// 32-char lowercase hex encoding, as transmitted in the payload.
    pub fn hex(&self) -> &str {
        &self.hex
    }
}

/// Encrypt `plaintext` with a key derived from `password` and the given IV.
///
/// The ciphertext is encoded with a transport-safe Base64 variant: standard
/// Base64 with `+` → `-`, `/` → `.` and `=` → `_`, so the result survives
/// URL and form contexts without escaping. Deterministic for identical
/// `(plaintext, password, iv)` inputs.
pub fn encrypt(plaintext: &str, password: &str, iv: &[u8]) -> Result<String, PushError> {
    if plaintext.is_empty() {
        return Err(PushError::invalid_argument("plaintext must not be empty"));
    }
    if password.is_empty() {
        return Err(PushError::invalid_argument(
            "encryption password must not be empty",
        ));
    }
    if iv.len() != IV_LEN {
        return Err(PushError::invalid_argument(format!(
            "iv must be exactly {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }

    let key = derive_key(password);
    let cipher = Aes128CbcEnc::new_from_slices(&key, iv).map_err(|e| {
        PushError::invalid_argument(format!("failed to initialize AES encryptor: {e}"))
    })?;

    let data = plaintext.as_bytes();
    // PKCS#7 always pads, so round up to the next full block.
    let padded_len = (data.len() / IV_LEN + 1) * IV_LEN;
    let mut buffer = vec![0u8; padded_len];
    buffer[..data.len()].copy_from_slice(data);
    let ciphertext = cipher
        .encrypt_padded::<Pkcs7>(&mut buffer, data.len())
        .map_err(|e| PushError::invalid_argument(format!("encryption failed: {e}")))?;

    Ok(transport_encode(ciphertext))
}

/// Standard Base64 remapped into the alphabet the mobile apps decode.
fn transport_encode(data: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD
        .encode(data)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '.',
            '=' => '_',
            other => other,
        })
        .collect()
}
