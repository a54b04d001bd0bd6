//! Symmetric encryption of uploaded artifacts.
//!
//! Uploads are sealed with AES-256-GCM. Both the video and its metadata use
//! the same layout: `<12-byte nonce><ciphertext + tag>`. The symmetric key
//! arrives either as 32 raw bytes or as a 64-character hex string.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use secrecy::{ExposeSecret, SecretSlice};

use crate::error::CryptoError;

/// Key size for AES-256 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Nonce size for AES-256-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

/// Parses key material received with an upload.
///
/// Accepts exactly [`KEY_SIZE`] raw bytes, or the same key hex-encoded.
/// Surrounding whitespace is ignored for the hex form.
pub fn decode_key(material: &[u8]) -> Result<SecretSlice<u8>, CryptoError> {
    if material.len() == KEY_SIZE {
        return Ok(SecretSlice::from(material.to_vec()));
    }

    let text = std::str::from_utf8(material)
        .map_err(|_| CryptoError::InvalidKey(format!("expected {} bytes", KEY_SIZE)))?
        .trim();

    let bytes = hex_decode(text).map_err(|e| CryptoError::InvalidKey(format!("Invalid hex key: {}", e)))?;
    if bytes.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKey(format!(
            "Key must be {} bytes ({} hex chars), got {} bytes",
            KEY_SIZE,
            KEY_SIZE * 2,
            bytes.len()
        )));
    }

    Ok(SecretSlice::from(bytes))
}

/// AES-256-GCM cipher for video and metadata payloads.
pub struct VideoCipher {
    cipher: Aes256Gcm,
}

impl VideoCipher {
    pub fn new(key: &SecretSlice<u8>) -> Result<Self, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(key.expose_secret())
            .map_err(|e| CryptoError::InvalidKey(format!("Failed to create cipher: {}", e)))?;
        Ok(Self { cipher })
    }

    /// Convenience constructor for hex-encoded keys.
    pub fn from_hex_key(key_hex: &str) -> Result<Self, CryptoError> {
        Self::new(&decode_key(key_hex.as_bytes())?)
    }

    /// Seals `plaintext` and returns `<nonce><ciphertext>`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce_bytes = rand_bytes::<NONCE_SIZE>()?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend(ciphertext);
        Ok(combined)
    }

    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if sealed.len() < NONCE_SIZE {
            return Err(CryptoError::MalformedCiphertext(format!(
                "{} bytes is shorter than the nonce",
                sealed.len()
            )));
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::Authentication)
    }
}

/// Generates a fresh random key in the hex form devices send.
pub fn generate_hex_key() -> Result<String, CryptoError> {
    let key = rand_bytes::<KEY_SIZE>()?;
    Ok(hex_encode(&key))
}

/// Encodes bytes as lowercase hex string.
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut result = String::with_capacity(bytes.len() * 2);
    for &byte in bytes {
        result.push(HEX_CHARS[(byte >> 4) as usize] as char);
        result.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
    }
    result
}

fn hex_decode(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("Hex string must have even length".to_string());
    }
    if !hex.is_ascii() {
        return Err("Hex string must be ASCII".to_string());
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("Invalid hex at position {}: {}", i, e))
        })
        .collect()
}

fn rand_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    getrandom::fill(&mut bytes).map_err(|e| {
        CryptoError::Encryption(format!("Failed to generate random bytes: {}", e))
    })?;
    Ok(bytes)
}
