//! Outer-layer cipher: XChaCha20-Poly1305 under a shared symmetric key.
//!
//! Output is text so it can sit between the envelope tags:
//!
//! ```text
//! base64( nonce (24) | ciphertext | tag (16) )
//! ```
//!
//! A fresh random 192-bit nonce is drawn for every message.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::{rngs::OsRng, RngCore};

use super::keys::SymmetricKey;
use crate::core::{CryptoError, AEAD_NONCE_SIZE, AEAD_TAG_SIZE};

/// Encrypt `plaintext` under `key` and return the base64 text.
pub fn encrypt_symmetric(plaintext: &[u8], key: &SymmetricKey) -> Result<String, CryptoError> {
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let sealed = seal(key.as_bytes(), &nonce, plaintext)?;

    let mut wire = Vec::with_capacity(AEAD_NONCE_SIZE + sealed.len());
    wire.extend_from_slice(&nonce);
    wire.extend_from_slice(&sealed);
    Ok(STANDARD.encode(wire))
}

/// Decrypt base64 text produced by [`encrypt_symmetric`].
pub fn decrypt_symmetric(ciphertext: &str, key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
    let wire = STANDARD
        .decode(ciphertext)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;

    if wire.len() < AEAD_NONCE_SIZE + AEAD_TAG_SIZE {
        return Err(CryptoError::InvalidEncoding(format!(
            "ciphertext too short: {} bytes",
            wire.len()
        )));
    }

    let (nonce, sealed) = wire.split_at(AEAD_NONCE_SIZE);
    open(key.as_bytes(), nonce, sealed)
}

/// Raw XChaCha20-Poly1305 encryption, shared with the asymmetric layer.
pub(crate) fn seal(key: &[u8; 32], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .encrypt(XNonce::from_slice(nonce), plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)
}

/// Raw XChaCha20-Poly1305 decryption, shared with the asymmetric layer.
pub(crate) fn open(key: &[u8; 32], nonce: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = XChaCha20Poly1305::new(key.into());
    cipher
        .decrypt(XNonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::DecryptionFailed)
}
