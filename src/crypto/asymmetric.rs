//! Inner-layer cipher: an X25519 sealed box.
//!
//! The sender draws an ephemeral X25519 secret, agrees a shared secret with
//! the recipient's static public key, and derives a one-shot
//! XChaCha20-Poly1305 key with HKDF-SHA256. Only the holder of the matching
//! [`PrivateKey`] can open the box.
//!
//! ```text
//! base64( ephemeral_public (32) | nonce (24) | ciphertext | tag (16) )
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hkdf::Hkdf;
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use x25519_dalek::EphemeralSecret;
use zeroize::Zeroize;

use super::keys::{PrivateKey, PublicKey};
use super::symmetric::{open, seal};
use crate::core::{CryptoError, AEAD_NONCE_SIZE, AEAD_TAG_SIZE, PUBLIC_KEY_SIZE, SYMMETRIC_KEY_SIZE};

/// HKDF info label binding derived keys to this construction.
const SEALED_BOX_INFO: &[u8] = b"pnp-net sealed box v1";

/// Encrypt `plaintext` so only the owner of `recipient` can read it.
pub fn encrypt_asym(plaintext: &[u8], recipient: &PublicKey) -> Result<String, CryptoError> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = x25519_dalek::PublicKey::from(&ephemeral);

    let shared = ephemeral.diffie_hellman(&recipient.to_dalek());
    if !shared.was_contributory() {
        return Err(CryptoError::NonContributory);
    }

    let mut key = derive_key(shared.as_bytes(), ephemeral_public.as_bytes(), recipient.as_bytes())?;
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    let sealed = seal(&key, &nonce, plaintext);
    key.zeroize();
    let sealed = sealed?;

    let mut wire = Vec::with_capacity(PUBLIC_KEY_SIZE + AEAD_NONCE_SIZE + sealed.len());
    wire.extend_from_slice(ephemeral_public.as_bytes());
    wire.extend_from_slice(&nonce);
    wire.extend_from_slice(&sealed);
    Ok(STANDARD.encode(wire))
}

/// Open a box produced by [`encrypt_asym`].
pub fn decrypt_asym(ciphertext: &str, private_key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
    let wire = STANDARD
        .decode(ciphertext)
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;

    if wire.len() < PUBLIC_KEY_SIZE + AEAD_NONCE_SIZE + AEAD_TAG_SIZE {
        return Err(CryptoError::InvalidEncoding(format!(
            "sealed box too short: {} bytes",
            wire.len()
        )));
    }

    let (ephemeral_bytes, rest) = wire.split_at(PUBLIC_KEY_SIZE);
    let (nonce, sealed) = rest.split_at(AEAD_NONCE_SIZE);

    let mut ephemeral_public = [0u8; PUBLIC_KEY_SIZE];
    ephemeral_public.copy_from_slice(ephemeral_bytes);

    let shared = private_key
        .secret()
        .diffie_hellman(&x25519_dalek::PublicKey::from(ephemeral_public));
    if !shared.was_contributory() {
        return Err(CryptoError::NonContributory);
    }

    let recipient = private_key.public_key();
    let mut key = derive_key(shared.as_bytes(), &ephemeral_public, recipient.as_bytes())?;
    let plaintext = open(&key, nonce, sealed);
    key.zeroize();
    plaintext
}

fn derive_key(
    shared: &[u8; 32],
    ephemeral_public: &[u8; PUBLIC_KEY_SIZE],
    recipient_public: &[u8; PUBLIC_KEY_SIZE],
) -> Result<[u8; SYMMETRIC_KEY_SIZE], CryptoError> {
    let mut salt = [0u8; 2 * PUBLIC_KEY_SIZE];
    salt[..PUBLIC_KEY_SIZE].copy_from_slice(ephemeral_public);
    salt[PUBLIC_KEY_SIZE..].copy_from_slice(recipient_public);

    let mut okm = [0u8; SYMMETRIC_KEY_SIZE];
    Hkdf::<Sha256>::new(Some(&salt), shared)
        .expand(SEALED_BOX_INFO, &mut okm)
        .map_err(|_| CryptoError::KeyDerivationFailed)?;
    Ok(okm)
}
