//! Key material for both envelope layers.
//!
//! - [`SymmetricKey`]: the outer layer. One process-wide master key,
//!   see [`SymmetricKey::master`].
//! - [`PublicKey`] / [`PrivateKey`]: the inner layer. X25519 keys, shared
//!   between connections behind an `Arc`.

use std::fmt;

use rand::rngs::OsRng;
use x25519_dalek::StaticSecret;
use zeroize::Zeroize;

use crate::core::{PUBLIC_KEY_SIZE, PRIVATE_KEY_SIZE, SYMMETRIC_KEY_SIZE};

/// Master key compiled into every node of the network.
const MASTER_KEY_BYTES: [u8; SYMMETRIC_KEY_SIZE] = *b"pnp-net outer envelope master k!";

static MASTER_KEY: SymmetricKey = SymmetricKey::from_bytes(MASTER_KEY_BYTES);

/// A 32-byte XChaCha20-Poly1305 key.
///
/// Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    key: [u8; SYMMETRIC_KEY_SIZE],
}

impl SymmetricKey {
    /// Create a key from raw bytes.
    pub const fn from_bytes(key: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// The process-wide master key used by the outer envelope.
    ///
    /// Immutable for the life of the process; no synchronization needed.
    pub fn master() -> &'static SymmetricKey {
        &MASTER_KEY
    }

    /// Get the raw key bytes.
    ///
    /// # Security
    /// Handle with care - this exposes sensitive key material.
    pub fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.key
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// X25519 public key of a peer (encrypts the inner envelope towards it).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    pub(crate) fn to_dalek(self) -> x25519_dalek::PublicKey {
        x25519_dalek::PublicKey::from(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex_preview(&self.0))
    }
}

/// X25519 private key (decrypts the inner envelope addressed to us).
///
/// The secret is zeroized on drop by `x25519-dalek`.
#[derive(Clone)]
pub struct PrivateKey(StaticSecret);

impl PrivateKey {
    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(*x25519_dalek::PublicKey::from(&self.0).as_bytes())
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// A node's long-term X25519 identity.
#[derive(Clone)]
pub struct Keypair {
    private: PrivateKey,
    public: PublicKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self::from_private(PrivateKey(secret))
    }

    /// Build a keypair around an existing private key.
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// Get the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Get the private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    let head: String = bytes.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    format!("{}...", head)
}
