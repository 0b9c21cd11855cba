//! Cipher primitives behind the two envelope layers.
//!
//! - [`encrypt_symmetric`] / [`decrypt_symmetric`]: outer layer,
//!   XChaCha20-Poly1305 under the master key
//! - [`encrypt_asym`] / [`decrypt_asym`]: inner layer, X25519 sealed box
//!
//! All four produce or consume base64 text so the result can be framed by
//! newline-delimited tags.

mod asymmetric;
mod keys;
mod symmetric;

pub use asymmetric::{decrypt_asym, encrypt_asym};
pub use keys::{Keypair, PrivateKey, PublicKey, SymmetricKey};
pub use symmetric::{decrypt_symmetric, encrypt_symmetric};
