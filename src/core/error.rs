//! Error types for the link layer.
//!
//! Nothing in here crosses the receive task boundary: datagrams that fail
//! with [`EnvelopeError`] or [`CryptoError`] are logged and dropped, the
//! receive chain keeps running. Only caller-side operations (bind, send,
//! connect) surface a [`LinkError`].

use thiserror::Error;

/// Errors in the cipher primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// AEAD encryption failed.
    #[error("AEAD encryption failed")]
    EncryptionFailed,

    /// AEAD decryption failed (invalid tag, wrong key, or corrupted).
    #[error("AEAD decryption failed (invalid tag, wrong key, or corrupted)")]
    DecryptionFailed,

    /// Ciphertext text is not valid base64 or is too short.
    #[error("invalid ciphertext encoding: {0}")]
    InvalidEncoding(String),

    /// The layer needs a key this connection does not have.
    #[error("no key configured for this layer")]
    MissingKey,

    /// X25519 agreement produced an all-zero shared secret.
    #[error("non-contributory key agreement")]
    NonContributory,

    /// Key derivation failed.
    #[error("key derivation failed")]
    KeyDerivationFailed,
}

/// Errors while stripping or classifying an envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Datagram was empty (or only NUL padding).
    #[error("empty datagram")]
    Empty,

    /// Opening tag present but the closing tag is missing.
    #[error("missing closing tag {0:?}")]
    MissingClosingTag(&'static str),

    /// Body is not UTF-8 text.
    #[error("body is not valid UTF-8")]
    NotText,

    /// Neither a control literal nor a registered application prefix.
    #[error("unrecognized protocol")]
    Unrecognized,

    /// A layer failed to decrypt.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Top-level link errors.
#[derive(Debug, Error)]
pub enum LinkError {
    /// I/O error from the socket.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Crypto error while sealing an outbound message.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Envelope error.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    /// Sealed datagram does not fit in one UDP payload.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Size of the sealed datagram.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
