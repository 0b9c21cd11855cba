//! The two nested text envelopes.
//!
//! ```text
//! outer:  "epnpa\n" + encrypt_symmetric(body, master) + "\nepnpa"    always
//! inner:  "epnpr\n" + encrypt_asym(body, peer_public) + "\nepnpr"    application only
//! ```
//!
//! Sending applies inner (when a peer key is configured and the payload is
//! not a control literal) and then outer. Receiving strips outer, then inner
//! if the decrypted text starts with the inner tag, then classifies.
//!
//! A datagram that does not start with the outer tag is taken verbatim:
//! that is how raw handshake literals from `send_raw` arrive.

use std::sync::Arc;

use crate::core::{CryptoError, EnvelopeError, INNER_MARK, OUTER_MARK};
use crate::crypto::{
    decrypt_asym, decrypt_symmetric, encrypt_asym, encrypt_symmetric, PrivateKey, PublicKey,
    SymmetricKey,
};

use super::protocol::{Classified, ProtocolSet};

/// Wrap `body` as `mark\nbody\nmark`.
pub fn wrap_layer(mark: &str, body: &str) -> String {
    let mut out = String::with_capacity(2 * mark.len() + body.len() + 2);
    out.push_str(mark);
    out.push('\n');
    out.push_str(body);
    out.push('\n');
    out.push_str(mark);
    out
}

/// Strip one `mark\n...\nmark` layer.
///
/// Returns `Ok(None)` when `text` does not open with `mark\n`. The body ends
/// at the closing tag sitting at the very end of the text, so tag-like
/// substrings inside the body never cut it short.
pub fn strip_layer<'a>(text: &'a str, mark: &'static str) -> Result<Option<&'a str>, EnvelopeError> {
    let Some(rest) = text.strip_prefix(mark).and_then(|r| r.strip_prefix('\n')) else {
        return Ok(None);
    };
    rest.strip_suffix(mark)
        .and_then(|r| r.strip_suffix('\n'))
        .map(Some)
        .ok_or(EnvelopeError::MissingClosingTag(mark))
}

/// Seal a payload in the outer layer only.
pub fn seal_outer(payload: &str) -> Result<String, CryptoError> {
    let ciphertext = encrypt_symmetric(payload.as_bytes(), SymmetricKey::master())?;
    Ok(wrap_layer(OUTER_MARK, &ciphertext))
}

/// Envelope codec for one connection: the protocol set it accepts plus the
/// optional inner-layer keys.
#[derive(Debug, Clone)]
pub struct Envelope {
    protocols: ProtocolSet,
    encryption_key: Option<Arc<PublicKey>>,
    decryption_key: Option<Arc<PrivateKey>>,
}

impl Envelope {
    /// Codec without inner-layer keys.
    pub fn new(protocols: ProtocolSet) -> Self {
        Self {
            protocols,
            encryption_key: None,
            decryption_key: None,
        }
    }

    /// Set the peer key used to seal outbound application messages.
    pub fn with_encryption_key(mut self, key: Option<Arc<PublicKey>>) -> Self {
        self.encryption_key = key;
        self
    }

    /// Set our key used to open inbound inner envelopes.
    pub fn with_decryption_key(mut self, key: Option<Arc<PrivateKey>>) -> Self {
        self.decryption_key = key;
        self
    }

    /// Whether inbound inner envelopes can be opened.
    pub fn has_decryption_key(&self) -> bool {
        self.decryption_key.is_some()
    }

    /// Wrap a payload for the wire.
    pub fn seal(&self, payload: &str) -> Result<String, CryptoError> {
        match &self.encryption_key {
            Some(key) if !self.protocols.is_control(payload) => {
                let inner = wrap_layer(INNER_MARK, &encrypt_asym(payload.as_bytes(), key)?);
                seal_outer(&inner)
            }
            _ => seal_outer(payload),
        }
    }

    /// Strip every layer of a received datagram.
    ///
    /// The text ends at the first NUL byte, if any.
    pub fn open(&self, datagram: &[u8]) -> Result<String, EnvelopeError> {
        let end = datagram
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(datagram.len());
        let text = std::str::from_utf8(&datagram[..end]).map_err(|_| EnvelopeError::NotText)?;
        if text.is_empty() {
            return Err(EnvelopeError::Empty);
        }

        let mut message = match strip_layer(text, OUTER_MARK)? {
            Some(body) => into_text(decrypt_symmetric(body, SymmetricKey::master())?)?,
            None => text.to_owned(),
        };

        if let Some(body) = strip_layer(&message, INNER_MARK)? {
            let key = self.decryption_key.as_deref().ok_or(CryptoError::MissingKey)?;
            message = into_text(decrypt_asym(body, key)?)?;
        }

        Ok(message)
    }

    /// Strip and classify a received datagram.
    pub fn decode(&self, datagram: &[u8]) -> Result<Classified, EnvelopeError> {
        let message = self.open(datagram)?;
        self.protocols.classify(message)
    }
}

fn into_text(bytes: Vec<u8>) -> Result<String, EnvelopeError> {
    String::from_utf8(bytes).map_err(|_| EnvelopeError::NotText)
}
