//! Message classification.
//!
//! After both envelope layers are stripped, a message is either a
//! connection-control literal, an application ("node protocol") message
//! identified by its prefix, or garbage. The accepted literals and prefixes
//! differ per connection variant, so each variant carries a [`ProtocolSet`].

use crate::core::{
    EnvelopeError, ACK, KEEPALIVE, PREFIX_CPNP, PREFIX_PNP, PREFIX_RPNP, SYN,
};

/// Connection-control literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlMessage {
    /// Handshake request.
    Syn,
    /// Handshake reply.
    Ack,
    /// Liveness signal.
    Keepalive,
}

impl ControlMessage {
    /// Wire literal.
    pub fn as_str(self) -> &'static str {
        match self {
            ControlMessage::Syn => SYN,
            ControlMessage::Ack => ACK,
            ControlMessage::Keepalive => KEEPALIVE,
        }
    }

    /// Parse an exact wire literal.
    pub fn from_literal(text: &str) -> Option<Self> {
        match text {
            SYN => Some(ControlMessage::Syn),
            ACK => Some(ControlMessage::Ack),
            KEEPALIVE => Some(ControlMessage::Keepalive),
            _ => None,
        }
    }
}

/// Result of classifying an unwrapped message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Handled by the connection itself.
    Control(ControlMessage),
    /// Handed to the layer above through the inbound queue.
    Application(String),
}

/// The literals and prefixes one connection variant accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolSet {
    control: &'static [ControlMessage],
    prefixes: &'static [&'static str],
}

impl ProtocolSet {
    /// Point-to-point links: every control literal, `pnp`/`rpnp`/`cpnp`.
    pub const PEER: ProtocolSet = ProtocolSet {
        control: &[
            ControlMessage::Keepalive,
            ControlMessage::Syn,
            ControlMessage::Ack,
        ],
        prefixes: &[PREFIX_PNP, PREFIX_RPNP, PREFIX_CPNP],
    };

    /// Rendezvous listener: answers `syn`, queues `rpnp`.
    pub const RENDEZVOUS: ProtocolSet = ProtocolSet {
        control: &[ControlMessage::Syn],
        prefixes: &[PREFIX_RPNP],
    };

    /// Whether `text` is exactly one of this set's control literals.
    pub fn control(&self, text: &str) -> Option<ControlMessage> {
        ControlMessage::from_literal(text).filter(|msg| self.control.contains(msg))
    }

    /// Whether `text` is a control literal of this set.
    pub fn is_control(&self, text: &str) -> bool {
        self.control(text).is_some()
    }

    /// Whether `text` starts with one of this set's application prefixes.
    pub fn is_application(&self, text: &str) -> bool {
        self.prefixes.iter().any(|prefix| text.starts_with(prefix))
    }

    /// Classify a fully unwrapped message. Control literals win over
    /// prefixes.
    pub fn classify(&self, text: String) -> Result<Classified, EnvelopeError> {
        if let Some(control) = self.control(&text) {
            Ok(Classified::Control(control))
        } else if self.is_application(&text) {
            Ok(Classified::Application(text))
        } else {
            Err(EnvelopeError::Unrecognized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_literals_classify_as_control() {
        for literal in ["syn", "ack", "keepalive"] {
            let classified = ProtocolSet::PEER.classify(literal.to_string()).unwrap();
            assert!(matches!(classified, Classified::Control(_)), "{literal}");
        }
    }

    #[test]
    fn test_control_is_exact_match() {
        // Starts with "syn" but is not the literal, and has no prefix.
        assert_eq!(
            ProtocolSet::PEER.classify("synthetic".into()),
            Err(EnvelopeError::Unrecognized)
        );
        assert_eq!(
            ProtocolSet::PEER.classify("ack ".into()),
            Err(EnvelopeError::Unrecognized)
        );
    }

    #[test]
    fn test_application_prefixes() {
        for msg in ["pnp hello", "rpnp register", "cpnp e2e4", "pnp"] {
            assert_eq!(
                ProtocolSet::PEER.classify(msg.to_string()),
                Ok(Classified::Application(msg.to_string()))
            );
        }
        assert_eq!(
            ProtocolSet::PEER.classify("hello".into()),
            Err(EnvelopeError::Unrecognized)
        );
        assert_eq!(
            ProtocolSet::PEER.classify(String::new()),
            Err(EnvelopeError::Unrecognized)
        );
    }

    #[test]
    fn test_rendezvous_set() {
        let set = ProtocolSet::RENDEZVOUS;
        assert_eq!(
            set.classify("syn".into()),
            Ok(Classified::Control(ControlMessage::Syn))
        );
        // ack/keepalive mean nothing to a listener with no single peer.
        assert_eq!(set.classify("ack".into()), Err(EnvelopeError::Unrecognized));
        assert_eq!(
            set.classify("keepalive".into()),
            Err(EnvelopeError::Unrecognized)
        );
        assert!(set.is_application("rpnp whoami"));
        assert!(!set.is_application("pnp hello"));
        assert!(!set.is_application("cpnp e2e4"));
    }

    #[test]
    fn test_literal_roundtrip() {
        for msg in [
            ControlMessage::Syn,
            ControlMessage::Ack,
            ControlMessage::Keepalive,
        ] {
            assert_eq!(ControlMessage::from_literal(msg.as_str()), Some(msg));
        }
    }
}
