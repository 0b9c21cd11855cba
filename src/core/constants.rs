//! Link-layer constants.
//!
//! These values are fixed at build time. Both ends of a link must agree on
//! the tag literals and the master key, so they MUST NOT be changed on one
//! node only.

use std::time::Duration;

// =============================================================================
// ENVELOPE TAGS
// =============================================================================

/// Tag of the outer (symmetric, master-key) envelope.
pub const OUTER_MARK: &str = "epnpa";

/// Tag of the inner (asymmetric, per-peer) envelope.
pub const INNER_MARK: &str = "epnpr";

// =============================================================================
// CONTROL LITERALS
// =============================================================================

/// Handshake request.
pub const SYN: &str = "syn";

/// Handshake reply.
pub const ACK: &str = "ack";

/// Liveness signal.
pub const KEEPALIVE: &str = "keepalive";

// =============================================================================
// APPLICATION PROTOCOL PREFIXES
// =============================================================================

/// Node protocol prefix.
pub const PREFIX_PNP: &str = "pnp";

/// Rendezvous ("root") node protocol prefix.
pub const PREFIX_RPNP: &str = "rpnp";

/// Chess node protocol prefix.
pub const PREFIX_CPNP: &str = "cpnp";

// =============================================================================
// TIMING
// =============================================================================

/// How long a handshake may take before the connection is left disconnected.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between two `syn` datagrams.
pub const HANDSHAKE_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Recommended idle threshold after which a link is considered stale.
pub const STALE_AFTER: Duration = Duration::from_secs(60);

// =============================================================================
// SOCKETS
// =============================================================================

/// Well-known port of the rendezvous listener.
pub const RENDEZVOUS_PORT: u16 = 50_000;

/// Size of the per-connection receive buffer.
pub const RECV_BUFFER_SIZE: usize = 65_535;

/// Largest datagram we will try to send (largest IPv4 UDP payload).
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

// =============================================================================
// CRYPTO SIZES
// =============================================================================

/// XChaCha20 nonce size.
pub const AEAD_NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size.
pub const AEAD_TAG_SIZE: usize = 16;

/// Symmetric key size.
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// X25519 public key size.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// X25519 private key size.
pub const PRIVATE_KEY_SIZE: usize = 32;
