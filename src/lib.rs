//! # pnp-net
//!
//! Peer link layer of the PNP node network.
//!
//! It establishes, encrypts, and maintains UDP links between nodes and
//! separates application ("node protocol") traffic from connection
//! control:
//!
//! - **Handshake**: `syn`/`ack` exchange with a bounded retry window
//! - **Liveness**: `keepalive` tracking for staleness checks
//! - **Mobility**: re-pointing a live link at a new endpoint (hole punching)
//! - **Rendezvous**: one well-known-port listener serving many peers
//! - **Envelopes**: a symmetric outer layer over an optional X25519 inner
//!   layer
//!
//! ## Feature Flags
//!
//! - `peer` (default): [`PeerConnection`] and [`BootstrapConnection`]
//! - `rendezvous` (default): [`RendezvousConnection`]
//!
//! ## Modules
//!
//! - [`core`]: constants, configuration, and error types (always included)
//! - [`crypto`]: cipher primitives behind the envelopes (always included)
//! - [`transport`]: sockets, envelope codec, classification, link state
//! - [`peer`]: point-to-point links (requires `peer` feature)
//! - [`rendezvous`]: discovery listener (requires `rendezvous` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use pnp_net::transport::{Classified, ControlMessage, Envelope, ProtocolSet};
//!
//! let codec = Envelope::new(ProtocolSet::PEER);
//!
//! let wire = codec.seal("pnp hello").unwrap();
//! assert!(wire.starts_with("epnpa\n"));
//! assert_eq!(
//!     codec.decode(wire.as_bytes()).unwrap(),
//!     Classified::Application("pnp hello".into())
//! );
//!
//! // Handshake literals travel without an envelope.
//! assert_eq!(
//!     codec.decode(b"syn").unwrap(),
//!     Classified::Control(ControlMessage::Syn)
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Cipher primitives (always included)
pub mod crypto;

// Sockets and codec (always included)
pub mod transport;

// Point-to-point links (feature-gated)
#[cfg(feature = "peer")]
#[cfg_attr(docsrs, doc(cfg(feature = "peer")))]
pub mod peer;

// Rendezvous listener (feature-gated)
#[cfg(feature = "rendezvous")]
#[cfg_attr(docsrs, doc(cfg(feature = "rendezvous")))]
pub mod rendezvous;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::core::{
        GameResource, LinkConfig, LinkConfigBuilder, LinkError, LinkResult, PeerId,
    };
    pub use crate::crypto::{Keypair, PrivateKey, PublicKey};
    pub use crate::transport::{Classified, ControlMessage, Envelope, ProtocolSet};

    #[cfg(feature = "peer")]
    pub use crate::peer::{BootstrapConnection, PeerConnection};

    #[cfg(feature = "rendezvous")]
    pub use crate::rendezvous::{Datagram, RendezvousConnection};
}

// Re-export commonly used items at crate root
pub use crate::core::{LinkConfig, LinkError, LinkResult, PeerId};

#[cfg(feature = "peer")]
pub use crate::peer::{BootstrapConnection, PeerConnection};

#[cfg(feature = "rendezvous")]
pub use crate::rendezvous::{Datagram, RendezvousConnection};
