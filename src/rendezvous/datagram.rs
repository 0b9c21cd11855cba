//! Inbound records of the rendezvous listener.

use std::net::SocketAddr;

/// An application message together with the endpoint it came from.
///
/// The sender endpoint is the peer's public (NAT-translated) address, which
/// is exactly what the rendezvous node reports back for hole punching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Sender endpoint as seen by the listener.
    pub from: SocketAddr,
    /// Unwrapped message text.
    pub payload: String,
}

impl Datagram {
    /// Create a new record.
    pub fn new(from: SocketAddr, payload: impl Into<String>) -> Self {
        Self {
            from,
            payload: payload.into(),
        }
    }
}
