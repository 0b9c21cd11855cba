//! Bootstrap (responder) links.
//!
//! The well-known coordinating node answers handshakes instead of starting
//! them. A [`BootstrapConnection`] binds a caller-chosen local port, arms
//! its receive task, and then waits passively for the remote side's
//! `syn`/`ack` for the handshake window. It never sends `syn` itself.
//!
//! The socket is not associated with the remote endpoint. The endpoint
//! given at construction is only a first guess: it is replaced by the sender
//! of every accepted datagram, so a peer whose NAT-translated address was
//! not known in advance can still be answered.

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;

use super::connection::{unspecified_like, PeerConnection, Role};
use crate::core::{LinkConfig, LinkResult, PeerId};
use crate::crypto::{PrivateKey, PublicKey};
use crate::transport::LinkSocket;

/// A passive link bound to a fixed local port.
///
/// Derefs (shared only) to [`PeerConnection`] for sending, queue access,
/// and liveness queries. A bootstrap link has one target for its whole
/// life: it cannot be re-pointed, since its unassociated socket would keep
/// accepting the previous peer.
///
/// ```compile_fail
/// use std::net::SocketAddr;
/// use pnp_net::core::PeerId;
/// use pnp_net::BootstrapConnection;
///
/// async fn repoint(mut link: BootstrapConnection, to: SocketAddr) {
///     let _ = link.change_target(to, PeerId(2), None).await;
/// }
/// ```
pub struct BootstrapConnection {
    inner: PeerConnection,
}

impl BootstrapConnection {
    /// Bind `local_port` on the wildcard address and wait for `endpoint` to
    /// handshake.
    pub async fn open(
        local_port: u16,
        endpoint: SocketAddr,
        peer_id: PeerId,
        config: LinkConfig,
    ) -> LinkResult<Self> {
        Self::open_with_key(local_port, endpoint, peer_id, None, config).await
    }

    /// Like [`open`](Self::open), with a private key for inbound inner
    /// envelopes.
    pub async fn open_with_key(
        local_port: u16,
        endpoint: SocketAddr,
        peer_id: PeerId,
        decryption_key: Option<Arc<PrivateKey>>,
        config: LinkConfig,
    ) -> LinkResult<Self> {
        let local = SocketAddr::new(unspecified_like(&endpoint), local_port);
        Self::open_on(local, endpoint, peer_id, decryption_key, config).await
    }

    /// Bind exactly `local` (address and port) and wait for `endpoint` to
    /// handshake.
    pub async fn open_on(
        local: SocketAddr,
        endpoint: SocketAddr,
        peer_id: PeerId,
        decryption_key: Option<Arc<PrivateKey>>,
        config: LinkConfig,
    ) -> LinkResult<Self> {
        let socket = LinkSocket::bind(local, &config).await?;
        tracing::debug!(%local, peer = %peer_id, "bootstrap link waiting for handshake");
        let inner =
            PeerConnection::establish(socket, Role::Responder, endpoint, peer_id, decryption_key, config)
                .await?;
        Ok(Self { inner })
    }

    /// Set (or clear) the peer's public key for outbound inner envelopes.
    pub fn set_encryption_key(&mut self, key: Option<Arc<PublicKey>>) {
        self.inner.set_encryption_key(key);
    }

    /// Stop the receive task, wait for it, and close the socket.
    pub async fn shutdown(self) {
        self.inner.shutdown().await;
    }
}

impl Deref for BootstrapConnection {
    type Target = PeerConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
