//! Point-to-point link to one remote node.
//!
//! A [`PeerConnection`] owns one UDP socket and one background receive task.
//! The task is a single loop with exactly one receive outstanding at a
//! time; each completion is unwrapped, classified, and routed either to the
//! control handler ([`LinkState::on_control`]) or to the inbound queue, and
//! the loop re-arms regardless of the outcome.
//!
//! The handshake runs on the caller's task: [`connect`](PeerConnection::connect)
//! does not return until the link is connected or the handshake window has
//! elapsed. A timed-out link stays usable; its receive task keeps running so
//! a late `syn`/`ack` still connects it.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::core::{
    GameResource, LinkConfig, LinkResult, PeerId, ACK, KEEPALIVE, SYN,
};
use crate::crypto::{PrivateKey, PublicKey};
use crate::transport::{
    Classified, ControlReply, Envelope, InboundQueue, LinkSocket, LinkState, ProtocolSet,
};

/// Which side of the handshake a connection plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Sends `syn` until answered. Socket associated with the remote peer.
    Initiator,
    /// Waits for the other side's `syn`. Socket left unassociated; the
    /// remote endpoint follows the sender of accepted datagrams.
    Responder,
}

/// A link to one remote node.
///
/// Requires a running tokio runtime.
///
/// # Example
///
/// ```ignore
/// use pnp_net::core::{LinkConfig, PeerId};
/// use pnp_net::peer::PeerConnection;
///
/// let link = PeerConnection::open(root_addr, PeerId(1), LinkConfig::default()).await?;
/// if !link.is_connected() {
///     // handshake timed out; the link keeps listening
/// }
///
/// link.send("pnp hello").await?;
/// while let Some(message) = link.try_pop_inbound() {
///     // hand to the node protocol
/// }
/// ```
pub struct PeerConnection {
    /// Identity of the remote node.
    peer_id: PeerId,
    /// Handshake role.
    role: Role,
    /// Tunables.
    config: LinkConfig,
    /// Owned socket, bound once.
    socket: LinkSocket,
    /// State shared with the receive task.
    state: Arc<LinkState>,
    /// Application messages waiting for the layer above.
    inbound: Arc<InboundQueue<String>>,
    /// Codec, carries the inner-layer keys.
    envelope: Envelope,
    /// The receive task, if armed.
    reader: Option<JoinHandle<()>>,
    /// Optional resource bound to this link.
    game: Mutex<Option<Box<dyn GameResource>>>,
}

impl PeerConnection {
    /// Open a link on an ephemeral local port and handshake with `endpoint`.
    pub async fn open(endpoint: SocketAddr, peer_id: PeerId, config: LinkConfig) -> LinkResult<Self> {
        Self::open_with_key(endpoint, peer_id, None, config).await
    }

    /// Like [`open`](Self::open), with a private key for inbound inner
    /// envelopes.
    pub async fn open_with_key(
        endpoint: SocketAddr,
        peer_id: PeerId,
        decryption_key: Option<Arc<PrivateKey>>,
        config: LinkConfig,
    ) -> LinkResult<Self> {
        let local = SocketAddr::new(unspecified_like(&endpoint), 0);
        let socket = LinkSocket::bind(local, &config).await?;
        Self::establish(socket, Role::Initiator, endpoint, peer_id, decryption_key, config).await
    }

    /// Shared constructor: wrap a bound socket, then run [`connect`](Self::connect).
    pub(crate) async fn establish(
        socket: LinkSocket,
        role: Role,
        endpoint: SocketAddr,
        peer_id: PeerId,
        decryption_key: Option<Arc<PrivateKey>>,
        config: LinkConfig,
    ) -> LinkResult<Self> {
        let mut link = Self {
            peer_id,
            role,
            config,
            socket,
            state: Arc::new(LinkState::new(endpoint)),
            inbound: Arc::new(InboundQueue::new()),
            envelope: Envelope::new(ProtocolSet::PEER).with_decryption_key(decryption_key),
            reader: None,
            game: Mutex::new(None),
        };
        link.connect(endpoint).await?;
        Ok(link)
    }

    /// (Re)connect to `endpoint`.
    ///
    /// Order: cancel the old receive task and wait for it to finish, reset
    /// `connected`, re-associate the socket, arm a new receive task, then
    /// handshake. Nothing received for the old target can reach the new
    /// session's control handler.
    pub async fn connect(&mut self, endpoint: SocketAddr) -> LinkResult<()> {
        self.stop_reader().await;
        self.state.reset();
        self.state.set_remote_endpoint(endpoint);

        let associated = match self.role {
            Role::Initiator => self.socket.connect(endpoint).await,
            Role::Responder => Ok(()),
        };
        self.start_reader(endpoint);
        associated?;

        let started = Instant::now();
        match self.role {
            Role::Initiator => self.handshake().await,
            Role::Responder => self.await_handshake().await,
        }

        if self.is_connected() {
            self.state.touch_keepalive();
            tracing::debug!(
                peer = %self.peer_id,
                remote = %self.state.remote_endpoint(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "handshake complete"
            );
        } else {
            tracing::warn!(
                peer = %self.peer_id,
                remote = %endpoint,
                "handshake timed out, link left disconnected"
            );
        }
        Ok(())
    }

    /// Re-point this link at a new address of a (possibly different) node.
    ///
    /// Used when hole punching reveals a peer's public endpoint.
    pub async fn change_target(
        &mut self,
        endpoint: SocketAddr,
        peer_id: PeerId,
        decryption_key: Option<Arc<PrivateKey>>,
    ) -> LinkResult<()> {
        tracing::debug!(from = %self.peer_id, to = %peer_id, remote = %endpoint, "changing target");
        self.peer_id = peer_id;
        self.envelope = self.envelope.clone().with_decryption_key(decryption_key);
        self.connect(endpoint).await
    }

    /// Send `syn` until connected or out of attempts.
    async fn handshake(&self) {
        let interval = self.config.handshake_retry_interval;
        for _ in 0..self.config.handshake_attempts() {
            if self.is_connected() {
                break;
            }
            if let Err(e) = self.send_raw(SYN).await {
                tracing::debug!(peer = %self.peer_id, error = %e, "syn send failed");
            }
            tokio::select! {
                _ = self.state.wait_connected() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Wait for the other side's `syn`/`ack` without sending anything.
    async fn await_handshake(&self) {
        let _ = tokio::time::timeout(self.config.handshake_timeout, self.state.wait_connected()).await;
    }

    fn start_reader(&mut self, target: SocketAddr) {
        let reader = Reader {
            socket: self.socket.clone(),
            state: self.state.clone(),
            inbound: self.inbound.clone(),
            envelope: self.envelope.clone(),
            role: self.role,
            target,
            peer_id: self.peer_id,
            buffer_size: self.config.recv_buffer_size,
        };
        self.reader = Some(tokio::spawn(reader.run()));
    }

    async fn stop_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            // Join so no completion of the old task runs after this point.
            let _ = reader.await;
        }
    }

    /// Seal and send an application or control message.
    ///
    /// The inner layer is applied when a peer key is set and `payload` is
    /// not a control literal; the outer layer always is.
    pub async fn send(&self, payload: &str) -> LinkResult<()> {
        let wire = self.envelope.seal(payload)?;
        self.transmit(wire.as_bytes()).await
    }

    /// Send `payload` with no envelope at all.
    pub async fn send_raw(&self, payload: &str) -> LinkResult<()> {
        self.transmit(payload.as_bytes()).await
    }

    /// Send an (enveloped) `keepalive`.
    pub async fn send_keepalive(&self) -> LinkResult<()> {
        self.send(KEEPALIVE).await
    }

    async fn transmit(&self, data: &[u8]) -> LinkResult<()> {
        match self.role {
            Role::Initiator => self.socket.send(data).await?,
            Role::Responder => {
                self.socket
                    .send_to(data, self.state.remote_endpoint())
                    .await?
            }
        };
        Ok(())
    }

    /// Set (or clear) the peer's public key for outbound inner envelopes.
    pub fn set_encryption_key(&mut self, key: Option<Arc<PublicKey>>) {
        self.envelope = self.envelope.clone().with_encryption_key(key);
    }

    /// Pop the oldest inbound application message, if any.
    pub fn try_pop_inbound(&self) -> Option<String> {
        self.inbound.try_pop()
    }

    /// Wait for the next inbound application message.
    pub async fn recv_inbound(&self) -> String {
        self.inbound.pop().await
    }

    /// Number of queued inbound application messages.
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Whether the handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Time of the last liveness signal (or of the handshake).
    pub fn last_keepalive(&self) -> Instant {
        self.state.last_keepalive()
    }

    /// Whether nothing was heard from the peer within `max_idle`.
    pub fn is_stale(&self, max_idle: Duration) -> bool {
        self.state.is_stale(max_idle)
    }

    /// Current remote endpoint.
    pub fn remote_endpoint(&self) -> SocketAddr {
        self.state.remote_endpoint()
    }

    /// Local socket address.
    pub fn local_addr(&self) -> LinkResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Identity of the remote node.
    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    /// Whether inbound inner envelopes can be opened.
    pub fn has_decryption_key(&self) -> bool {
        self.envelope.has_decryption_key()
    }

    /// Bind a game resource to this link, releasing any previous one.
    pub fn attach_game_resource(&self, resource: Box<dyn GameResource>) {
        if let Some(mut previous) = self.game().replace(resource) {
            previous.release();
        }
    }

    /// Detach and release the game resource. Idempotent.
    pub fn release_game_resource(&self) {
        if let Some(mut resource) = self.game().take() {
            resource.release();
        }
    }

    /// Whether a game resource is attached.
    pub fn has_game_resource(&self) -> bool {
        self.game().is_some()
    }

    fn game(&self) -> MutexGuard<'_, Option<Box<dyn GameResource>>> {
        self.game.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop the receive task, wait for it, and close the socket.
    pub async fn shutdown(mut self) {
        self.stop_reader().await;
        tracing::debug!(peer = %self.peer_id, "link shut down");
    }
}

impl Drop for PeerConnection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// The receive loop of one connection.
struct Reader {
    socket: LinkSocket,
    state: Arc<LinkState>,
    inbound: Arc<InboundQueue<String>>,
    envelope: Envelope,
    role: Role,
    target: SocketAddr,
    peer_id: PeerId,
    buffer_size: usize,
}

impl Reader {
    async fn run(self) {
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, from)) => self.on_datagram(&buf[..len], from).await,
                Err(e) => {
                    tracing::debug!(peer = %self.peer_id, error = %e, "receive failed");
                }
            }
        }
    }

    async fn on_datagram(&self, datagram: &[u8], from: SocketAddr) {
        // A datagram from the previous target may still sit in the socket
        // buffer after a re-point.
        if self.role == Role::Initiator && from != self.target {
            tracing::trace!(peer = %self.peer_id, %from, "dropping datagram from foreign endpoint");
            return;
        }

        let classified = match self.envelope.decode(datagram) {
            Ok(classified) => classified,
            Err(e) => {
                tracing::trace!(peer = %self.peer_id, %from, error = %e, "dropping datagram");
                return;
            }
        };

        if self.role == Role::Responder {
            self.state.set_remote_endpoint(from);
        }

        match classified {
            Classified::Control(message) => {
                if self.state.on_control(message) == ControlReply::Ack {
                    if let Err(e) = self.reply_ack(from).await {
                        tracing::debug!(peer = %self.peer_id, error = %e, "ack send failed");
                    }
                }
            }
            Classified::Application(message) => self.inbound.push(message),
        }
    }

    async fn reply_ack(&self, to: SocketAddr) -> LinkResult<usize> {
        match self.role {
            Role::Initiator => self.socket.send(ACK.as_bytes()).await,
            Role::Responder => self.socket.send_to(ACK.as_bytes(), to).await,
        }
    }
}

/// Wildcard address of the same family as `endpoint`.
pub(crate) fn unspecified_like(endpoint: &SocketAddr) -> IpAddr {
    match endpoint {
        SocketAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        SocketAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    }
}
