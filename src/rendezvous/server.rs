//! Rendezvous listener.
//!
//! One socket on a well-known port serving any number of peers. There is no
//! per-peer state: every datagram is handled on its own, keyed by its
//! sender endpoint.
//!
//! - raw or enveloped `syn` → immediate raw `ack` to that sender
//! - `rpnp...` → queued as a [`Datagram`] with the sender endpoint
//! - anything else → dropped

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::datagram::Datagram;
use crate::core::{LinkConfig, LinkResult, ACK, RENDEZVOUS_PORT};
use crate::transport::{
    seal_outer, Classified, ControlMessage, Envelope, InboundQueue, LinkSocket, ProtocolSet,
};

/// The well-known-port listener used for discovery and introductions.
///
/// Requires a running tokio runtime.
///
/// # Example
///
/// ```ignore
/// use pnp_net::core::LinkConfig;
/// use pnp_net::rendezvous::RendezvousConnection;
///
/// let root = RendezvousConnection::bind_default(LinkConfig::default()).await?;
///
/// loop {
///     let datagram = root.recv_inbound().await;
///     // Tell the peer what its public endpoint is.
///     root.send_to(datagram.from, &format!("rpnp you-are {}", datagram.from)).await?;
/// }
/// ```
pub struct RendezvousConnection {
    /// The bound socket (shared with the receive task).
    socket: LinkSocket,
    /// Application messages from every peer.
    inbound: Arc<InboundQueue<Datagram>>,
    /// The receive task.
    reader: Option<JoinHandle<()>>,
    /// Bound address.
    local_addr: SocketAddr,
}

impl RendezvousConnection {
    /// Bind `addr` and start serving.
    pub async fn bind(addr: SocketAddr, config: LinkConfig) -> LinkResult<Self> {
        let socket = LinkSocket::bind(addr, &config).await?;
        let local_addr = socket.local_addr()?;
        let inbound = Arc::new(InboundQueue::new());

        let listener = Listener {
            socket: socket.clone(),
            inbound: inbound.clone(),
            envelope: Envelope::new(ProtocolSet::RENDEZVOUS),
            buffer_size: config.recv_buffer_size,
        };
        let reader = tokio::spawn(listener.run());

        tracing::debug!(%local_addr, "rendezvous listener bound");

        Ok(Self {
            socket,
            inbound,
            reader: Some(reader),
            local_addr,
        })
    }

    /// Bind the well-known port on every IPv4 interface.
    pub async fn bind_default(config: LinkConfig) -> LinkResult<Self> {
        Self::bind(
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, RENDEZVOUS_PORT)),
            config,
        )
        .await
    }

    /// Get the local address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Seal `payload` in the outer layer and send it to `endpoint`.
    pub async fn send_to(&self, endpoint: SocketAddr, payload: &str) -> LinkResult<()> {
        let wire = seal_outer(payload)?;
        self.socket.send_to(wire.as_bytes(), endpoint).await?;
        Ok(())
    }

    /// Send `payload` to `endpoint` with no envelope.
    pub async fn send_raw_to(&self, endpoint: SocketAddr, payload: &str) -> LinkResult<()> {
        self.socket.send_to(payload.as_bytes(), endpoint).await?;
        Ok(())
    }

    /// Pop the oldest queued message, if any.
    pub fn try_pop_inbound(&self) -> Option<Datagram> {
        self.inbound.try_pop()
    }

    /// Wait for the next queued message.
    pub async fn recv_inbound(&self) -> Datagram {
        self.inbound.pop().await
    }

    /// Number of queued messages.
    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    /// Total number of application messages accepted so far.
    pub fn messages_received(&self) -> u64 {
        self.inbound.messages_received()
    }

    /// Stop the receive task, wait for it, and close the socket.
    pub async fn shutdown(mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            let _ = reader.await;
        }
        tracing::debug!(local_addr = %self.local_addr, "rendezvous listener shut down");
    }
}

impl Drop for RendezvousConnection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// The receive loop of the listener.
struct Listener {
    socket: LinkSocket,
    inbound: Arc<InboundQueue<Datagram>>,
    envelope: Envelope,
    buffer_size: usize,
}

impl Listener {
    async fn run(self) {
        let mut buf = vec![0u8; self.buffer_size];
        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, from)) => self.on_datagram(&buf[..len], from).await,
                Err(e) => {
                    tracing::debug!(error = %e, "rendezvous receive failed");
                }
            }
        }
    }

    async fn on_datagram(&self, datagram: &[u8], from: SocketAddr) {
        match self.envelope.decode(datagram) {
            Ok(Classified::Application(payload)) => {
                self.inbound.push(Datagram { from, payload });
            }
            Ok(Classified::Control(ControlMessage::Syn)) => {
                if let Err(e) = self.socket.send_to(ACK.as_bytes(), from).await {
                    tracing::debug!(%from, error = %e, "ack send failed");
                }
            }
            other => {
                tracing::trace!(%from, outcome = ?other, "dropping datagram");
            }
        }
    }
}
