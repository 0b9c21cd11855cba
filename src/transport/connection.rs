//! Shared liveness state of one link.
//!
//! Written by the receive task (control-message handling), read by callers.
//! Every field is a single flag, timestamp, or address, so an atomic or a
//! short-held lock per field is enough.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use super::protocol::ControlMessage;

/// What the receive task must do after handling a control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlReply {
    /// Nothing to send.
    None,
    /// Answer with a raw `ack`.
    Ack,
}

/// Connection state shared between the receive task and callers.
#[derive(Debug)]
pub struct LinkState {
    /// Handshake completed.
    connected: AtomicBool,
    /// Woken whenever `connected` flips to true.
    connected_notify: Notify,
    /// When we last heard a liveness signal.
    last_keepalive: RwLock<Instant>,
    /// Current remote peer (may change on re-point).
    remote_endpoint: RwLock<SocketAddr>,
}

impl LinkState {
    /// Fresh, disconnected state towards `remote_endpoint`.
    pub fn new(remote_endpoint: SocketAddr) -> Self {
        Self {
            connected: AtomicBool::new(false),
            connected_notify: Notify::new(),
            last_keepalive: RwLock::new(Instant::now()),
            remote_endpoint: RwLock::new(remote_endpoint),
        }
    }

    /// Whether the handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Mark the link disconnected (start of every (re)connect).
    pub fn reset(&self) {
        self.connected.store(false, Ordering::Release);
    }

    fn mark_connected(&self) {
        self.connected.store(true, Ordering::Release);
        self.connected_notify.notify_waiters();
    }

    /// Wait until the link is connected.
    ///
    /// Cancel-safe; callers bound it with a timeout.
    pub async fn wait_connected(&self) {
        loop {
            // Registered before the check so a concurrent notify_waiters
            // is not missed.
            let notified = self.connected_notify.notified();
            if self.is_connected() {
                return;
            }
            notified.await;
        }
    }

    /// Time of the last liveness signal.
    pub fn last_keepalive(&self) -> Instant {
        *self
            .last_keepalive
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a liveness signal now.
    pub fn touch_keepalive(&self) {
        *self
            .last_keepalive
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Whether no liveness signal arrived within `max_idle`.
    pub fn is_stale(&self, max_idle: Duration) -> bool {
        self.last_keepalive().elapsed() > max_idle
    }

    /// Current remote peer.
    pub fn remote_endpoint(&self) -> SocketAddr {
        *self
            .remote_endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Re-point the link.
    pub fn set_remote_endpoint(&self, endpoint: SocketAddr) {
        *self
            .remote_endpoint
            .write()
            .unwrap_or_else(PoisonError::into_inner) = endpoint;
    }

    /// Apply a control message.
    ///
    /// | message     | effect                      |
    /// |-------------|-----------------------------|
    /// | `keepalive` | refresh `last_keepalive`    |
    /// | `syn`       | connected, reply `ack`      |
    /// | `ack`       | connected                   |
    ///
    /// This is the only place `connected` becomes true.
    pub fn on_control(&self, message: ControlMessage) -> ControlReply {
        match message {
            ControlMessage::Keepalive => {
                self.touch_keepalive();
                ControlReply::None
            }
            ControlMessage::Syn => {
                self.mark_connected();
                ControlReply::Ack
            }
            ControlMessage::Ack => {
                self.mark_connected();
                ControlReply::None
            }
        }
    }
}
