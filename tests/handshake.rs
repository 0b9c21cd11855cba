//! Loopback integration tests for the syn/ack handshake and keepalive.
//!
//! Each test binds real `tokio::net::UdpSocket`s on 127.0.0.1 and bounds
//! every wait with a timeout.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pnp_net::core::{LinkConfig, LinkConfigBuilder, PeerId};
use pnp_net::crypto::Keypair;
use pnp_net::transport::seal_outer;
use pnp_net::{BootstrapConnection, PeerConnection};
use tokio::net::UdpSocket;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(timeout_ms: u64, interval_ms: u64) -> LinkConfig {
    LinkConfigBuilder::new()
        .handshake_timeout(Duration::from_millis(timeout_ms))
        .handshake_retry_interval(Duration::from_millis(interval_ms))
        .build()
        .unwrap()
}

/// Reserve a loopback port for a bootstrap link.
fn free_port() -> u16 {
    std::net::UdpSocket::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn loopback(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Start a bootstrap link in the background and open a peer link against it.
async fn linked_pair(
    config: LinkConfig,
    bootstrap_key: Option<Arc<pnp_net::crypto::PrivateKey>>,
) -> (PeerConnection, BootstrapConnection) {
    let bootstrap_addr = loopback(free_port());
    // The bootstrap side learns the peer endpoint from its first datagram.
    let hint = loopback(9);

    let bootstrap = tokio::spawn(BootstrapConnection::open_on(
        bootstrap_addr,
        hint,
        PeerId(2),
        bootstrap_key,
        config.clone(),
    ));

    let peer = PeerConnection::open(bootstrap_addr, PeerId(1), config)
        .await
        .expect("peer open failed");
    let bootstrap = bootstrap
        .await
        .expect("bootstrap task panicked")
        .expect("bootstrap open failed");

    (peer, bootstrap)
}

async fn wait_until(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// A peer and a bootstrap link opened against each other both connect
/// within the handshake window.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn peer_and_bootstrap_both_connect() {
    let config = config(2000, 50);
    let started = Instant::now();

    let (peer, bootstrap) = linked_pair(config.clone(), None).await;

    assert!(peer.is_connected());
    assert!(bootstrap.is_connected());
    assert!(started.elapsed() < config.handshake_timeout);
    assert_eq!(
        bootstrap.remote_endpoint().port(),
        peer.local_addr().unwrap().port()
    );
}

/// With nobody answering, the peer sends exactly ⌈timeout/interval⌉ syns
/// and stays disconnected.
#[tokio::test]
async fn unanswered_handshake_times_out() {
    let config = config(300, 50);
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let started = Instant::now();
    let link = PeerConnection::open(silent.local_addr().unwrap(), PeerId(1), config.clone())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert!(!link.is_connected());
    assert!(elapsed >= config.handshake_timeout);

    let mut syns = 0;
    let mut buf = [0u8; 16];
    while let Ok(received) =
        tokio::time::timeout(Duration::from_millis(100), silent.recv_from(&mut buf)).await
    {
        let (len, _) = received.unwrap();
        assert_eq!(&buf[..len], b"syn");
        syns += 1;
    }
    assert_eq!(syns, config.handshake_attempts());
    assert_eq!(syns, 6);
}

/// A late ack still connects a link whose handshake timed out.
#[tokio::test]
async fn late_ack_connects_timed_out_link() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let link = PeerConnection::open(silent.local_addr().unwrap(), PeerId(1), config(60, 20))
        .await
        .unwrap();
    assert!(!link.is_connected());

    let link_addr = loopback(link.local_addr().unwrap().port());
    silent.send_to(b"ack", link_addr).await.unwrap();

    assert!(wait_until(Duration::from_secs(1), || link.is_connected()).await);
}

/// Keepalive refreshes the timestamp on the other side without touching
/// `connected`.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn keepalive_updates_timestamp() {
    let (peer, bootstrap) = linked_pair(config(2000, 50), None).await;

    let before = Instant::now();
    peer.send_keepalive().await.unwrap();
    assert!(wait_until(Duration::from_secs(1), || bootstrap.last_keepalive() >= before).await);
    assert!(bootstrap.is_connected());

    // And the other way round, towards the adopted endpoint.
    let before = Instant::now();
    bootstrap.send_keepalive().await.unwrap();
    assert!(wait_until(Duration::from_secs(1), || peer.last_keepalive() >= before).await);
    assert!(peer.is_connected());
    assert!(!peer.is_stale(Duration::from_secs(60)));
}

/// Keepalive on a disconnected link does not connect it.
#[tokio::test]
async fn keepalive_does_not_connect() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let link = PeerConnection::open(silent.local_addr().unwrap(), PeerId(1), config(60, 20))
        .await
        .unwrap();
    let link_addr = loopback(link.local_addr().unwrap().port());

    let before = Instant::now();
    let wire = seal_outer("keepalive").unwrap();
    silent.send_to(wire.as_bytes(), link_addr).await.unwrap();

    assert!(wait_until(Duration::from_secs(1), || link.last_keepalive() >= before).await);
    assert!(!link.is_connected());
}

/// Application messages cross the link in both directions, with the inner
/// layer when a key is configured.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn application_messages_both_ways() {
    let bootstrap_keys = Keypair::generate();
    let (mut peer, bootstrap) = linked_pair(
        config(2000, 50),
        Some(Arc::new(bootstrap_keys.private_key().clone())),
    )
    .await;
    assert!(bootstrap.has_decryption_key());

    peer.set_encryption_key(Some(Arc::new(*bootstrap_keys.public_key())));
    peer.send("cpnp e2e4").await.unwrap();
    peer.send("not a node message").await.unwrap();
    peer.send("pnp ping").await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(1), bootstrap.recv_inbound())
        .await
        .unwrap();
    let second = tokio::time::timeout(Duration::from_secs(1), bootstrap.recv_inbound())
        .await
        .unwrap();
    assert_eq!(first, "cpnp e2e4");
    assert_eq!(second, "pnp ping");

    bootstrap.send("rpnp pong").await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(1), peer.recv_inbound())
        .await
        .unwrap();
    assert_eq!(reply, "rpnp pong");
    assert_eq!(peer.inbound_len(), 0);
}

/// Shutdown is clean on both variants.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_closes_both_sides() {
    let (peer, bootstrap) = linked_pair(config(2000, 50), None).await;
    let bootstrap_addr = bootstrap.local_addr().unwrap();

    peer.shutdown().await;
    bootstrap.shutdown().await;

    // The fixed port is free again.
    UdpSocket::bind(bootstrap_addr).await.unwrap();
}
