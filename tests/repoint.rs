//! Re-pointing a live link at a new endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pnp_net::PeerConnection;
use pnp_net::core::{LinkConfig, LinkConfigBuilder, PeerId};
use tokio::net::UdpSocket;

fn config() -> LinkConfig {
    LinkConfigBuilder::new()
        .handshake_timeout(Duration::from_millis(200))
        .handshake_retry_interval(Duration::from_millis(20))
        .build()
        .unwrap()
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

/// An `ack` from the previous target never connects the re-pointed link;
/// one from the new target does.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_ack_from_old_target_is_ignored() {
    let old = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
    let new = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let old_addr = old.local_addr().unwrap();
    let new_addr = new.local_addr().unwrap();

    let mut link = PeerConnection::open(old_addr, PeerId(1), config())
        .await
        .unwrap();
    assert!(!link.is_connected());
    let link_addr = SocketAddr::from(([127, 0, 0, 1], link.local_addr().unwrap().port()));

    // The old target keeps acking for the whole re-point.
    let spammer = tokio::spawn({
        let old = old.clone();
        async move {
            loop {
                let _ = old.send_to(b"ack", link_addr).await;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    });

    link.change_target(new_addr, PeerId(2), None).await.unwrap();

    assert!(!link.is_connected());
    assert_eq!(link.remote_endpoint(), new_addr);
    assert_eq!(link.peer_id(), PeerId(2));

    // Still nothing after the handshake window.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!link.is_connected());
    spammer.abort();

    // The handshake went to the new target.
    let mut buf = [0u8; 16];
    let (len, from) = tokio::time::timeout(Duration::from_secs(1), new.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&buf[..len], b"syn");
    assert_eq!(from.port(), link_addr.port());

    new.send_to(b"ack", link_addr).await.unwrap();
    assert!(wait_until(Duration::from_secs(1), || link.is_connected()).await);
}

/// Re-pointing a connected link resets it before the new handshake.
#[tokio::test]
async fn repoint_resets_connected_link() {
    let first = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let first_addr = first.local_addr().unwrap();

    let acker = tokio::spawn(async move {
        let mut buf = [0u8; 16];
        let (_, from) = first.recv_from(&mut buf).await.unwrap();
        first.send_to(b"ack", from).await.unwrap();
        first
    });

    let mut link = PeerConnection::open(first_addr, PeerId(1), config())
        .await
        .unwrap();
    assert!(link.is_connected());
    let _first = acker.await.unwrap();

    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    link.change_target(silent.local_addr().unwrap(), PeerId(2), None)
        .await
        .unwrap();
    assert!(!link.is_connected());
    assert_eq!(link.remote_endpoint(), silent.local_addr().unwrap());
}
