//! Many peers talking to one rendezvous listener at once.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use pnp_net::RendezvousConnection;
use pnp_net::core::LinkConfig;
use pnp_net::transport::seal_outer;
use tokio::net::UdpSocket;

const PEERS: usize = 8;

/// Every peer gets exactly one `ack` for its `syn`, and every `rpnp`
/// message is queued once with its own sender endpoint.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fan_in_from_many_peers() {
    let root = RendezvousConnection::bind("127.0.0.1:0".parse().unwrap(), LinkConfig::default())
        .await
        .unwrap();
    let root_addr = root.local_addr();

    let mut tasks = Vec::with_capacity(PEERS);
    for i in 0..PEERS {
        tasks.push(tokio::spawn(async move {
            let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
            socket.send_to(b"syn", root_addr).await.unwrap();

            let mut buf = [0u8; 64];
            let (len, from) = tokio::time::timeout(Duration::from_secs(1), socket.recv_from(&mut buf))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(&buf[..len], b"ack");
            assert_eq!(from, root_addr);

            // Exactly one.
            assert!(
                tokio::time::timeout(Duration::from_millis(100), socket.recv_from(&mut buf))
                    .await
                    .is_err()
            );

            let payload = format!("rpnp hello from {i}");
            let wire = seal_outer(&payload).unwrap();
            socket.send_to(wire.as_bytes(), root_addr).await.unwrap();

            (payload, socket.local_addr().unwrap(), socket)
        }));
    }

    let mut expected: HashMap<String, SocketAddr> = HashMap::new();
    let mut sockets = Vec::new();
    for task in tasks {
        let (payload, addr, socket) = task.await.unwrap();
        expected.insert(payload, addr);
        sockets.push(socket);
    }

    for _ in 0..PEERS {
        let datagram = tokio::time::timeout(Duration::from_secs(1), root.recv_inbound())
            .await
            .unwrap();
        let sender = expected
            .remove(&datagram.payload)
            .expect("unexpected or duplicate payload");
        assert_eq!(datagram.from, sender);
    }

    assert!(expected.is_empty());
    assert_eq!(root.try_pop_inbound(), None);
    assert_eq!(root.messages_received(), PEERS as u64);
}

/// The listener answers a peer at the endpoint it reported.
#[tokio::test]
async fn reply_reaches_reported_sender() {
    let root = RendezvousConnection::bind("127.0.0.1:0".parse().unwrap(), LinkConfig::default())
        .await
        .unwrap();
    let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    let wire = seal_outer("rpnp whoami").unwrap();
    peer.send_to(wire.as_bytes(), root.local_addr()).await.unwrap();

    let datagram = tokio::time::timeout(Duration::from_secs(1), root.recv_inbound())
        .await
        .unwrap();
    root.send_raw_to(datagram.from, &format!("rpnp you-are {}", datagram.from))
        .await
        .unwrap();

    let mut buf = [0u8; 128];
    let (len, _) = tokio::time::timeout(Duration::from_secs(1), peer.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        std::str::from_utf8(&buf[..len]).unwrap(),
        format!("rpnp you-are {}", peer.local_addr().unwrap())
    );

    root.shutdown().await;
}
