//! Async UDP socket wrapper.
//!
//! One [`LinkSocket`] is bound once per connection and never rebound; a
//! peer connection only re-associates it with a new remote endpoint.
//! Clones share the same OS socket, which is closed when the last clone is
//! dropped.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::core::{LinkConfig, LinkError, LinkResult};

/// Shared handle to a bound UDP socket.
#[derive(Debug, Clone)]
pub struct LinkSocket {
    /// The underlying UDP socket.
    socket: Arc<UdpSocket>,
    /// Largest datagram we send.
    max_datagram_size: usize,
}

impl LinkSocket {
    /// Bind a new socket. Port 0 picks an ephemeral port.
    pub async fn bind(addr: SocketAddr, config: &LinkConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self::from_socket(socket, config))
    }

    /// Wrap an existing UDP socket.
    pub fn from_socket(socket: UdpSocket, config: &LinkConfig) -> Self {
        Self {
            socket: Arc::new(socket),
            max_datagram_size: config.max_datagram_size,
        }
    }

    /// Get the local address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Associate the socket with one remote endpoint.
    ///
    /// Afterwards the OS only delivers datagrams from that endpoint and
    /// [`send`](Self::send) targets it.
    pub async fn connect(&self, addr: SocketAddr) -> io::Result<()> {
        self.socket.connect(addr).await
    }

    /// Send to the associated endpoint.
    pub async fn send(&self, data: &[u8]) -> LinkResult<usize> {
        self.check_size(data)?;
        Ok(self.socket.send(data).await?)
    }

    /// Send to a specific endpoint.
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> LinkResult<usize> {
        self.check_size(data)?;
        Ok(self.socket.send_to(data, addr).await?)
    }

    /// Receive one datagram into `buf`.
    pub async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf).await
    }

    fn check_size(&self, data: &[u8]) -> LinkResult<()> {
        if data.len() > self.max_datagram_size {
            return Err(LinkError::PayloadTooLarge {
                size: data.len(),
                max: self.max_datagram_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LinkConfigBuilder;

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn test_socket_bind() {
        let socket = LinkSocket::bind(loopback(), &LinkConfig::default())
            .await
            .unwrap();
        let addr = socket.local_addr().unwrap();
        assert!(addr.port() != 0);
    }

    #[tokio::test]
    async fn test_socket_send_recv() {
        let config = LinkConfig::default();
        let server = LinkSocket::bind(loopback(), &config).await.unwrap();
        let server_addr = server.local_addr().unwrap();
        let client = LinkSocket::bind(loopback(), &config).await.unwrap();

        client.send_to(b"pnp hello", server_addr).await.unwrap();

        let mut buf = [0u8; 64];
        let (len, from) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"pnp hello");
        assert_eq!(from, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_socket_connected() {
        let config = LinkConfig::default();
        let server = LinkSocket::bind(loopback(), &config).await.unwrap();
        let server_addr = server.local_addr().unwrap();
        let client = LinkSocket::bind(loopback(), &config).await.unwrap();
        client.connect(server_addr).await.unwrap();

        client.send(b"syn").await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"syn");
    }

    #[tokio::test]
    async fn test_oversized_datagram_rejected() {
        let config = LinkConfigBuilder::new()
            .recv_buffer_size(1024)
            .max_datagram_size(16)
            .build()
            .unwrap();
        let socket = LinkSocket::bind(loopback(), &config).await.unwrap();
        let target = socket.local_addr().unwrap();

        let result = socket.send_to(&[b'p'; 17], target).await;
        assert!(matches!(
            result,
            Err(LinkError::PayloadTooLarge { size: 17, max: 16 })
        ));
    }
}
