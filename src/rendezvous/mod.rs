//! Rendezvous listener for discovery and NAT hole punching.

mod datagram;
mod server;

pub use datagram::Datagram;
pub use server::RendezvousConnection;
