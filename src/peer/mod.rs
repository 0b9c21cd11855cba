//! Point-to-point links.
//!
//! - [`PeerConnection`]: ephemeral local port, actively sends `syn`
//! - [`BootstrapConnection`]: fixed local port, waits for the other side

mod bootstrap;
mod connection;

pub use bootstrap::BootstrapConnection;
pub use connection::PeerConnection;
