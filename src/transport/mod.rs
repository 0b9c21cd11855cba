//! Transport layer shared by every connection variant.
//!
//! - **Envelope codec**: [`Envelope`] wraps and strips the two text layers
//! - **Classification**: [`ProtocolSet`] sorts unwrapped messages into
//!   control and application traffic
//! - **Link state**: [`LinkState`] holds `connected`, keepalive time, and
//!   the remote endpoint
//! - **Inbound queue**: [`InboundQueue`] hands application messages to the
//!   layer above
//! - **Async sockets**: [`LinkSocket`] wrapper for tokio UDP
//!
//! # Data flow
//!
//! ```text
//!  datagram ─► Envelope::open ─► ProtocolSet::classify ─┬─► LinkState::on_control ─► (raw ack)
//!                                                       └─► InboundQueue::push
//!
//!  payload ─► Envelope::seal ─► LinkSocket::send
//! ```

mod connection;
mod envelope;
mod protocol;
mod queue;
mod socket;

pub use connection::{ControlReply, LinkState};
pub use envelope::{seal_outer, strip_layer, wrap_layer, Envelope};
pub use protocol::{Classified, ControlMessage, ProtocolSet};
pub use queue::InboundQueue;
pub use socket::LinkSocket;
