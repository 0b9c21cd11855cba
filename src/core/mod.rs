//! Core types shared by every layer: constants, configuration, errors,
//! peer identifiers, and the game-resource trait.

mod config;
pub mod constants;
mod error;
mod id;
mod traits;

pub use config::{LinkConfig, LinkConfigBuilder};
pub use constants::*;
pub use error::{CryptoError, EnvelopeError, LinkError, LinkResult};
pub use id::PeerId;
pub use traits::GameResource;
