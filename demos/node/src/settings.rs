//! Environment configuration of the demo node.

use std::env;
use std::net::SocketAddr;

use pnp_net::core::{PeerId, RENDEZVOUS_PORT};
use thiserror::Error;

/// Errors while reading the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("PNP_TARGET is required in {0} mode")]
    MissingTarget(&'static str),

    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("unknown PNP_MODE {0:?} (expected rendezvous, peer, or bootstrap)")]
    UnknownMode(String),
}

/// What this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Rendezvous,
    /// Handshake with `target`.
    Peer { target: SocketAddr },
    /// Wait for a peer; `hint` is replaced by the first sender.
    Bootstrap { hint: SocketAddr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mode: Mode,
    pub bind: SocketAddr,
    pub peer_id: PeerId,
    pub log_level: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let target = parse_var(&lookup, "PNP_TARGET")?;
        let mode = match lookup("PNP_MODE").as_deref() {
            None | Some("rendezvous") => Mode::Rendezvous,
            Some("peer") => Mode::Peer {
                target: target.ok_or(SettingsError::MissingTarget("peer"))?,
            },
            Some("bootstrap") => Mode::Bootstrap {
                hint: target.ok_or(SettingsError::MissingTarget("bootstrap"))?,
            },
            Some(other) => return Err(SettingsError::UnknownMode(other.to_string())),
        };

        let default_bind = match mode {
            Mode::Rendezvous => SocketAddr::from(([0, 0, 0, 0], RENDEZVOUS_PORT)),
            Mode::Bootstrap { .. } => SocketAddr::from(([0, 0, 0, 0], RENDEZVOUS_PORT + 1)),
            Mode::Peer { .. } => SocketAddr::from(([0, 0, 0, 0], 0)),
        };
        let bind = parse_var(&lookup, "PNP_BIND")?.unwrap_or(default_bind);
        let peer_id = PeerId(parse_var(&lookup, "PNP_PEER_ID")?.unwrap_or(0));
        let log_level = lookup("PNP_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            mode,
            bind,
            peer_id,
            log_level,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, SettingsError> {
    match lookup(name) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| SettingsError::Invalid { name, value }),
        None => Ok(None),
    }
}
