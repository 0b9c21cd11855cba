//! PNP demo node
//!
//! Runs one of the three link variants against real UDP sockets.
//!
//! Environment variables:
//! - PNP_MODE: "rendezvous" (default), "peer", or "bootstrap"
//! - PNP_BIND: local address (rendezvous default 0.0.0.0:50000,
//!   bootstrap default 0.0.0.0:50001)
//! - PNP_TARGET: remote endpoint (peer and bootstrap only)
//! - PNP_PEER_ID: numeric id of the remote node (default 0)
//! - PNP_LOG_LEVEL: trace|debug|info|warn|error, overridden by RUST_LOG

mod settings;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::time::Duration;

use pnp_net::core::{LinkConfig, LinkError, STALE_AFTER};
use pnp_net::{BootstrapConnection, PeerConnection, RendezvousConnection};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use settings::{Mode, Settings};

const KEEPALIVE_EVERY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("pnp-node: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let result = tokio::select! {
        result = run(&settings) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "node failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: &Settings) -> Result<(), LinkError> {
    let config = LinkConfig::default();
    match settings.mode {
        Mode::Rendezvous => run_rendezvous(settings, config).await,
        Mode::Peer { target } => run_peer(settings, target, config).await,
        Mode::Bootstrap { hint } => run_bootstrap(settings, hint, config).await,
    }
}

/// Tell every peer which public endpoint it is seen from.
async fn run_rendezvous(settings: &Settings, config: LinkConfig) -> Result<(), LinkError> {
    let root = RendezvousConnection::bind(settings.bind, config).await?;
    tracing::info!(local_addr = %root.local_addr(), "rendezvous listening");

    loop {
        let datagram = root.recv_inbound().await;
        tracing::info!(from = %datagram.from, payload = %datagram.payload, "rendezvous message");
        root.send_to(datagram.from, &format!("rpnp you-are {}", datagram.from))
            .await?;
    }
}

/// Handshake with the target, ask who we are, then keep the link alive.
async fn run_peer(
    settings: &Settings,
    target: SocketAddr,
    config: LinkConfig,
) -> Result<(), LinkError> {
    let link = PeerConnection::open(target, settings.peer_id, config).await?;
    tracing::info!(
        local_addr = %link.local_addr()?,
        remote = %link.remote_endpoint(),
        connected = link.is_connected(),
        "peer link opened"
    );

    link.send("rpnp whoami").await?;
    serve(&link).await
}

/// Wait for a peer to reach us on the fixed port and echo its messages.
async fn run_bootstrap(
    settings: &Settings,
    hint: SocketAddr,
    config: LinkConfig,
) -> Result<(), LinkError> {
    let link = BootstrapConnection::open_on(settings.bind, hint, settings.peer_id, None, config)
        .await?;
    tracing::info!(
        local_addr = %link.local_addr()?,
        connected = link.is_connected(),
        "bootstrap link opened"
    );

    loop {
        let message = link.recv_inbound().await;
        tracing::info!(remote = %link.remote_endpoint(), %message, "echoing");
        link.send(&message).await?;
    }
}

async fn serve(link: &PeerConnection) -> Result<(), LinkError> {
    let mut ticker = tokio::time::interval(KEEPALIVE_EVERY);
    loop {
        tokio::select! {
            message = link.recv_inbound() => {
                tracing::info!(%message, "received");
            }
            _ = ticker.tick() => {
                if link.is_stale(STALE_AFTER) {
                    tracing::warn!(peer = %link.peer_id(), "link is stale");
                }
                link.send_keepalive().await?;
            }
        }
    }
}
