//! Link configuration.

use std::time::Duration;

use super::constants::{
    HANDSHAKE_RETRY_INTERVAL, HANDSHAKE_TIMEOUT, MAX_DATAGRAM_SIZE, RECV_BUFFER_SIZE,
};
use super::error::{LinkError, LinkResult};

/// Tunables shared by every connection variant.
///
/// The defaults are the protocol constants; tests and embedded deployments
/// shorten the handshake window through [`LinkConfigBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Total time a handshake may take.
    pub handshake_timeout: Duration,

    /// Delay between handshake attempts.
    pub handshake_retry_interval: Duration,

    /// Size of the receive buffer (bytes).
    pub recv_buffer_size: usize,

    /// Largest sealed datagram `send` will accept (bytes).
    pub max_datagram_size: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: HANDSHAKE_TIMEOUT,
            handshake_retry_interval: HANDSHAKE_RETRY_INTERVAL,
            recv_buffer_size: RECV_BUFFER_SIZE,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}

impl LinkConfig {
    /// Number of handshake rounds: ⌈timeout / interval⌉, at least one.
    pub fn handshake_attempts(&self) -> u32 {
        let interval = self.handshake_retry_interval.as_nanos().max(1);
        let rounds = self.handshake_timeout.as_nanos().div_ceil(interval);
        rounds.clamp(1, u32::MAX as u128) as u32
    }
}

/// Builder for [`LinkConfig`].
#[derive(Debug)]
pub struct LinkConfigBuilder {
    config: LinkConfig,
}

impl LinkConfigBuilder {
    /// Create a new builder starting from the defaults.
    pub fn new() -> Self {
        Self {
            config: LinkConfig::default(),
        }
    }

    /// Set the handshake timeout.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Set the delay between handshake attempts.
    pub fn handshake_retry_interval(mut self, interval: Duration) -> Self {
        self.config.handshake_retry_interval = interval;
        self
    }

    /// Set the receive buffer size.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = size;
        self
    }

    /// Set the largest datagram `send` will accept.
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.config.max_datagram_size = size;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> LinkResult<LinkConfig> {
        let config = self.config;
        if config.handshake_retry_interval.is_zero() {
            return Err(LinkError::Config(
                "handshake retry interval must be non-zero".into(),
            ));
        }
        if config.recv_buffer_size == 0 {
            return Err(LinkError::Config("receive buffer must be non-empty".into()));
        }
        if config.max_datagram_size > config.recv_buffer_size {
            return Err(LinkError::Config(format!(
                "max datagram size {} exceeds receive buffer {}",
                config.max_datagram_size, config.recv_buffer_size
            )));
        }
        Ok(config)
    }
}

impl Default for LinkConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
