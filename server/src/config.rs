use crate::transport::TransportChannel;
use chaser_shared::{Side, DEFAULT_COOL_PORT, DEFAULT_HOT_PORT, DEFAULT_TIMEOUT_MS};
use std::time::Duration;

/// Network settings for one server run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub cool_port: u16,
    pub hot_port: u16,
    /// Bound on every blocking receive.
    pub idle_timeout: Duration,
    /// Bound on waiting for both players to connect.
    pub peer_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            cool_port: DEFAULT_COOL_PORT,
            hot_port: DEFAULT_HOT_PORT,
            idle_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            peer_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ServerConfig {
    pub fn port(&self, side: Side) -> u16 {
        match side {
            Side::Cool => self.cool_port,
            Side::Hot => self.hot_port,
        }
    }

    pub fn bind_addr(&self, side: Side) -> String {
        format!("{}:{}", self.host, self.port(side))
    }

    /// Builds the (not yet started) channel for `side`.
    pub fn channel(&self, side: Side) -> TransportChannel {
        TransportChannel::new(side, self.bind_addr(side), self.idle_timeout)
    }

    /// Both channels, indexed by [`Side::index`].
    pub fn channels(&self) -> [TransportChannel; 2] {
        Side::ALL.map(|side| self.channel(side))
    }
}
