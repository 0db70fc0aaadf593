use std::net::SocketAddr;
use std::time::Duration;

use crate::osc::Coercion;

/// Largest datagram accepted by default.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 32768;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_packet_size: usize,
    pub coercion: Coercion,
    pub incoming_patterns: bool,
    // How long the server thread blocks on the socket before checking for a stop request.
    // ServerThread waits at least 1ms.
    pub poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            coercion: Coercion::Loose,
            incoming_patterns: false,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl ServerConfig {
    pub fn with_bind_addr(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn with_max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = size;
        self
    }

    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    pub fn with_incoming_patterns(mut self, enabled: bool) -> Self {
        self.incoming_patterns = enabled;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
