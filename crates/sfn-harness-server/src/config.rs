//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use sfn_harness_config::{HarnessConfig, defaults};
use tracing::warn;

/// Default max body size for execution requests (1 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Primary address. The facade serves here unless another process owns it.
    pub bind_address: SocketAddr,

    /// Fallback address used by the relay when the primary is taken.
    pub proxy_address: SocketAddr,

    /// Enable request logging.
    pub request_logging: bool,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        Self {
            bind_address: SocketAddr::new(ip, defaults::PORT),
            proxy_address: SocketAddr::new(ip, defaults::PROXY_PORT),
            request_logging: true,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[server]` section of a harness config.
    ///
    /// An unparsable bind host falls back to loopback.
    pub fn from_harness(config: &HarnessConfig) -> Self {
        let section = config.server();
        let ip: IpAddr = section.bind.parse().unwrap_or_else(|_| {
            warn!(bind = %section.bind, "Invalid bind address, using 127.0.0.1");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        });
        Self {
            bind_address: SocketAddr::new(ip, section.port),
            proxy_address: SocketAddr::new(ip, section.proxy_port),
            request_logging: section.request_logging,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Set the primary address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the relay fallback address.
    pub fn with_proxy_address(mut self, addr: SocketAddr) -> Self {
        self.proxy_address = addr;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    pub fn with_max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }
}
