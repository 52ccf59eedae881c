use std::net::SocketAddr;

use serde::Deserialize;

/// Inbound server configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    pub listen_address: Option<SocketAddr>,
}

impl ServerConfig {
    /// Bind address, defaulting to localhost:4000
    #[must_use]
    pub fn listen_address_or_default(&self) -> SocketAddr {
        self.listen_address
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 4000)))
    }
}
