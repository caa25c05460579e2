use parley_core::IceServerConfig;
use parley_core::utils::default_stun_urls;
use std::net::SocketAddr;

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Handed to every client in the `ice-config` frame.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            ice_servers: vec![IceServerConfig::stun(default_stun_urls())],
        }
    }
}
