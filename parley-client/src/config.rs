use crate::negotiation::RestartPolicy;
use parley_core::IceServerConfig;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay, e.g. `ws://127.0.0.1:3001/ws`.
    pub relay_url: String,
    pub room: String,
    pub display_name: Option<String>,
    /// When empty, the servers announced by the relay are used.
    pub ice_servers: Vec<IceServerConfig>,
    pub restart: RestartPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "ws://127.0.0.1:3001/ws".to_owned(),
            room: "lobby".to_owned(),
            display_name: None,
            ice_servers: Vec::new(),
            restart: RestartPolicy::default(),
        }
    }
}
