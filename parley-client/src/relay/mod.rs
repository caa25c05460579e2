mod relay_client;
mod session_connector;

pub use relay_client::*;
pub use session_connector::*;
