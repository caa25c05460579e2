mod config;
mod negotiation;
mod relay;
mod session;
mod signal_sink;
mod transport;

pub use config::*;
pub use negotiation::*;
pub use relay::*;
pub use session::*;
pub use signal_sink::*;
pub use transport::*;
