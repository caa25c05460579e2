mod relay_error;
mod signaling_service;
mod ws_handler;

pub use relay_error::*;
pub use signaling_service::*;
pub use ws_handler::*;
