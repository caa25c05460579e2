mod channel_registry;
mod link_handle;
mod roster;
mod session;
mod session_event;

pub use channel_registry::*;
pub use roster::*;
pub use session::*;
pub use session_event::*;
