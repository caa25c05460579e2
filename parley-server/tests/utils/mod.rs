pub mod relay_harness;

pub use relay_harness::*;
pub use ws_client::*;
