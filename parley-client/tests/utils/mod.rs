pub mod link_fixture;

pub use link_fixture::*;
pub use mock_signal_sink::*;
pub use mock_transport::*;
pub use waiting::*;
