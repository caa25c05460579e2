mod candidate_queue;
mod link_command;
mod peer_link;
mod restart_scheduler;

pub use candidate_queue::*;
pub use link_command::*;
pub use peer_link::*;
pub use restart_scheduler::*;
