use parley_core::PeerId;
use thiserror::Error;

/// Reasons a client frame is rejected at the relay boundary.
/// A rejected frame never mutates relay state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelayError {
    #[error("room id must not be empty")]
    InvalidRoom,

    #[error("signal payload carries no offer, answer or candidate")]
    EmptySignal,

    #[error("no live connection for {0}")]
    UnknownConnection(PeerId),
}
