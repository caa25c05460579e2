use parley_core::IceCandidate;
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use tracing::warn;

/// Candidates that arrived before the remote description was applied.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<IceCandidate>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: IceCandidate) {
        self.pending.push_back(candidate);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Applies every queued candidate in arrival order and empties the queue.
    /// A failed candidate is logged and skipped. Returns how many applied.
    pub async fn drain_into<F, Fut, E>(&mut self, mut apply: F) -> usize
    where
        F: FnMut(IceCandidate) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let mut applied = 0;

        while let Some(candidate) = self.pending.pop_front() {
            match apply(candidate).await {
                Ok(()) => applied += 1,
                Err(e) => warn!("Failed to apply queued ICE candidate: {}", e),
            }
        }

        applied
    }
}
