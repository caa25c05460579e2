use async_trait::async_trait;
use parley_core::{PeerId, SignalPayload};

/// The engine's only way to reach the relay: hand an envelope to whatever
/// forwards it to `target`. Delivery is best-effort.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send_signal(&self, target: PeerId, signal: SignalPayload);
}
