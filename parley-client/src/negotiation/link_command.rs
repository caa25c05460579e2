use parley_core::SignalPayload;

/// Messages a [`PeerLink`](crate::PeerLink) processes, one at a time, in
/// arrival order.
#[derive(Debug, Clone)]
pub enum LinkCommand {
    /// The remote peer just arrived; start negotiation from this side.
    Negotiate,

    /// An envelope relayed from the remote peer.
    Remote(SignalPayload),

    /// The ICE-restart backoff timer elapsed.
    RestartFired,

    Shutdown,
}
