mod channel;
mod chat;
mod peer;
mod room;
mod signaling;

pub use channel::ChannelKind;
pub use chat::ChatPayload;
pub use peer::{PeerId, Role};
pub use room::RoomId;
pub use signaling::{
    ClientMessage, IceCandidate, IceServerConfig, RelayMessage, SdpKind, SessionDescription,
    SignalPayload,
};
