use parley_core::{PeerId, RelayMessage};
use parley_server::SignalingService;
use tokio::sync::mpsc;

/// A relay connection without a socket: frames the relay queues for this
/// peer are read straight from its outbound channel.
pub struct TestPeer {
    pub peer_id: PeerId,
    rx: mpsc::UnboundedReceiver<RelayMessage>,
}

impl TestPeer {
    /// Connects to the relay and consumes the `welcome` / `ice-config` greeting.
    pub fn connect(service: &SignalingService) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let peer_id = service.on_connect(tx);

        match rx.try_recv() {
            Ok(RelayMessage::Welcome { peer_id: id }) => assert_eq!(id, peer_id),
            other => panic!("Expected welcome, got {:?}", other),
        }
        match rx.try_recv() {
            Ok(RelayMessage::IceConfig { .. }) => {}
            other => panic!("Expected ice-config, got {:?}", other),
        }

        Self { peer_id, rx }
    }

    /// Connects and joins `room` in one step.
    pub fn join(service: &SignalingService, room: &str, display_name: Option<&str>) -> Self {
        let peer = Self::connect(service);
        service
            .on_join(&peer.peer_id, room, display_name.map(str::to_owned))
            .expect("join rejected");
        peer
    }

    /// Everything queued for this peer so far.
    pub fn drain(&mut self) -> Vec<RelayMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

pub fn test_service() -> SignalingService {
    SignalingService::new(vec![])
}
