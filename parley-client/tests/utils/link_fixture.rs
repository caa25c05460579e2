use crate::utils::{MockSignalSink, MockTransport, SentSignal};
use parley_client::{ChannelRegistry, LinkCommand, LinkShared, PeerLink, RestartPolicy, Roster, SessionEvent};
use parley_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A [`PeerLink`] driven by hand: tests call its handlers directly and
/// inspect the mock transport and sink afterwards.
pub struct LinkFixture {
    pub link: PeerLink,
    pub transport: Arc<MockTransport>,
    pub sink: MockSignalSink,
    pub signals: mpsc::UnboundedReceiver<SentSignal>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub commands: mpsc::UnboundedReceiver<LinkCommand>,
    pub channels: ChannelRegistry,
    // Keeps the link's weak command sender upgradable.
    _commands_tx: mpsc::UnboundedSender<LinkCommand>,
}

impl LinkFixture {
    pub fn new(local: &str, remote: &str) -> Self {
        Self::with_policy(local, remote, RestartPolicy::default())
    }

    pub fn with_policy(local: &str, remote: &str, policy: RestartPolicy) -> Self {
        let (sink, signals) = MockSignalSink::new();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let (transport_tx, _transport_rx) = mpsc::channel(64);
        let channels = ChannelRegistry::new();

        let transport = Arc::new(MockTransport::new(PeerId::from(remote), transport_tx));
        let shared = LinkShared {
            signals: Arc::new(sink.clone()),
            channels: channels.clone(),
            roster: Roster::new(),
            events: events_tx,
            policy,
        };

        let link = PeerLink::new(
            &PeerId::from(local),
            PeerId::from(remote),
            transport.clone(),
            shared,
            commands_tx.downgrade(),
        );

        Self {
            link,
            transport,
            sink,
            signals,
            events,
            commands,
            channels,
            _commands_tx: commands_tx,
        }
    }

    /// Everything the link has sent since the last call.
    pub fn take_signals(&mut self) -> Vec<SentSignal> {
        let mut out = Vec::new();
        while let Ok(sent) = self.signals.try_recv() {
            out.push(sent);
        }
        out
    }
}
