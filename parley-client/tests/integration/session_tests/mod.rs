
use parley_client::{RestartPolicy, Session, SessionEvent};
use parley_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::utils::{MockSignalSink, MockTransportFactory, SentSignal};

pub struct SessionFixture {
    pub session: Session,
    pub factory: MockTransportFactory,
    pub sink: MockSignalSink,
    pub signals: mpsc::UnboundedReceiver<SentSignal>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

pub fn session_fixture(local: &str, policy: RestartPolicy) -> SessionFixture {
    let factory = MockTransportFactory::new();
    let (sink, signals) = MockSignalSink::new();
    let (events_tx, events) = mpsc::unbounded_channel();

    let session = Session::new(
        PeerId::from(local),
        Arc::new(factory.clone()),
        Arc::new(sink.clone()),
        policy,
        events_tx,
    );

    SessionFixture {
        session,
        factory,
        sink,
        signals,
        events,
    }
}
