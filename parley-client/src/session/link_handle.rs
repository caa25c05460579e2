use crate::negotiation::{LinkCommand, LinkShared, PeerLink};
use crate::session::SessionEvent;
use crate::transport::TransportFactory;
use parley_core::PeerId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

const LINK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const TRANSPORT_EVENT_CAPACITY: usize = 256;

/// The session's side of a spawned [`PeerLink`] task.
pub(crate) struct LinkHandle {
    commands: mpsc::UnboundedSender<LinkCommand>,
    task: JoinHandle<()>,
}

impl LinkHandle {
    pub(crate) fn spawn(
        local: PeerId,
        remote: PeerId,
        factory: Arc<dyn TransportFactory>,
        shared: LinkShared,
    ) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let weak = commands.downgrade();

        let task = tokio::spawn(async move {
            let (event_tx, event_rx) = mpsc::channel(TRANSPORT_EVENT_CAPACITY);

            let transport = match factory.create(&remote, event_tx).await {
                Ok(t) => t,
                Err(e) => {
                    error!("Failed to create transport for {}: {}", remote, e);
                    let _ = shared
                        .events
                        .send(SessionEvent::LinkUnrecoverable { peer_id: remote });
                    return;
                }
            };

            PeerLink::new(&local, remote, transport, shared, weak)
                .run(command_rx, event_rx)
                .await;
        });

        Self { commands, task }
    }

    pub(crate) fn send(&self, cmd: LinkCommand) {
        if self.commands.send(cmd).is_err() {
            warn!("Link task is gone, command dropped");
        }
    }

    /// Asks the link to shut down right away. The returned future waits for
    /// the link task and aborts it if it does not finish in time.
    pub(crate) fn retire(self) -> impl Future<Output = ()> + Send + 'static {
        let _ = self.commands.send(LinkCommand::Shutdown);
        let mut task = self.task;

        async move {
            if tokio::time::timeout(LINK_SHUTDOWN_TIMEOUT, &mut task)
                .await
                .is_err()
            {
                warn!("Link did not stop in time, aborting");
                task.abort();
            }
        }
    }
}
