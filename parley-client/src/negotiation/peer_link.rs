use crate::negotiation::{CandidateQueue, LinkCommand, RestartDecision, RestartPolicy, RestartScheduler};
use crate::session::{ChannelRegistry, Roster, SessionEvent};
use crate::signal_sink::SignalSink;
use crate::transport::{
    Connectivity, LocalDescription, PeerTransport, SignalingState, TransportEvent, TransportResult,
};
use bytes::Bytes;
use parley_core::{ChannelKind, ChatPayload, IceCandidate, PeerId, Role, SessionDescription, SignalPayload};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Session-wide collaborators every link of a session shares.
#[derive(Clone)]
pub struct LinkShared {
    pub signals: Arc<dyn SignalSink>,
    pub channels: ChannelRegistry,
    pub roster: Roster,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub policy: RestartPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    Answered,
    /// Our own offer was rolled back in favour of the remote one.
    RolledBack,
    /// Colliding offer dropped by the impolite side.
    Ignored,
}

/// Negotiation state towards one remote peer.
///
/// A link owns its transport exclusively and is driven by [`LinkCommand`]s
/// from the session and [`TransportEvent`]s from the transport, handled one
/// at a time by [`run`](Self::run). Offer collisions are settled by
/// [`Role`]: the impolite side ignores a colliding offer, the polite side
/// rolls its own back. Candidates that arrive before a remote description
/// wait in a [`CandidateQueue`]. Connectivity failures trigger ICE restarts
/// with bounded backoff; the link itself survives them.
pub struct PeerLink {
    remote: PeerId,
    role: Role,
    transport: Arc<dyn PeerTransport>,
    shared: LinkShared,
    commands: mpsc::WeakUnboundedSender<LinkCommand>,
    making_offer: bool,
    candidates: CandidateQueue,
    restart: RestartScheduler,
    closed: bool,
}

impl PeerLink {
    /// `commands` is the sending half of this link's own command channel; the
    /// restart timer posts [`LinkCommand::RestartFired`] through it.
    pub fn new(
        local: &PeerId,
        remote: PeerId,
        transport: Arc<dyn PeerTransport>,
        shared: LinkShared,
        commands: mpsc::WeakUnboundedSender<LinkCommand>,
    ) -> Self {
        let role = Role::for_pair(local, &remote);
        let restart = RestartScheduler::new(shared.policy);

        Self {
            remote,
            role,
            transport,
            shared,
            commands,
            making_offer: false,
            candidates: CandidateQueue::new(),
            restart,
            closed: false,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_making_offer(&self) -> bool {
        self.making_offer
    }

    pub fn queued_candidates(&self) -> usize {
        self.candidates.len()
    }

    pub fn restart_attempts(&self) -> u32 {
        self.restart.attempts()
    }

    pub fn is_restart_pending(&self) -> bool {
        self.restart.is_in_flight()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<LinkCommand>,
        mut transport_events: mpsc::Receiver<TransportEvent>,
    ) {
        info!("Link to {} started ({:?})", self.remote, self.role);
        let mut transport_open = true;

        loop {
            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        Some(LinkCommand::Shutdown) | None => {
                            self.shutdown().await;
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                    }
                }

                evt = transport_events.recv(), if transport_open => {
                    match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => {
                            debug!("Transport events for {} ended", self.remote);
                            transport_open = false;
                        }
                    }
                }
            }
        }

        info!("Link to {} finished", self.remote);
    }

    pub async fn handle_command(&mut self, cmd: LinkCommand) {
        if self.closed {
            return;
        }

        match cmd {
            LinkCommand::Negotiate => self.negotiate().await,
            LinkCommand::Remote(signal) => self.handle_signal(signal).await,
            LinkCommand::RestartFired => self.restart_ice().await,
            LinkCommand::Shutdown => self.shutdown().await,
        }
    }

    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        if self.closed {
            return;
        }

        match event {
            TransportEvent::CandidateGenerated(candidate) => {
                self.shared
                    .signals
                    .send_signal(self.remote.clone(), SignalPayload::candidate(candidate))
                    .await;
            }

            TransportEvent::ConnectivityChanged(state) => {
                debug!("Connectivity to {}: {:?}", self.remote, state);
                match state {
                    Connectivity::Failed => self.schedule_restart(),
                    Connectivity::Connected | Connectivity::Completed => {
                        self.restart.on_connected()
                    }
                    _ => {}
                }
            }

            TransportEvent::ChannelOpened(kind) => {
                info!("Channel '{}' to {} is open", kind, self.remote);
                self.shared
                    .channels
                    .register(self.remote.clone(), kind, self.transport.clone());
                let _ = self.shared.events.send(SessionEvent::ChannelOpened {
                    peer_id: self.remote.clone(),
                    kind,
                });
            }

            TransportEvent::ChannelClosed(kind) => {
                info!("Channel '{}' to {} closed", kind, self.remote);
                if self.shared.channels.unregister(&self.remote, kind) {
                    let _ = self.shared.events.send(SessionEvent::ChannelClosed {
                        peer_id: self.remote.clone(),
                        kind,
                    });
                }
            }

            TransportEvent::ChannelError(kind, err) => {
                warn!("Channel '{}' to {} errored: {}", kind, self.remote, err);
            }

            TransportEvent::Message(kind, data) => self.handle_message(kind, data),
        }
    }

    async fn negotiate(&mut self) {
        for kind in ChannelKind::ALL {
            if self.shared.channels.contains(&self.remote, kind) {
                continue;
            }
            if let Err(e) = self.transport.open_channel(kind).await {
                warn!("Failed to open '{}' channel to {}: {}", kind, self.remote, e);
            }
        }

        self.making_offer = true;
        let res = self.send_offer(false).await;
        self.making_offer = false;

        if let Err(e) = res {
            error!("Offer to {} failed: {}", self.remote, e);
        }
    }

    async fn send_offer(&self, ice_restart: bool) -> TransportResult<()> {
        let offer = self.transport.create_offer(ice_restart).await?;
        self.transport
            .set_local_description(LocalDescription::Description(offer.clone()))
            .await?;
        self.shared
            .signals
            .send_signal(self.remote.clone(), SignalPayload::offer(offer))
            .await;
        Ok(())
    }

    /// Fields of one envelope are applied offer first, then answer, then
    /// candidate.
    async fn handle_signal(&mut self, signal: SignalPayload) {
        if let Some(offer) = signal.offer {
            match self.accept_offer(offer).await {
                Ok(outcome) => debug!("Offer from {}: {:?}", self.remote, outcome),
                Err(e) => error!("Failed to handle offer from {}: {}", self.remote, e),
            }
        }

        if let Some(answer) = signal.answer {
            if let Err(e) = self.accept_answer(answer).await {
                error!("Failed to handle answer from {}: {}", self.remote, e);
            }
        }

        if let Some(candidate) = signal.candidate {
            self.accept_candidate(candidate).await;
        }
    }

    pub async fn accept_offer(&mut self, offer: SessionDescription) -> TransportResult<OfferOutcome> {
        let collision =
            self.transport.signaling_state() != SignalingState::Stable || self.making_offer;

        if collision && !self.role.is_polite() {
            debug!("Ignoring colliding offer from {}", self.remote);
            return Ok(OfferOutcome::Ignored);
        }

        if collision {
            debug!("Rolling back local offer for {}", self.remote);
            self.transport
                .set_local_description(LocalDescription::Rollback)
                .await?;
        }

        self.transport.set_remote_description(offer).await?;
        // Queued candidates belong to the description just applied, even if
        // answering fails below.
        self.drain_candidates().await;

        let answer = self.transport.create_answer().await?;
        self.transport
            .set_local_description(LocalDescription::Description(answer.clone()))
            .await?;
        self.shared
            .signals
            .send_signal(self.remote.clone(), SignalPayload::answer(answer))
            .await;

        Ok(if collision {
            OfferOutcome::RolledBack
        } else {
            OfferOutcome::Answered
        })
    }

    pub async fn accept_answer(&mut self, answer: SessionDescription) -> TransportResult<()> {
        self.transport.set_remote_description(answer).await?;
        self.drain_candidates().await;
        Ok(())
    }

    pub async fn accept_candidate(&mut self, candidate: IceCandidate) {
        if !self.transport.has_remote_description().await {
            self.candidates.enqueue(candidate);
            return;
        }

        if let Err(e) = self.transport.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {}", self.remote, e);
        }
    }

    async fn drain_candidates(&mut self) {
        if self.candidates.is_empty() {
            return;
        }

        let transport = self.transport.clone();
        let applied = self
            .candidates
            .drain_into(|candidate| {
                let transport = transport.clone();
                async move { transport.add_ice_candidate(candidate).await }
            })
            .await;

        debug!("Applied {} queued candidates for {}", applied, self.remote);
    }

    fn schedule_restart(&mut self) {
        match self.restart.on_failure() {
            RestartDecision::Schedule(delay) => {
                info!(
                    "Connectivity to {} failed, ICE restart #{} in {:?}",
                    self.remote,
                    self.restart.attempts(),
                    delay
                );
                let commands = self.commands.clone();
                self.restart.arm(delay, move || {
                    if let Some(tx) = commands.upgrade() {
                        let _ = tx.send(LinkCommand::RestartFired);
                    }
                });
            }
            RestartDecision::InFlight => {
                debug!("ICE restart for {} already outstanding", self.remote);
            }
            RestartDecision::Exhausted => {
                warn!(
                    "Giving up on ICE restarts for {} after {} attempts",
                    self.remote,
                    self.restart.attempts()
                );
                let _ = self.shared.events.send(SessionEvent::LinkUnrecoverable {
                    peer_id: self.remote.clone(),
                });
            }
            RestartDecision::GaveUp => {}
        }
    }

    async fn restart_ice(&mut self) {
        self.restart.timer_fired();

        self.making_offer = true;
        let res = self.send_offer(true).await;
        self.making_offer = false;
        self.restart.finish_attempt();

        if let Err(e) = res {
            warn!("ICE restart towards {} failed: {}", self.remote, e);
        }
    }

    fn handle_message(&self, kind: ChannelKind, data: Bytes) {
        match kind {
            ChannelKind::Chat => match serde_json::from_slice::<ChatPayload>(&data) {
                Ok(chat) => {
                    let _ = self.shared.events.send(SessionEvent::Chat {
                        from: self.remote.clone(),
                        display_name: self.shared.roster.display_name(&self.remote),
                        text: chat.msg,
                        ts: chat.ts,
                    });
                }
                Err(e) => warn!("Invalid chat frame from {}: {}", self.remote, e),
            },
            ChannelKind::File => {
                debug!("Dropping {} bytes of file data from {}", data.len(), self.remote);
            }
        }
    }

    /// Cancels the restart timer, forgets queued candidates, unregisters the
    /// link's channels and closes the transport. Only the first call acts.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.restart.cancel();
        self.candidates.clear();
        for kind in ChannelKind::ALL {
            self.shared.channels.unregister(&self.remote, kind);
        }

        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport to {}: {}", self.remote, e);
        }
        info!("Link to {} closed", self.remote);
    }
}
