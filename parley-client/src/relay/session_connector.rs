use crate::config::ClientConfig;
use crate::relay::RelayClient;
use crate::session::{Session, SessionEvent};
use crate::transport::TransportFactory;
use anyhow::{Context, bail};
use parley_core::RelayMessage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

const WELCOME_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to the relay, waits for the identity it assigns, joins the
/// configured room and builds a [`Session`] around that identity.
///
/// The returned receiver carries every later relay frame; feed them to
/// [`Session::handle_relay_message`].
pub async fn connect_session(
    config: &ClientConfig,
    factory: Arc<dyn TransportFactory>,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> anyhow::Result<(Session, RelayClient, mpsc::UnboundedReceiver<RelayMessage>)> {
    let (relay, mut inbound) = RelayClient::connect(&config.relay_url).await?;

    let local_id = tokio::time::timeout(WELCOME_TIMEOUT, async {
        while let Some(msg) = inbound.recv().await {
            match msg {
                RelayMessage::Welcome { peer_id } => return Some(peer_id),
                other => debug!("Frame before welcome ignored: {:?}", other),
            }
        }
        None
    })
    .await
    .context("Timed out waiting for relay welcome")?;

    let Some(local_id) = local_id else {
        bail!("Relay closed the connection before welcome");
    };
    info!("Connected to relay as {}", local_id);

    relay.join(&config.room, config.display_name.clone())?;

    let session = Session::new(
        local_id,
        factory,
        Arc::new(relay.clone()),
        config.restart,
        events,
    );

    Ok((session, relay, inbound))
}
