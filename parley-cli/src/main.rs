use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use parley_client::{ClientConfig, Session, SessionEvent, WebRtcTransportFactory, connect_session};
use parley_core::IceServerConfig;
use parley_server::{ServerConfig, SignalingService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Peer-to-peer rooms over a tiny signaling relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, default_value = "0.0.0.0:3001")]
        addr: SocketAddr,

        /// STUN/TURN url announced to clients. Repeatable.
        #[arg(long = "ice-server")]
        ice_servers: Vec<String>,
    },

    /// Join a room and chat with its members.
    Chat {
        #[arg(long, default_value = "ws://127.0.0.1:3001/ws")]
        url: String,

        #[arg(short, long, default_value = "lobby")]
        room: String,

        #[arg(short, long)]
        name: Option<String>,

        /// Overrides the servers announced by the relay. Repeatable.
        #[arg(long = "ice-server")]
        ice_servers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve { addr, ice_servers } => {
            let mut config = ServerConfig {
                bind_addr: addr,
                ..Default::default()
            };
            if !ice_servers.is_empty() {
                config.ice_servers = vec![IceServerConfig::stun(ice_servers)];
            }
            run_relay(config).await
        }

        Commands::Chat {
            url,
            room,
            name,
            ice_servers,
        } => {
            let config = ClientConfig {
                relay_url: url,
                room,
                display_name: name,
                ice_servers: if ice_servers.is_empty() {
                    Vec::new()
                } else {
                    vec![IceServerConfig::stun(ice_servers)]
                },
                ..Default::default()
            };
            run_chat(config).await
        }
    }
}

async fn run_relay(config: ServerConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    println!("{}", "📡 Parley relay is up".green().bold());
    println!("   🔌 WebSocket: ws://{}/ws", config.bind_addr);
    for server in &config.ice_servers {
        println!("   🧊 ICE:       {}", server.urls.join(", "));
    }

    let service = SignalingService::new(config.ice_servers);
    parley_server::serve(listener, service)
        .await
        .context("Relay stopped unexpectedly")
}

async fn run_chat(config: ClientConfig) -> Result<()> {
    let factory = Arc::new(WebRtcTransportFactory::new(config.ice_servers.clone()));
    let (events_tx, mut events) = mpsc::unbounded_channel();

    let (mut session, _relay, mut inbound) = connect_session(&config, factory, events_tx).await?;

    println!(
        "{} {} {}",
        "💬 Joined".green().bold(),
        config.room.cyan().bold(),
        format!("as {}", session.local_id()).dimmed()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            msg = inbound.recv() => {
                match msg {
                    Some(msg) => session.handle_relay_message(msg).await,
                    None => {
                        println!("{}", "Relay connection closed".red());
                        break;
                    }
                }
            }

            event = events.recv() => {
                if let Some(event) = event {
                    print_event(&session, event);
                }
            }

            line = lines.next_line() => {
                match line? {
                    Some(text) if !text.trim().is_empty() => {
                        let reached = session.send_chat(text.trim()).await;
                        if reached == 0 {
                            println!("{}", "(nobody is connected yet)".dimmed());
                        }
                    }
                    Some(_) => {}
                    None => break,
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Leaving room");
    session.shutdown().await;
    Ok(())
}

fn print_event(session: &Session, event: SessionEvent) {
    match event {
        SessionEvent::PeerJoined {
            peer_id,
            display_name,
        } => println!(
            "{} {}",
            "→".green(),
            display_name.unwrap_or_else(|| peer_id.to_string()).bold()
        ),

        SessionEvent::PeerLeft { peer_id } => {
            let who = session
                .roster()
                .display_name(&peer_id)
                .unwrap_or_else(|| peer_id.to_string());
            println!("{} {}", "←".red(), who);
        }

        SessionEvent::ChannelOpened { peer_id, kind } => {
            println!("{}", format!("  {} channel to {} open", kind, peer_id).dimmed())
        }

        SessionEvent::ChannelClosed { peer_id, kind } => {
            println!("{}", format!("  {} channel to {} closed", kind, peer_id).dimmed())
        }

        SessionEvent::Chat {
            from,
            display_name,
            text,
            ..
        } => {
            let who = display_name.unwrap_or_else(|| from.to_string());
            println!("{}: {}", who.cyan().bold(), text);
        }

        SessionEvent::LinkUnrecoverable { peer_id } => println!(
            "{}",
            format!("⚠️  Lost the connection to {} for good", peer_id).yellow()
        ),
    }
}
