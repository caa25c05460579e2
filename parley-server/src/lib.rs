mod config;
mod presence;
mod signaling;

pub use config::*;
pub use presence::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Relay routes: the signaling WebSocket lives at `/ws`. Any origin may
/// connect so browser clients served elsewhere can reach it.
pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(service)
}

/// Runs the relay on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, service: SignalingService) -> std::io::Result<()> {
    axum::serve(listener, router(service)).await
}
