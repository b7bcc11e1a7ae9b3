// HTTP and WebSocket APIs

pub mod health;
pub mod websocket;

pub use health::create_health_router;
pub use websocket::{create_ws_router, ws_handler, WsAppState};

use crate::config::RelayConfig;
use crate::room::RoomRegistry;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the full application router
pub fn create_app(config: &RelayConfig, registry: Arc<RoomRegistry>) -> Router {
    let ws_state = Arc::new(WsAppState {
        registry,
        session: config.session.clone(),
    });

    create_health_router()
        .merge(create_ws_router(ws_state, &config.server.ws_path))
        .layer(CorsLayer::permissive())
}
