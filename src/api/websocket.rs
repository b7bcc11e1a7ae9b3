use crate::config::SessionConfig;
use crate::room::RoomRegistry;
use crate::session::ConnectionManager;
use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::info;

/// Shared application state for WebSocket handler
#[derive(Clone)]
pub struct WsAppState {
    pub registry: Arc<RoomRegistry>,
    pub session: SessionConfig,
}

/// GET <ws_path> - WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<WsAppState>>) -> Response {
    info!("WebSocket upgrade request received");
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Create WebSocket router serving `path`
pub fn create_ws_router(state: Arc<WsAppState>, path: &str) -> Router {
    Router::new()
        .route(path, get(ws_handler))
        .with_state(state)
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<WsAppState>) {
    let manager = ConnectionManager::new(Arc::clone(&state.registry), state.session.clone());
    manager.handle(socket).await;
}
