use crate::config::SessionConfig;
use crate::room::{Connection, RoomRegistry};
use crate::session::handler::Session;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Drives a single WebSocket through the session protocol
pub struct ConnectionManager {
    registry: Arc<RoomRegistry>,
    config: SessionConfig,
}

impl ConnectionManager {
    pub fn new(registry: Arc<RoomRegistry>, config: SessionConfig) -> Self {
        Self { registry, config }
    }

    /// Handle WebSocket connection lifecycle
    ///
    /// A writer task owns the socket sink and drains the connection's
    /// outbound channel; this task reads frames and feeds the session.
    pub async fn handle(self, socket: WebSocket) {
        let (conn, mut outbound_rx) = Connection::channel(self.config.outbound_buffer);
        let connection_id = conn.id();
        let (mut sink, mut stream) = socket.split();

        info!(connection_id = %connection_id, "WebSocket connection established");

        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(frame.to_string())).await {
                    warn!(connection_id = %connection_id, error = %e, "Failed to write frame");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let idle_timeout = match self.config.idle_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let mut session = Session::new(conn, self.registry, &self.config);
        session.open();

        loop {
            let next = match idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        info!(connection_id = %connection_id, "Closing idle connection");
                        break;
                    }
                },
                None => stream.next().await,
            };

            match next {
                Some(Ok(Message::Text(text))) => session.handle_text(&text),
                Some(Ok(Message::Close(_))) | None => {
                    info!(connection_id = %connection_id, "WebSocket client disconnected");
                    break;
                }
                Some(Ok(_)) => {
                    // Binary frames are not part of the protocol; ping/pong is
                    // answered by the WebSocket layer
                    debug!(connection_id = %connection_id, "Ignoring non-text frame");
                }
                Some(Err(e)) => {
                    warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }

        // Leaving the room releases the registry's clone of the sender, so
        // the writer drains what is queued and then exits
        session.close();
        drop(session);
        let _ = writer.await;

        info!(connection_id = %connection_id, "WebSocket connection closed");
    }
}
