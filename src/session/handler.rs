use crate::config::SessionConfig;
use crate::room::{Connection, ConnectionId, RoomRegistry};
use crate::session::protocol::{
    field_text, normalize_chat, ClientMessage, ServerMessage, JOIN_FIRST, MISSING_JOIN_FIELDS,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Per-connection session state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unjoined,
    Joined { room_id: String, user_id: String },
}

/// Protocol state machine for one connection.
///
/// Transport-agnostic: inbound text goes in through `handle_text`, outbound
/// frames leave through the connection's channel. Messages for one session
/// are processed strictly in order by its owner.
pub struct Session {
    conn: Connection,
    registry: Arc<RoomRegistry>,
    chat_max_chars: usize,
    state: SessionState,
}

impl Session {
    pub fn new(conn: Connection, registry: Arc<RoomRegistry>, config: &SessionConfig) -> Self {
        Self {
            conn,
            registry,
            chat_max_chars: config.chat_max_chars,
            state: SessionState::Unjoined,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Greet a freshly opened connection
    pub fn open(&self) {
        self.reply(&ServerMessage::hello());
    }

    /// Handle one raw text frame. Unparseable input is dropped.
    pub fn handle_text(&mut self, raw: &str) {
        match ClientMessage::parse(raw) {
            Some(msg) => self.handle(msg),
            None => debug!(connection_id = %self.id(), "Dropping malformed message"),
        }
    }

    /// Apply one inbound message
    pub fn handle(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::Join { room_id, user_id } => {
                let room_id = field_text(room_id.as_ref()).trim().to_string();
                let user_id = field_text(user_id.as_ref()).trim().to_string();
                self.join(room_id, user_id);
            }
            ClientMessage::Event { event } => {
                if let Some((room_id, user_id)) = self.require_joined() {
                    self.relay_event(room_id, user_id, event);
                }
            }
            ClientMessage::Chat { text } => {
                if let Some((room_id, user_id)) = self.require_joined() {
                    self.relay_chat(room_id, user_id, &field_text(text.as_ref()));
                }
            }
            ClientMessage::Ping {} => {
                if self.require_joined().is_some() {
                    self.reply(&ServerMessage::pong());
                }
            }
        }
    }

    /// Current room and user, or an `ERROR` reply if not joined yet
    fn require_joined(&self) -> Option<(&str, &str)> {
        match &self.state {
            SessionState::Joined { room_id, user_id } => Some((room_id.as_str(), user_id.as_str())),
            SessionState::Unjoined => {
                self.reply(&ServerMessage::error(JOIN_FIRST));
                None
            }
        }
    }

    /// Leave the current room and tell the remaining members.
    ///
    /// Idempotent; also runs on drop.
    pub fn close(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Unjoined);
        let Some(room_id) = self.registry.leave(self.id()) else {
            return;
        };

        let user_id = match state {
            SessionState::Joined { user_id, .. } => user_id,
            SessionState::Unjoined => String::new(),
        };
        info!(connection_id = %self.id(), room_id = %room_id, user_id = %user_id, "User left room");

        self.broadcast(&room_id, &ServerMessage::UserLeft { user_id }, Some(self.id()));
    }

    fn join(&mut self, room_id: String, user_id: String) {
        if room_id.is_empty() || user_id.is_empty() {
            self.reply(&ServerMessage::error(MISSING_JOIN_FIELDS));
            return;
        }

        let outcome = self.registry.join(&room_id, &self.conn);
        match outcome.previous.as_deref() {
            Some(previous) if previous != room_id => {
                info!(
                    connection_id = %self.id(),
                    from = %previous,
                    room_id = %room_id,
                    user_id = %user_id,
                    "User switched room"
                );
            }
            _ => {
                info!(connection_id = %self.id(), room_id = %room_id, user_id = %user_id, "User joined room");
            }
        }

        self.reply(&ServerMessage::Joined {
            room_id: room_id.clone(),
            user_id: user_id.clone(),
        });
        self.broadcast(
            &room_id,
            &ServerMessage::UserJoined {
                user_id: user_id.clone(),
            },
            Some(self.id()),
        );

        self.state = SessionState::Joined { room_id, user_id };
    }

    fn relay_event(&self, room_id: &str, user_id: &str, event: Value) {
        let msg = ServerMessage::Event {
            from: user_id.to_string(),
            event,
        };
        self.broadcast(room_id, &msg, Some(self.id()));
    }

    /// Chat is echoed back to the sender
    fn relay_chat(&self, room_id: &str, user_id: &str, text: &str) {
        let Some(text) = normalize_chat(text, self.chat_max_chars) else {
            return;
        };
        self.broadcast(room_id, &ServerMessage::chat(user_id, text), None);
    }

    fn reply(&self, msg: &ServerMessage) {
        match msg.encode() {
            Ok(frame) => {
                self.conn.send(frame);
            }
            Err(e) => error!(error = %e, "Failed to encode reply"),
        }
    }

    fn broadcast(&self, room_id: &str, msg: &ServerMessage, exclude: Option<ConnectionId>) {
        match msg.encode() {
            Ok(frame) => {
                let delivered = self.registry.broadcast(room_id, &frame, exclude);
                debug!(room_id = %room_id, delivered = delivered, "Broadcast sent");
            }
            Err(e) => error!(error = %e, room_id = %room_id, "Failed to encode broadcast"),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
