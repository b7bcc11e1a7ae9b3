use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Serialized outbound payload, encoded once and shared by every recipient
pub type Frame = Arc<str>;

/// Unique identity of one accepted socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of a single delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Writer side is gone; the frame is skipped
    Closed,
    /// Outbound buffer is full; the frame is dropped
    Dropped,
}

/// Handle to a client's outbound channel.
///
/// The socket writer task owns the receiving half. Once it exits the
/// connection is closed and every send becomes a no-op.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<Frame>,
}

impl Connection {
    /// Create a connection with an outbound buffer of `capacity` frames
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let conn = Self {
            id: ConnectionId::new(),
            tx,
        };
        (conn, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Enqueue a frame without waiting
    pub fn send(&self, frame: Frame) -> Delivery {
        match self.tx.try_send(frame) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Dropped,
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
