// Per-connection protocol handling

pub mod handler;
pub mod manager;
pub mod protocol;

pub use handler::{Session, SessionState};
pub use manager::ConnectionManager;
pub use protocol::{ClientMessage, ServerMessage};
