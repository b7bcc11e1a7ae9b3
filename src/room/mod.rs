// Room membership and fan-out

mod connection;
mod registry;

pub use connection::{Connection, ConnectionId, Delivery, Frame};
pub use registry::{JoinOutcome, RoomRegistry};

#[cfg(test)]
mod tests;
