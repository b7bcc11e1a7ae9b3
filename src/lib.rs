// Room registry and broadcast engine
pub mod room;

// Per-connection protocol state machine
pub mod session;

// HTTP and WebSocket APIs
pub mod api;

// Configuration loading
pub mod config;
