use serde::Deserialize;
use std::net::SocketAddr;

/// Complete relay configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path of the WebSocket endpoint
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ws_path: default_ws_path(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Per-connection session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Chat messages are cut to this many characters
    #[serde(default = "default_chat_max_chars")]
    pub chat_max_chars: usize,
    /// Frames queued per connection before new ones are dropped
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// Close connections silent for this long (0 = never)
    #[serde(default)]
    pub idle_timeout_seconds: u64,
}

fn default_chat_max_chars() -> usize {
    300
}

fn default_outbound_buffer() -> usize {
    256
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chat_max_chars: default_chat_max_chars(),
            outbound_buffer: default_outbound_buffer(),
            idle_timeout_seconds: 0,
        }
    }
}

impl RelayConfig {
    /// Apply env var overrides (`PORT`, `WATCHPARTY_HOST`)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(v) = std::env::var("WATCHPARTY_HOST") {
            if !v.trim().is_empty() {
                self.server.host = v.trim().to_string();
            }
        }
        self
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<RelayConfig, Box<dyn std::error::Error + Send + Sync>> {
    let contents = std::fs::read_to_string(path)?;
    let config: RelayConfig = toml::from_str(&contents)?;
    Ok(config)
}
