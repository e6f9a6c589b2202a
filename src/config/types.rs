// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub log: GameLogConfig,
    pub notes: NotesConfig,
    pub process: ProcessConfig,
    pub payload: PayloadConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pending connection queue length
    pub backlog: i32,
    /// Accept poll timeout; bounds how long stop waits for the acceptor
    pub poll_interval_ms: u64,
    pub workers: Option<usize>,
}

/// Payload refresh configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Seconds between refresh ticks
    pub refresh_interval: u64,
}

/// Game server log to follow
#[derive(Debug, Deserialize, Clone)]
pub struct GameLogConfig {
    pub path: String,
    /// Token that precedes player names in login/logout lines
    pub marker: String,
}

/// Operator note storage
#[derive(Debug, Deserialize, Clone)]
pub struct NotesConfig {
    /// TOML file holding the notes; an empty string keeps them in memory only
    #[serde(default)]
    pub path: Option<String>,
    /// Maximum number of notes embedded in the payload
    #[serde(default)]
    pub limit: Option<usize>,
}

impl NotesConfig {
    pub fn store_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }
}

/// Liveness check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessConfig {
    /// Command line fragments identifying the game server process
    pub patterns: Vec<String>,
    pub proc_root: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    Xml,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PayloadConfig {
    pub format: PayloadFormat,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// Log each served connection
    pub access_log: bool,
    /// Connection log format (default, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "default".to_string()
}
