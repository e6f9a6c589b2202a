// Configuration module entry point
// Layered settings: defaults, optional config file, CRAFTINFO_* environment

mod types;

use std::net::SocketAddr;
use std::time::Duration;

pub use types::{
    CacheConfig, Config, GameLogConfig, LoggingConfig, NotesConfig, PayloadConfig, PayloadFormat,
    ProcessConfig, ServerConfig,
};

use crate::server::ServerSettings;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "craftinfo";

impl Config {
    /// Load configuration from specified file path (extension optional)
    ///
    /// Environment variables override the file, e.g.
    /// `CRAFTINFO_SERVER__PORT=6000`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("CRAFTINFO")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("process.patterns")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5001)?
            .set_default("server.backlog", 5)?
            .set_default("server.poll_interval_ms", 1000)?
            .set_default("cache.refresh_interval", 30)?
            .set_default("log.path", "server.log")?
            .set_default("log.marker", crate::tail::DEFAULT_MARKER)?
            .set_default("notes.path", "notes.toml")?
            .set_default("process.patterns", vec!["minecraft_server", "bukkit"])?
            .set_default("process.proc_root", "/proc")?
            .set_default("payload.format", "xml")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "default")?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.cache.refresh_interval == 0 {
            return Err(config::ConfigError::Message(
                "cache.refresh_interval must be at least 1 second".to_string(),
            ));
        }
        if self.server.poll_interval_ms == 0 {
            return Err(config::ConfigError::Message(
                "server.poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.server.backlog <= 0 {
            return Err(config::ConfigError::Message(
                "server.backlog must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn server_settings(&self) -> Result<ServerSettings, String> {
        Ok(ServerSettings {
            addr: self.get_socket_addr()?,
            backlog: self.server.backlog,
            poll_interval: Duration::from_millis(self.server.poll_interval_ms),
            refresh_interval: Duration::from_secs(self.cache.refresh_interval),
        })
    }
}
