//! Error types shared across the daemon.

use thiserror::Error;

/// Failures while following and interpreting the game server log.
#[derive(Debug, Error)]
pub enum TailError {
    /// Reading the log file failed.
    #[error("log read error: {0}")]
    Io(#[from] std::io::Error),

    /// A recognised line did not start with a `YYYY-MM-DD HH:MM:SS` stamp.
    #[error("malformed timestamp in line {line:?}: {reason}")]
    Timestamp { line: String, reason: String },
}

/// A refresh tick could not produce a payload.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("log tracking failed: {0}")]
    Tail(#[from] TailError),

    #[error("payload rendering failed: {0}")]
    Render(String),

    /// The blocking part of a tick panicked or was cancelled.
    #[error("snapshot task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(String),
}

/// Note store failures.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("failed to read note file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write note file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to parse note file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize notes: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Lifecycle failures of the status server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Operation not allowed in the current lifecycle phase.
    #[error("cannot {action} while {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: crate::server::Phase,
    },

    /// A background task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
