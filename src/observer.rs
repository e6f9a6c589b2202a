// Observer module
// Side channel for connection and refresh reports; never on the response path

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::SnapshotError;
use crate::logger::{self, ConnectionLogEntry};

/// Metadata about one served connection.
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    pub peer_addr: SocketAddr,
    pub accepted_at: DateTime<Local>,
    pub bytes_sent: usize,
    /// Time from accept until the payload was written and the socket closed.
    pub latency: Duration,
}

/// Receives reports from the acceptor and the refresher.
///
/// Implementations must return quickly and must not fail; they run on the
/// task that just finished serving a client.
pub trait ServerObserver: Send + Sync + 'static {
    fn on_connection(&self, _report: &ConnectionReport) {}

    fn on_refreshed(&self, _payload_len: usize) {}

    fn on_refresh_failed(&self, _error: &SnapshotError) {}
}

/// Writes connection lines to the access log and refresh failures to the
/// error log. Connection lines can be switched on and off at runtime.
#[derive(Debug)]
pub struct AccessLogObserver {
    enabled: Arc<AtomicBool>,
    format: String,
}

impl AccessLogObserver {
    pub fn new(enabled: bool, format: impl Into<String>) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
            format: format.into(),
        }
    }

    /// Shared toggle for the connection log (console `show` / `hide`).
    pub fn toggle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.enabled)
    }
}

impl ServerObserver for AccessLogObserver {
    fn on_connection(&self, report: &ConnectionReport) {
        // lock-free check
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let entry = ConnectionLogEntry::from_report(report);
        logger::log_access(&entry, &self.format);
    }

    fn on_refreshed(&self, payload_len: usize) {
        logger::log_debug(&format!("[REFRESH] Published {payload_len} byte payload"));
    }

    fn on_refresh_failed(&self, error: &SnapshotError) {
        logger::log_refresh_failed(error);
    }
}
