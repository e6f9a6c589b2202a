//! Logger module
//!
//! Provides logging utilities for the status daemon including:
//! - Server lifecycle logging
//! - Connection logging with multiple formats
//! - Log tracking and refresh diagnostics
//! - File-based logging support

mod format;
pub mod writer;

pub use format::ConnectionLogEntry;

use std::net::SocketAddr;
use std::path::Path;

use crate::config::Config;
use crate::error::{SnapshotError, TailError};
use crate::server::ServerSettings;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        config.logging.level.eq_ignore_ascii_case("debug"),
    )
}

/// Write to info/access log
pub fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
pub fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write a debug line; dropped unless `logging.level = "debug"`
pub fn log_debug(message: &str) {
    if writer::get().is_some_and(writer::LogWriter::debug_enabled) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

pub fn log_server_start(addr: &SocketAddr, settings: &ServerSettings) {
    write_info("======================================");
    write_info("Status server started successfully");
    write_info(&format!("Listening on: {addr}"));
    write_info(&format!(
        "Refresh interval: {}s",
        settings.refresh_interval.as_secs()
    ));
    write_info(&format!("Listen backlog: {}", settings.backlog));
    write_info("======================================");
}

pub fn log_config(config: &Config) {
    write_info("[CONFIG] Loaded configuration:");
    write_info(&format!("  - Listen: {}:{}", config.server.host, config.server.port));
    write_info(&format!("  - Game log: {}", config.log.path));
    write_info(&format!(
        "  - Notes: {}",
        config.notes.store_path().unwrap_or("(in memory)")
    ));
    write_info(&format!("  - Payload format: {:?}", config.payload.format));
    write_info(&format!("  - Log level: {}", config.logging.level));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("  - Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("  - Error log: {path}"));
    }
}

/// Write formatted connection log entry
pub fn log_access(entry: &ConnectionLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &std::io::Error) {
    write_error(&format!("[ERROR] Failed to serve {peer_addr}: {err}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_refresh_failed(err: &SnapshotError) {
    write_error(&format!(
        "[REFRESH] Snapshot failed, keeping previous payload: {err}"
    ));
}

pub fn log_tail_error(err: &TailError) {
    write_error(&format!("[TAIL] {err}"));
}

pub fn log_tail_truncated(path: &Path, offset: u64, len: u64) {
    log_warning(&format!(
        "[TAIL] {} shrank to {len} bytes (cursor was at {offset}), reading from the start",
        path.display()
    ));
}

pub fn log_tail_rotated(path: &Path, offset: u64) {
    log_warning(&format!(
        "[TAIL] {} was replaced (cursor was at {offset}), reading the new file from the start",
        path.display()
    ));
}
