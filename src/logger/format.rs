//! Connection log format module
//!
//! Supports multiple log formats:
//! - `default` (tab separated: time, client address, latency)
//! - `json` (JSON structured logging)
//! - Custom patterns with variables

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::observer::ConnectionReport;

/// One served connection, ready to be formatted
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionLogEntry {
    /// Client IP address
    pub remote_addr: String,
    /// Accept timestamp
    pub time: DateTime<Local>,
    /// Payload size in bytes
    pub bytes_sent: usize,
    /// Accept-to-close time in microseconds
    pub latency_us: u64,
}

impl ConnectionLogEntry {
    pub fn from_report(report: &ConnectionReport) -> Self {
        Self {
            remote_addr: report.peer_addr.ip().to_string(),
            time: report.accepted_at,
            bytes_sent: report.bytes_sent,
            latency_us: u64::try_from(report.latency.as_micros()).unwrap_or(u64::MAX),
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "default" => self.format_default(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn latency_ms(&self) -> f64 {
        self.latency_us as f64 / 1000.0
    }

    /// `dd.mm.YYYY HH:MM:SS<TAB>addr<TAB>latency ms`
    fn format_default(&self) -> String {
        format!(
            "{}\t{}\t{:.3}ms",
            self.time.format("%d.%m.%Y %H:%M:%S"),
            self.remote_addr,
            self.latency_ms()
        )
    }

    fn format_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$remote_addr` - Client IP address
    /// - `$time_local` - Local time in Common Log Format
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$bytes_sent` - Payload size
    /// - `$latency_ms` - Accept-to-close time in milliseconds (3 decimal places)
    fn format_custom(&self, pattern: &str) -> String {
        pattern
            .replace("$remote_addr", &self.remote_addr)
            .replace(
                "$time_local",
                &self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string(),
            )
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$bytes_sent", &self.bytes_sent.to_string())
            .replace("$latency_ms", &format!("{:.3}", self.latency_ms()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn create_test_entry() -> ConnectionLogEntry {
        ConnectionLogEntry {
            remote_addr: "192.168.1.1".to_string(),
            time: Local.with_ymd_and_hms(2010, 11, 30, 19, 56, 42).unwrap(),
            bytes_sent: 1234,
            latency_us: 1500,
        }
    }

    #[test]
    fn test_format_default() {
        let log = create_test_entry().format("default");
        assert_eq!(log, "30.11.2010 19:56:42\t192.168.1.1\t1.500ms");
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        assert!(log.contains(r#""remote_addr":"192.168.1.1""#));
        assert!(log.contains(r#""bytes_sent":1234"#));
        assert!(log.contains(r#""latency_us":1500"#));
    }

    #[test]
    fn test_format_custom() {
        let log = create_test_entry().format("$remote_addr sent=$bytes_sent took=$latency_ms");
        assert_eq!(log, "192.168.1.1 sent=1234 took=1.500");
    }

    #[test]
    fn test_from_report_strips_port() {
        let report = ConnectionReport {
            peer_addr: "10.0.0.7:61540".parse().unwrap(),
            accepted_at: Local::now(),
            bytes_sent: 3,
            latency: std::time::Duration::from_micros(250),
        };
        let entry = ConnectionLogEntry::from_report(&report);
        assert_eq!(entry.remote_addr, "10.0.0.7");
        assert_eq!(entry.latency_us, 250);
    }
}
