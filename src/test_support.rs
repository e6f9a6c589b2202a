// Test helpers shared by module tests

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Scratch directory removed on drop.
pub struct TempDir {
    base_dir: PathBuf,
}

impl TempDir {
    pub fn new(label: &str) -> Self {
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let base_dir = std::env::temp_dir().join(format!(
            "craftinfo_{label}_{}_{unique}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&base_dir);
        fs::create_dir_all(&base_dir).unwrap();
        Self { base_dir }
    }

    pub fn path(&self) -> &Path {
        &self.base_dir
    }

    /// Create or overwrite `name` with `content`.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let p = self.base_dir.join(name);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&p, content).unwrap();
        p
    }

    pub fn append(&self, name: &str, content: &str) {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.base_dir.join(name))
            .unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.base_dir);
    }
}

/// Observer that counts what it was told.
#[derive(Default)]
pub struct RecordingObserver {
    connections: std::sync::Mutex<Vec<crate::observer::ConnectionReport>>,
    refreshes: AtomicU64,
    failures: AtomicU64,
}

impl RecordingObserver {
    pub fn connections(&self) -> Vec<crate::observer::ConnectionReport> {
        self.connections.lock().unwrap().clone()
    }

    pub fn refreshes(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }
}

impl crate::observer::ServerObserver for RecordingObserver {
    fn on_connection(&self, report: &crate::observer::ConnectionReport) {
        self.connections.lock().unwrap().push(report.clone());
    }

    fn on_refreshed(&self, _payload_len: usize) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_refresh_failed(&self, _error: &crate::error::SnapshotError) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}
