// Status module entry point
// Combines log state, liveness and notes into the served payload

mod notes;
mod payload;
mod process;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;

pub use notes::{Note, NoteStore};
pub use payload::StatusDocument;
pub use process::ProcessProbe;

use crate::cache::SnapshotSource;
use crate::config::PayloadFormat;
use crate::error::{SnapshotError, TailError};
use crate::logger;
use crate::tail::LogTracker;

/// What one blocking pass over the log and the process table found
struct ServerView {
    online: bool,
    version: Option<String>,
    started: Option<NaiveDateTime>,
    players: Vec<String>,
}

/// Production snapshot source: one log pull, one liveness check and one
/// note lookup per refresh tick.
///
/// Log reading and the process scan are plain file I/O and run on the
/// blocking pool, so a slow tick never holds up a runtime worker that
/// is accepting clients.
pub struct StatusSnapshot {
    tracker: Arc<Mutex<LogTracker>>,
    probe: Arc<ProcessProbe>,
    notes: Arc<NoteStore>,
    note_limit: Option<usize>,
    format: PayloadFormat,
    rescan: Arc<AtomicBool>,
}

impl StatusSnapshot {
    pub fn new(
        tracker: LogTracker,
        probe: ProcessProbe,
        notes: Arc<NoteStore>,
        note_limit: Option<usize>,
        format: PayloadFormat,
    ) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            probe: Arc::new(probe),
            notes,
            note_limit,
            format,
            rescan: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that makes the next snapshot re-read the log from the start.
    pub fn rescan_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.rescan)
    }

    pub async fn document(&mut self) -> Result<StatusDocument, SnapshotError> {
        let rescan = self.rescan.swap(false, Ordering::AcqRel);
        let tracker = Arc::clone(&self.tracker);
        let probe = Arc::clone(&self.probe);

        let view = tokio::task::spawn_blocking(move || read_server_view(&tracker, &probe, rescan))
            .await??;
        let recent = self.notes.recent(self.note_limit).await;

        Ok(StatusDocument::new(
            view.online,
            view.version.as_deref(),
            view.started,
            view.players,
            &recent,
        ))
    }
}

fn lock_tracker(tracker: &Mutex<LogTracker>) -> MutexGuard<'_, LogTracker> {
    // A panic mid-update leaves the tracker usable; the next pull carries on
    tracker.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_server_view(
    tracker: &Mutex<LogTracker>,
    probe: &ProcessProbe,
    rescan: bool,
) -> Result<ServerView, TailError> {
    let mut tracker = lock_tracker(tracker);
    if rescan {
        logger::write_info("[TAIL] Rescanning game log from the beginning");
        tracker.reset();
    }
    tracker.update()?;

    Ok(ServerView {
        online: probe.is_running(),
        version: tracker.version().map(str::to_string),
        started: tracker.last_start(),
        players: tracker.player_names(),
    })
}

impl SnapshotSource for StatusSnapshot {
    async fn snapshot(&mut self) -> Result<Vec<u8>, SnapshotError> {
        self.document().await?.render(self.format)
    }

    fn close(&mut self) {
        lock_tracker(&self.tracker).release();
    }
}
