// Log tracking module entry point
// Cursor, classifier and state machine, driven together by LogTracker

mod classify;
mod cursor;
mod state;

use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::error::TailError;
use crate::logger;

pub use classify::{parse_timestamp, ClassifiedEvent, LineClassifier, DEFAULT_MARKER};
pub use cursor::LogCursor;
pub use state::{LogEvents, ServerStateMachine};

/// Owns the log cursor and derives live server state from it.
#[derive(Debug)]
pub struct LogTracker {
    cursor: LogCursor,
    classifier: LineClassifier,
    machine: ServerStateMachine,
}

impl LogTracker {
    pub fn new(path: impl Into<PathBuf>, classifier: LineClassifier, events: LogEvents) -> Self {
        Self {
            cursor: LogCursor::new(path),
            classifier,
            machine: ServerStateMachine::new(events),
        }
    }

    /// Consume everything appended since the last call.
    ///
    /// Returns the number of lines examined. A recognised line with a
    /// malformed timestamp is skipped, the rest of the batch is still
    /// applied, and the first such failure is returned.
    pub fn update(&mut self) -> Result<usize, TailError> {
        let lines = self.cursor.pull()?;
        let mut first_error = None;

        for line in &lines {
            match self.classifier.classify(line) {
                Ok(event) => self.machine.apply(event),
                Err(e) => {
                    logger::log_tail_error(&e);
                    first_error.get_or_insert(e);
                }
            }
        }

        if !lines.is_empty() {
            logger::log_debug(&format!(
                "[TAIL] {} new line(s) from {}, offset {}",
                lines.len(),
                self.cursor.path().display(),
                self.cursor.offset()
            ));
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(lines.len()),
        }
    }

    /// Start over from the beginning of the file with an empty state.
    pub fn reset(&mut self) {
        self.machine.clear();
        self.cursor.reset();
    }

    /// Close the log file handle. The next update reopens it.
    pub fn release(&mut self) {
        if self.cursor.is_open() {
            logger::log_debug(&format!(
                "[TAIL] Releasing {} at offset {}",
                self.cursor.path().display(),
                self.cursor.offset()
            ));
            self.cursor.release();
        }
    }

    /// Online players, sorted by name
    pub fn player_names(&self) -> Vec<String> {
        self.machine.players().keys().cloned().collect()
    }

    pub fn version(&self) -> Option<&str> {
        self.machine.version()
    }

    pub const fn last_start(&self) -> Option<NaiveDateTime> {
        self.machine.last_start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;
    use std::sync::{Arc, Mutex};

    const LOGLINES: &str = "\
2010-11-30 19:55:15 [INFO] Starting craftinfo server version 0.2.6_02
2010-11-30 20:18:30 [INFO] <user> chit chat
2010-11-30 19:56:42 [INFO] user_test [/188.60.36.18:61540] logged in with entity id 24
2010-11-30 19:56:42 [INFO] user_test [/188.60.36.18:61540] logged in with entity id 24
2010-11-30 20:22:07 [INFO] anotheruser lost connection: Quitting


";

    const MORELINES: &str = concat!(
        "\n",
        "\n",
        "2010-11-30 20:00:37 [WARNING] Can't keep up! Did the system time change, or is the server overloaded?\n",
        "2010-11-30 20:22:07 [INFO] user_test lost connection: Quitting\n",
    );

    fn tracker_with_log(dir: &TempDir, log: &Arc<Mutex<Vec<String>>>) -> LogTracker {
        let on_in = Arc::clone(log);
        let on_out = Arc::clone(log);
        let events = LogEvents::new()
            .on_login(move |p, _| on_in.lock().unwrap().push(format!("login {p}")))
            .on_logout(move |p, _| on_out.lock().unwrap().push(format!("logout {p}")));
        LogTracker::new(dir.path().join("server.log"), LineClassifier::default(), events)
    }

    #[test]
    fn test_generated_log() {
        let dir = TempDir::new("tracker-generated");
        dir.write("server.log", LOGLINES);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tracker = tracker_with_log(&dir, &log);

        assert_eq!(tracker.update().unwrap(), 7);
        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(tracker.version(), Some("0.2.6_02"));
        assert_eq!(tracker.player_names(), vec!["user_test"]);

        dir.append("server.log", MORELINES);
        assert_eq!(tracker.update().unwrap(), 4);
        assert!(tracker.player_names().is_empty());
        assert_eq!(log.lock().unwrap().last().unwrap(), "logout user_test");
    }

    #[test]
    fn test_login_logout_scenario() {
        let dir = TempDir::new("tracker-scenario");
        dir.write(
            "server.log",
            "2010-11-30 19:55:15 [INFO] Starting craftinfo server version 0.2.6_02\n\
             2010-11-30 19:56:42 [INFO] user_test [/ip] logged in with entity id 24\n\
             2010-11-30 20:22:07 [INFO] user_test lost connection: Quitting\n",
        );
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tracker = tracker_with_log(&dir, &log);

        tracker.update().unwrap();
        assert_eq!(tracker.version(), Some("0.2.6_02"));
        assert!(tracker.player_names().is_empty());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["login user_test", "logout user_test"]
        );
        assert_eq!(
            tracker.last_start(),
            Some(parse_timestamp("2010-11-30 19:55:15").unwrap())
        );
    }

    #[test]
    fn test_update_is_idempotent_without_new_bytes() {
        let dir = TempDir::new("tracker-idempotent");
        dir.write("server.log", LOGLINES);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tracker = tracker_with_log(&dir, &log);

        tracker.update().unwrap();
        let fired = log.lock().unwrap().len();
        assert_eq!(tracker.update().unwrap(), 0);
        assert_eq!(tracker.update().unwrap(), 0);
        assert_eq!(log.lock().unwrap().len(), fired);
    }

    #[test]
    fn test_missing_log_then_created() {
        let dir = TempDir::new("tracker-late");
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tracker = tracker_with_log(&dir, &log);

        assert_eq!(tracker.update().unwrap(), 0);
        dir.write("server.log", "2010-11-30 19:56:42 [INFO] bob [/x] logged in\n");
        assert_eq!(tracker.update().unwrap(), 1);
        assert_eq!(tracker.player_names(), vec!["bob"]);
    }

    #[test]
    fn test_malformed_timestamp_fails_cycle_but_applies_rest() {
        let dir = TempDir::new("tracker-malformed");
        dir.write(
            "server.log",
            "bad-stamp-here-xxxx [INFO] alice [/x] logged in\n\
             2010-11-30 19:56:42 [INFO] bob [/x] logged in\n",
        );
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tracker = tracker_with_log(&dir, &log);

        let err = tracker.update().unwrap_err();
        assert!(matches!(err, TailError::Timestamp { .. }));
        assert_eq!(tracker.player_names(), vec!["bob"]);

        // The bad line was consumed; the next cycle is clean
        assert_eq!(tracker.update().unwrap(), 0);
    }

    #[test]
    fn test_reset_replays_log() {
        let dir = TempDir::new("tracker-reset");
        dir.write("server.log", LOGLINES);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut tracker = tracker_with_log(&dir, &log);

        tracker.update().unwrap();
        tracker.reset();
        assert!(tracker.player_names().is_empty());
        assert_eq!(tracker.version(), None);

        assert_eq!(tracker.update().unwrap(), 7);
        assert_eq!(tracker.player_names(), vec!["user_test"]);
        assert_eq!(log.lock().unwrap().len(), 4);
    }
}
