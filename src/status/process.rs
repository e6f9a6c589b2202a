// Process probe module
// Answers "is the game server running" from the process table

use std::fs;
use std::path::PathBuf;

/// Looks for a process whose command line contains one of the patterns.
///
/// Reads `<root>/<pid>/cmdline` (Linux procfs layout). Where no such
/// directory exists, e.g. on Windows, the server is reported offline.
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    root: PathBuf,
    patterns: Vec<String>,
}

impl ProcessProbe {
    pub fn new(root: impl Into<PathBuf>, patterns: Vec<String>) -> Self {
        Self {
            root: root.into(),
            patterns,
        }
    }

    pub fn is_running(&self) -> bool {
        let Ok(entries) = fs::read_dir(&self.root) else {
            return false;
        };

        entries
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()))
            })
            // Processes may exit while we look; unreadable entries are skipped
            .filter_map(|entry| fs::read(entry.path().join("cmdline")).ok())
            .any(|cmdline| {
                let cmdline = String::from_utf8_lossy(&cmdline);
                self.patterns.iter().any(|p| cmdline.contains(p.as_str()))
            })
    }
}
