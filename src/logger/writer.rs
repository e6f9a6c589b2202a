//! Log sinks: stdout/stderr by default, append-only files when configured.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(Mutex::new(open_append(path)?))),
            None => Ok(fallback),
        }
    }

    fn line(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                // A poisoned lock or full disk must never take the server down
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{message}");
                }
            }
        }
    }
}

/// Process-wide pair of sinks plus the debug switch
pub struct LogWriter {
    access: LogTarget,
    error: LogTarget,
    debug: bool,
}

impl LogWriter {
    fn new(access_log: Option<&str>, error_log: Option<&str>, debug: bool) -> io::Result<Self> {
        Ok(Self {
            access: LogTarget::open(access_log, LogTarget::Stdout)?,
            error: LogTarget::open(error_log, LogTarget::Stderr)?,
            debug,
        })
    }

    pub fn write_info(&self, message: &str) {
        self.access.line(message);
    }

    pub fn write_error(&self, message: &str) {
        self.error.line(message);
    }

    pub const fn debug_enabled(&self) -> bool {
        self.debug
    }
}

fn open_append(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global writer. Fails if a log file cannot be opened or if
/// called twice.
pub fn init(access_log: Option<&str>, error_log: Option<&str>, debug: bool) -> io::Result<()> {
    let writer = LogWriter::new(access_log, error_log, debug)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(io::ErrorKind::AlreadyExists, "log writer already initialized")
    })
}

/// The global writer, once `init` has run
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
