// Operator console module
// Reads commands from stdin and dispatches them through a static command table

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cache::{CacheSlot, RefreshTrigger};
use crate::server::Shutdown;
use crate::status::NoteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Add,
    Delete,
    Help,
    Hide,
    List,
    Refresh,
    Rescan,
    Show,
    Stop,
    Value,
}

/// Command name, handler and help text, sorted by name
const COMMANDS: &[(&str, Command, &str)] = &[
    ("add", Command::Add, "Adds a note with the current time"),
    ("delete", Command::Delete, "Removes a note by id"),
    ("help", Command::Help, "Displays available commands"),
    ("hide", Command::Hide, "Hides connection log lines"),
    ("list", Command::List, "Lists current notes"),
    ("refresh", Command::Refresh, "Recomputes the payload now"),
    ("rescan", Command::Rescan, "Re-reads the game log from the beginning"),
    ("show", Command::Show, "Shows connection log lines"),
    ("stop", Command::Stop, "Stops the server gracefully"),
    ("value", Command::Value, "Shows the current payload"),
];

fn lookup(name: &str) -> Option<Command> {
    COMMANDS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, cmd, _)| *cmd)
}

/// What the console loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Console {
    notes: Arc<NoteStore>,
    slot: Arc<CacheSlot>,
    access_log: Arc<AtomicBool>,
    rescan: Arc<AtomicBool>,
    trigger: RefreshTrigger,
}

impl Console {
    pub const fn new(
        notes: Arc<NoteStore>,
        slot: Arc<CacheSlot>,
        access_log: Arc<AtomicBool>,
        rescan: Arc<AtomicBool>,
        trigger: RefreshTrigger,
    ) -> Self {
        Self {
            notes,
            slot,
            access_log,
            rescan,
            trigger,
        }
    }

    /// Run one command line and return the text to show the operator.
    pub async fn execute(&self, line: &str) -> (Flow, String) {
        let line = line.trim();
        let (name, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args = args.trim();

        if name.is_empty() {
            return (Flow::Continue, String::new());
        }

        let Some(command) = lookup(name) else {
            return (Flow::Continue, "unknown command".to_string());
        };

        match command {
            Command::Help => (Flow::Continue, help_text()),
            Command::Stop => (Flow::Stop, "stopping".to_string()),
            Command::Show => {
                self.access_log.store(true, Ordering::Relaxed);
                (Flow::Continue, "connection log shown".to_string())
            }
            Command::Hide => {
                self.access_log.store(false, Ordering::Relaxed);
                (Flow::Continue, "connection log hidden".to_string())
            }
            Command::Add => (Flow::Continue, self.add(args).await),
            Command::List => (Flow::Continue, self.list().await),
            Command::Delete => (Flow::Continue, self.delete(args).await),
            Command::Value => {
                let cached = self.slot.load().await;
                let mut out = String::from_utf8_lossy(&cached.payload).into_owned();
                match cached.computed_at {
                    Some(at) => {
                        let _ = write!(out, "\n(computed {})", at.format("%d.%m.%Y %H:%M:%S"));
                    }
                    None => out.push_str("(no payload computed yet)"),
                }
                (Flow::Continue, out)
            }
            Command::Refresh => {
                self.trigger.refresh_now();
                (Flow::Continue, "refresh requested".to_string())
            }
            Command::Rescan => {
                self.rescan.store(true, Ordering::Release);
                self.trigger.refresh_now();
                (Flow::Continue, "rescan requested".to_string())
            }
        }
    }

    async fn add(&self, text: &str) -> String {
        if text.is_empty() {
            return "usage: add <text>".to_string();
        }
        match self.notes.add(text).await {
            Ok(note) => format!("added note {}", note.id),
            Err(e) => format!("error: {e}"),
        }
    }

    async fn list(&self) -> String {
        let notes = self.notes.list().await;
        if notes.is_empty() {
            return "no notes".to_string();
        }
        notes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn delete(&self, args: &str) -> String {
        let Ok(id) = args.parse::<u64>() else {
            return "usage: delete <id>".to_string();
        };
        match self.notes.delete(id).await {
            Ok(true) => format!("deleted note {id}"),
            Ok(false) => format!("no note with id {id}"),
            Err(e) => format!("error: {e}"),
        }
    }

    /// Read commands from stdin until `stop`, or until shutdown is
    /// requested elsewhere. A closed stdin leaves the server running.
    pub async fn run(&self, shutdown: &Shutdown) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let (flow, output) = self.execute(&line).await;
                            if !output.is_empty() {
                                println!("{output}");
                            }
                            if flow == Flow::Stop {
                                return;
                            }
                        }
                        // EOF or unreadable stdin: keep serving until a signal arrives
                        Ok(None) | Err(_) => {
                            shutdown.wait().await;
                            return;
                        }
                    }
                }

                () = shutdown.wait() => return,
            }
        }
    }
}

fn help_text() -> String {
    let mut out = String::new();
    for (name, _, help) in COMMANDS {
        let _ = writeln!(out, "{name}\t{help}");
    }
    out.trim_end().to_string()
}
