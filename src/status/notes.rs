// Note store module
// Operator-entered notes, persisted to a TOML file on every change

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

use crate::error::NoteError;
use crate::logger;

/// One operator note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub date: NaiveDateTime,
    pub text: String,
}

impl std::fmt::Display for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            self.id,
            self.date.format("%d.%m.%Y %H:%M"),
            self.text
        )
    }
}

/// On-disk layout of the note file
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct NoteFile {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    notes: Vec<Note>,
}

/// Keyed note records, cached in memory
///
/// Changes are written to disk before they become visible: a failed save
/// leaves both the file and the in-memory notes as they were.
pub struct NoteStore {
    /// File the notes are saved to; `None` keeps them in memory only
    path: Option<PathBuf>,
    state: RwLock<NoteFile>,
    /// Serializes writers; readers only wait for the final swap
    writer: Mutex<()>,
}

impl NoteStore {
    /// Open the store, loading existing notes if the file exists
    pub async fn open(path: Option<&str>) -> Result<Self, NoteError> {
        let path = path.map(PathBuf::from);
        let state = match &path {
            Some(p) => Self::load(p).await?,
            None => NoteFile::default(),
        };

        Ok(Self {
            path,
            state: RwLock::new(state),
            writer: Mutex::new(()),
        })
    }

    /// In-memory store without a backing file
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(NoteFile::default()),
            writer: Mutex::new(()),
        }
    }

    async fn load(path: &Path) -> Result<NoteFile, NoteError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(NoteFile::default()),
            Err(e) => return Err(NoteError::Read(e)),
        };
        let mut file: NoteFile = toml::from_str(&content)?;

        // Never hand out an id that is already taken
        let max_id = file.notes.iter().map(|n| n.id).max().unwrap_or(0);
        file.next_id = file.next_id.max(max_id + 1);

        logger::write_info(&format!(
            "Loaded {} note(s) from {}",
            file.notes.len(),
            path.display()
        ));
        Ok(file)
    }

    async fn save(&self, file: &NoteFile) -> Result<(), NoteError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = toml::to_string_pretty(file)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(NoteError::Write)?;
            }
        }
        fs::write(path, content).await.map_err(NoteError::Write)
    }

    /// Apply `change` to a copy of the notes, persist the copy, then
    /// publish it. Nothing is written when the copy is unchanged.
    async fn commit<T>(&self, change: impl FnOnce(&mut NoteFile) -> T) -> Result<T, NoteError> {
        let _writer = self.writer.lock().await;

        let current = self.state.read().await.clone();
        let mut next = current.clone();
        let result = change(&mut next);
        if next == current {
            return Ok(result);
        }

        self.save(&next).await?;
        *self.state.write().await = next;
        Ok(result)
    }

    /// Add a note stamped with the current local time
    pub async fn add(&self, text: &str) -> Result<Note, NoteError> {
        self.add_at(Local::now().naive_local(), text).await
    }

    pub async fn add_at(&self, date: NaiveDateTime, text: &str) -> Result<Note, NoteError> {
        self.commit(|file| {
            let note = Note {
                id: file.next_id.max(1),
                date,
                text: text.to_string(),
            };
            file.next_id = note.id + 1;
            file.notes.push(note.clone());
            note
        })
        .await
    }

    /// All notes in insertion order
    pub async fn list(&self) -> Vec<Note> {
        self.state.read().await.notes.clone()
    }

    /// Remove a note by id; returns whether it existed
    pub async fn delete(&self, id: u64) -> Result<bool, NoteError> {
        self.commit(|file| {
            let before = file.notes.len();
            file.notes.retain(|n| n.id != id);
            file.notes.len() != before
        })
        .await
    }

    /// Newest notes first, optionally capped at `limit`
    pub async fn recent(&self, limit: Option<usize>) -> Vec<Note> {
        let mut notes = self.list().await;
        notes.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        if let Some(limit) = limit {
            notes.truncate(limit);
        }
        notes
    }
}
