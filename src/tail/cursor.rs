// Log cursor module
// Follows one append-only file and hands out newly appended complete lines

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::logger;

/// Resumable reader over an append-only text file.
///
/// The cursor owns its file handle and the byte offset of the first
/// unconsumed byte. A trailing fragment without a terminating newline is
/// never consumed; it is read again on the next [`LogCursor::pull`].
#[derive(Debug)]
pub struct LogCursor {
    path: PathBuf,
    file: Option<File>,
    offset: u64,
}

impl LogCursor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            offset: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the first line not yet handed out.
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Return every complete line appended since the last call.
    ///
    /// A missing file yields no lines and no error, and the next file to
    /// appear at the path is read from its start. The same holds when the
    /// path now names a different file (rotated) or the file became shorter
    /// than the stored offset (truncated).
    pub fn pull(&mut self) -> io::Result<Vec<String>> {
        let meta = match fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.reset();
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        if let Some(file) = &self.file {
            if file_id(&file.metadata()?) != file_id(&meta) {
                logger::log_tail_rotated(&self.path, self.offset);
                self.reset();
            }
        }

        let len = meta.len();
        if len < self.offset {
            logger::log_tail_truncated(&self.path, self.offset, len);
            self.reset();
        }

        if self.file.is_none() {
            self.file = Some(File::open(&self.path)?);
        }
        let offset = self.offset;
        let Some(file) = self.file.as_mut() else {
            return Ok(Vec::new());
        };

        file.seek(SeekFrom::Start(offset))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };

        let complete = &buf[..=last_newline];
        self.offset += complete.len() as u64;

        let lines = complete[..last_newline]
            .split(|&b| b == b'\n')
            .map(|raw| {
                let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
                String::from_utf8_lossy(raw).into_owned()
            })
            .collect();

        Ok(lines)
    }

    /// Forget the offset and drop the handle; the next pull re-reads
    /// the file from the start.
    pub fn reset(&mut self) {
        self.release();
        self.offset = 0;
    }

    /// Close the file handle while keeping the offset.
    pub fn release(&mut self) {
        self.file = None;
    }

    pub const fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

/// Identity of the file behind a handle or path
#[cfg(unix)]
fn file_id(meta: &fs::Metadata) -> Option<(u64, u64)> {
    use std::os::unix::fs::MetadataExt;
    Some((meta.dev(), meta.ino()))
}

// Without inode numbers only truncation is detected
#[cfg(not(unix))]
const fn file_id(_meta: &fs::Metadata) -> Option<(u64, u64)> {
    None
}
