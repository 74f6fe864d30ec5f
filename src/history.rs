//! Persisted log of completed work intervals.
//!
//! The log lives in a single JSON file that is rewritten in full on every
//! append. Writes go to a temporary file in the same directory which is then
//! renamed over the original, so a failed write never leaves a truncated log.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::LogError;

/// Receives a timestamp each time a countdown reaches zero.
pub trait CompletionSink {
    fn record(&mut self, at: DateTime<Local>) -> Result<(), LogError>;
}

/// When a work interval finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionEvent(DateTime<Local>);

impl CompletionEvent {
    pub fn at(&self) -> DateTime<Local> {
        self.0
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

#[derive(Deserialize)]
struct CompletionFile {
    completions: Vec<CompletionEvent>,
}

#[derive(Serialize)]
struct CompletionFileRef<'a> {
    completions: &'a [CompletionEvent],
}

/// Append-only list of completions, in the order they were recorded.
#[derive(Debug)]
pub struct CompletionLog {
    path: PathBuf,
    events: Vec<CompletionEvent>,
    /// Set while the in-memory list holds appends the file does not.
    dirty: bool,
}

impl CompletionLog {
    /// An empty log that will be written to `path` on the first record.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            events: Vec::new(),
            dirty: false,
        }
    }

    /// Load the log at `path`. A missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self, LogError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no completion log yet, starting empty");
                return Ok(Self::empty(path));
            }
            Err(source) => {
                return Err(LogError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let file: CompletionFile = serde_json::from_slice(&bytes).map_err(|source| LogError::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), completions = file.completions.len(), "loaded completion log");
        Ok(Self {
            path: path.to_path_buf(),
            events: file.completions,
            dirty: false,
        })
    }

    /// Like [`load`](Self::load), but a corrupt file is renamed aside and an
    /// empty log is returned in its place. Read errors still fail.
    pub fn load_or_recover(path: &Path) -> Result<Self, LogError> {
        match Self::load(path) {
            Err(LogError::Corrupt { path, source }) => {
                let backup = corrupt_backup_path(&path, Local::now());
                fs::rename(&path, &backup).map_err(|source| LogError::Write {
                    path: backup.clone(),
                    source,
                })?;
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %source,
                    "completion log was corrupt, moved it aside and started empty"
                );
                Ok(Self::empty(path))
            }
            other => other,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events(&self) -> &[CompletionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// True when the last write failed and the file is behind memory.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn count_on(&self, date: NaiveDate) -> usize {
        self.events.iter().filter(|e| e.date() == date).count()
    }

    /// Completions that share `now`'s local calendar date.
    pub fn count_today(&self, now: DateTime<Local>) -> usize {
        self.count_on(now.date_naive())
    }

    /// Append a completion and rewrite the file.
    ///
    /// The append survives a failed write: the count stays correct and the
    /// next [`flush`](Self::flush) retries.
    pub fn record(&mut self, at: DateTime<Local>) -> Result<(), LogError> {
        self.events.push(CompletionEvent(at));
        self.dirty = true;
        debug!(at = %at.to_rfc3339(), total = self.events.len(), "recorded completion");
        self.flush()
    }

    /// Write the log if it has unsaved appends.
    pub fn flush(&mut self) -> Result<(), LogError> {
        if !self.dirty {
            return Ok(());
        }
        if let Err(e) = self.persist() {
            warn!(path = %self.path.display(), error = %e, "failed to persist completion log");
            return Err(e);
        }
        self.dirty = false;
        Ok(())
    }

    fn persist(&self) -> Result<(), LogError> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| LogError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let contents = serde_json::to_vec_pretty(&CompletionFileRef {
            completions: &self.events,
        })
        .map_err(LogError::Encode)?;

        let write_err = |source: io::Error| LogError::Write {
            path: self.path.clone(),
            source,
        };
        let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp.write_all(&contents).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl CompletionSink for CompletionLog {
    fn record(&mut self, at: DateTime<Local>) -> Result<(), LogError> {
        CompletionLog::record(self, at)
    }
}

fn corrupt_backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "completions.json".into());
    path.with_file_name(format!("{name}.corrupt-{}", now.format("%Y%m%dT%H%M%S")))
}
