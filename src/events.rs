//! Dispatch log for cardsend.
//!
//! Every dispatch attempt is appended as one human-readable line, whatever
//! its outcome:
//!
//! ```text
//! 2026-10-19T12:00:00Z alice@gpu-node target=echo status=success
//! 2026-10-19T12:00:03Z alice@gpu-node target=gpt status=resolution_error note="handler_load_error"
//! ```
//!
//! The log is append-only. [`FileLog`] serialises appends internally, so one
//! instance can be shared across concurrent dispatches without interleaving
//! lines.

use crate::dispatch::DispatchStatus;
use crate::error::{CardError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One dispatch attempt as recorded in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// When the dispatch finished.
    pub ts: DateTime<Utc>,

    /// Who dispatched the card (e.g., `user@HOST`).
    pub actor: String,

    /// The target agent key.
    pub target: String,

    /// The final dispatch status.
    pub status: DispatchStatus,

    /// Short note: the error kind on failure, the module origin on success.
    pub note: Option<String>,
}

impl LogEntry {
    /// Create an entry stamped with the current time and actor.
    pub fn new(target: impl Into<String>, status: DispatchStatus) -> Self {
        Self {
            ts: Utc::now(),
            actor: get_actor_string(),
            target: target.into(),
            status,
            note: None,
        }
    }

    /// Attach a note to this entry.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Render the entry as a single log line without a trailing newline.
    ///
    /// The note is always debug-quoted, and so is a target that isn't a
    /// plain token, so no field can split the entry or forge another one.
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{} {} target={} status={}",
            self.ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.actor,
            quote_if_needed(&self.target),
            self.status
        );
        if let Some(note) = &self.note {
            line.push_str(&format!(" note={:?}", note));
        }
        line
    }
}

fn quote_if_needed(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_graphic() && c != '"' && c != '=');
    if plain {
        value.to_string()
    } else {
        format!("{:?}", value)
    }
}

/// Get the actor string for log entries.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// An append-only sink for dispatch log entries.
pub trait DispatchLog: Send + Sync {
    /// Append one entry.
    fn append(&self, entry: &LogEntry) -> Result<()>;
}

/// Appends entries to a text file, creating it and its directory on demand.
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLog {
    /// Log to the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl DispatchLog for FileLog {
    fn append(&self, entry: &LogEntry) -> Result<()> {
        let line = format!("{}\n", entry.to_line());

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poison| poison.into_inner());

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir).map_err(|e| {
                CardError::UserError(format!(
                    "failed to create log directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                CardError::UserError(format!(
                    "failed to open log file '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        // One write per line keeps appends from separate processes whole.
        file.write_all(line.as_bytes()).map_err(|e| {
            CardError::UserError(format!(
                "failed to write to log file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

/// Read the last `limit` lines of a log file.
///
/// A missing log file has no entries.
pub fn read_tail(path: &Path, limit: usize) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        CardError::UserError(format!(
            "failed to read log file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(limit);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}
