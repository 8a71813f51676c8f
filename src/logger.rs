// src/logger.rs
use crate::config::Config;
use crate::utils::TIMESTAMP_FORMAT;
use chrono::{DateTime, Local};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One timestamped event, serialized as `<timestamp> : <message>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogRecord {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    pub fn to_line(&self) -> String {
        format!("{} : {}\n", self.timestamp.format(TIMESTAMP_FORMAT), self.message)
    }
}

/// Append-only event log shared by the menu loop and the background task.
///
/// The file is opened for every record and closed again before `log`
/// returns. The mutex keeps the two writers from interleaving partial lines.
#[derive(Debug)]
pub struct Logger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl Logger {
    /// Creates the backup directory and the log file's parent directory.
    pub fn init(config: &Config) -> io::Result<Self> {
        fs::create_dir_all(&config.backup_dir)?;
        if let Some(parent) = config.log_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self::new(&config.log_file))
    }

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, message: &str) -> io::Result<()> {
        self.append(&LogRecord::now(message))
    }

    pub fn append(&self, record: &LogRecord) -> io::Result<()> {
        let line = record.to_line();
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        tracing::debug!(path = %self.path.display(), message = %record.message, "log record appended");
        Ok(())
    }
}
