//! Scan history
//!
//! Every accepted scan is appended to a JSON file next to the settings,
//! newest last. The file is capped at `max_items`; the oldest records are
//! dropped first.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::config::{write_atomic, ConfigError};

/// Timestamp layout used in records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One scanned URL
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    #[serde(default)]
    pub id: u64,
    pub url: String,
    pub timestamp: String,
}

/// JSON-backed scan history with a length cap
#[derive(Clone, Debug)]
pub struct HistoryStore {
    path: PathBuf,
    max_items: usize,
}

impl HistoryStore {
    pub fn open(path: impl Into<PathBuf>, max_items: usize) -> Self {
        Self {
            path: path.into(),
            max_items,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, oldest first; empty when the file does not exist
    pub fn load(&self) -> Result<Vec<ScanRecord>, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Appends `url` stamped with the local time
    pub fn add(&self, url: &str) -> Result<ScanRecord, ConfigError> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.add_at(url, timestamp)
    }

    pub(crate) fn add_at(&self, url: &str, timestamp: String) -> Result<ScanRecord, ConfigError> {
        let mut records = self.load()?;
        let id = records.iter().map(|r| r.id).max().map_or(1, |max| max + 1);

        let record = ScanRecord {
            id,
            url: url.to_string(),
            timestamp,
        };
        records.push(record.clone());

        // Oldest entries go first
        if records.len() > self.max_items {
            let excess = records.len() - self.max_items;
            records.drain(..excess);
        }

        self.write(&records)?;
        tracing::debug!(id, url = %record.url, "Scan recorded");
        Ok(record)
    }

    pub fn clear(&self) -> Result<(), ConfigError> {
        self.write(&[])?;
        tracing::info!(path = %self.path.display(), "History cleared");
        Ok(())
    }

    fn write(&self, records: &[ScanRecord]) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(records)?;
        write_atomic(&self.path, json.as_bytes())
    }
}
