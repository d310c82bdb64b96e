// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! File system watcher for live settings reload
//!
//! Uses OS-level file watching (Linux inotify) via the notify crate.
//! The parent directory is watched rather than the file itself: atomic
//! saves replace the file, which would silently end a watch on the old inode.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    sync::mpsc::{channel, Receiver},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Settings path has no file name: {0}")]
    InvalidPath(PathBuf),

    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Watches the settings file for modifications
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    file_name: OsString,
}

impl SettingsWatcher {
    pub fn new(path: &Path) -> Result<Self, WatchError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| WatchError::InvalidPath(path.to_path_buf()))?
            .to_os_string();

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::debug!(dir = %dir.display(), "Watching for settings changes");

        Ok(SettingsWatcher {
            _watcher: watcher,
            rx,
            file_name,
        })
    }

    /// Checks for settings file modification events (non-blocking)
    ///
    /// Drains every pending event; returns true if any touched the file.
    pub fn check_for_changes(&self) -> bool {
        let mut changed = false;

        while let Ok(event_result) = self.rx.try_recv() {
            match event_result {
                Ok(event) => changed |= self.is_relevant(&event),
                Err(e) => tracing::debug!(error = %e, "File watcher reported an error"),
            }
        }

        changed
    }

    fn is_relevant(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, thread, time::Duration};
    use tempfile::TempDir;

    /// Polls the watcher for up to two seconds
    fn wait_for_change(watcher: &SettingsWatcher) -> bool {
        for _ in 0..40 {
            if watcher.check_for_changes() {
                return true;
            }
            thread::sleep(Duration::from_millis(50));
        }
        false
    }

    #[test]
    fn test_detects_write_to_settings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{}").unwrap();

        let watcher = SettingsWatcher::new(&path).unwrap();
        fs::write(&path, r#"{ "scanner": {} }"#).unwrap();

        assert!(wait_for_change(&watcher));
    }

    #[test]
    fn test_detects_atomic_replace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, "{}").unwrap();

        let watcher = SettingsWatcher::new(&path).unwrap();
        crate::config::write_atomic(&path, b"{\"history\": {}}").unwrap();

        assert!(wait_for_change(&watcher));
    }

    #[test]
    fn test_ignores_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        let watcher = SettingsWatcher::new(&path).unwrap();
        fs::write(temp_dir.path().join("history.json"), "[]").unwrap();
        thread::sleep(Duration::from_millis(300));

        assert!(!watcher.check_for_changes());
    }

    #[test]
    fn test_path_without_file_name_rejected() {
        assert!(matches!(
            SettingsWatcher::new(Path::new("/")),
            Err(WatchError::InvalidPath(_))
        ));
    }
}
