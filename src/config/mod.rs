//! User settings with atomic writes.
//!
//! This module provides the persisted configuration the listener and the
//! generator are driven by. Key features:
//!
//! - **JSON schema with defaults**: Missing files and missing keys fall back
//!   to defaults, so an empty `{}` is a valid settings file
//! - **Escaped framing**: Prefix/suffix are stored escaped (`\r`, `<tab>`)
//!   and decoded through [`escapes`]
//! - **Atomic writes**: Uses temp-file-then-rename to prevent corruption
//!
//! # Example
//!
//! ```no_run
//! use openqr::config::SettingsStore;
//!
//! let store = SettingsStore::new(SettingsStore::default_path());
//!
//! let mut settings = store.load()?;
//! settings.scanner.set_framing("qr_", "\r");
//! store.save(&settings)?;
//! # Ok::<(), openqr::config::ConfigError>(())
//! ```

pub mod error;
pub mod escapes;

use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use crate::core::{validator::DEFAULT_SAFE_SCHEMES, AssemblerConfig, DomainPolicy};

pub use error::ConfigError;
use escapes::{decode_escapes, encode_escapes};

/// Settings file location when none is given
pub const DEFAULT_SETTINGS_PATH: &str = "~/.config/openqr/settings.json";

/// Complete settings file
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scanner: ScannerSettings,
    pub domains: DomainSettings,
    pub history: HistorySettings,
    pub generator: GeneratorSettings,
}

impl Settings {
    /// Checks every value that can be malformed in a hand-edited file
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scanner.assembler_config().map(|_| ())
    }
}

/// Scanner framing and timing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Escaped prefix, e.g. `qr_`
    pub prefix: String,
    /// Escaped suffix, e.g. `\r`
    pub suffix: String,
    /// Inactivity timeout in seconds; `0` disables it
    pub timeout_secs: f64,
    pub stop_after_first_scan: bool,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: r"\r".to_string(),
            timeout_secs: 1.0,
            stop_after_first_scan: false,
        }
    }
}

impl ScannerSettings {
    /// Decoded `(prefix, suffix)`
    pub fn framing(&self) -> Result<(String, String), ConfigError> {
        let prefix = decode_escapes(&self.prefix).map_err(|source| ConfigError::InvalidEscape {
            field: "prefix",
            source,
        })?;
        let suffix = decode_escapes(&self.suffix).map_err(|source| ConfigError::InvalidEscape {
            field: "suffix",
            source,
        })?;
        Ok((prefix, suffix))
    }

    /// Stores raw (unescaped) framing values
    pub fn set_framing(&mut self, prefix: &str, suffix: &str) {
        self.prefix = encode_escapes(prefix);
        self.suffix = encode_escapes(suffix);
    }

    pub fn assembler_config(&self) -> Result<AssemblerConfig, ConfigError> {
        let (prefix, suffix) = self.framing()?;
        Ok(AssemblerConfig::new(&prefix, &suffix, self.timeout_secs)?
            .with_stop_after_first_scan(self.stop_after_first_scan))
    }
}

/// Domain allow/block lists and accepted URL schemes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainSettings {
    pub allowlist: Vec<String>,
    pub blocklist: Vec<String>,
    pub safe_schemes: Vec<String>,
    /// Open accepted URLs from any host, not just allowlisted ones
    pub open_urls: bool,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            blocklist: Vec::new(),
            safe_schemes: DEFAULT_SAFE_SCHEMES.iter().map(|s| s.to_string()).collect(),
            open_urls: false,
        }
    }
}

impl DomainSettings {
    pub fn policy(&self) -> DomainPolicy {
        DomainPolicy::new(&self.allowlist, &self.blocklist)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub max_items: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_items: 100 }
    }
}

/// Default QR styling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub fill_color: String,
    pub back_color: String,
    pub logo_path: Option<PathBuf>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            fill_color: "black".to_string(),
            back_color: "white".to_string(),
            logo_path: None,
        }
    }
}

/// Reads and writes the settings file.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/openqr/settings.json`, with `~` expanded
    pub fn default_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde(DEFAULT_SETTINGS_PATH).into_owned())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scan history lives next to the settings file
    pub fn history_path(&self) -> PathBuf {
        self.path.with_file_name("history.json")
    }

    /// Loads settings, returning defaults when the file does not exist
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and
    /// `ConfigError::InvalidEscape`/`InvalidTimeout` for unusable values.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No settings file; using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(e.into()),
        };

        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        settings.validate()?;

        tracing::debug!(path = %self.path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Validates and atomically writes settings, creating parent directories
    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        let json = serde_json::to_string_pretty(settings)?;
        write_atomic(&self.path, json.as_bytes())?;

        tracing::info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

/// Writes `content` to `path` atomically (temp file + rename)
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // Open file for atomic writing
    let mut file = AtomicWriteFile::options()
        .open(path)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to open for atomic write: {}", e)))?;

    file.write_all(content)
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to write content: {}", e)))?;

    // Commit atomically
    file.commit()
        .map_err(|e| ConfigError::WriteFailed(format!("Failed to commit atomic write: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests;
