//! Persisted user settings.
//!
//! # Responsibility
//! - Store the notification toggle and the last notification time.
//!
//! # Invariants
//! - A `SettingsStore` exists only after `open`, so reads and writes can
//!   never hit an uninitialized store.
//! - Writes replace the file atomically (temp file + rename) before the
//!   in-memory copy changes.

use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Settings document. Missing keys fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub notifications_enabled: bool,
    /// Unix epoch milliseconds; `0` means never.
    pub last_notification_ms: i64,
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "settings file error: {err}"),
            Self::Json(err) => write!(f, "settings file is not valid JSON: {err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// File-backed settings store shared across threads.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    state: Mutex<AppSettings>,
}

impl SettingsStore {
    /// Loads settings from `path`; a missing file yields defaults.
    ///
    /// # Errors
    /// - `Io` for unreadable files, `Json` for corrupt ones.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppSettings::default(),
            Err(err) => return Err(err.into()),
        };
        info!(
            "event=settings_open module=settings status=ok path={}",
            path.display()
        );
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> AppSettings {
        self.lock().clone()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.lock().notifications_enabled
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        self.update(|settings| settings.notifications_enabled = enabled)
    }

    pub fn last_notification_ms(&self) -> i64 {
        self.lock().last_notification_ms
    }

    pub fn set_last_notification_ms(&self, epoch_ms: i64) -> Result<(), SettingsError> {
        self.update(|settings| settings.last_notification_ms = epoch_ms)
    }

    /// Resets every key to its default.
    pub fn clear(&self) -> Result<(), SettingsError> {
        self.update(|settings| *settings = AppSettings::default())
    }

    fn update(&self, change: impl FnOnce(&mut AppSettings)) -> Result<(), SettingsError> {
        let mut guard = self.lock();
        let mut next = guard.clone();
        change(&mut next);
        persist(&self.path, &next)?;
        *guard = next;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, AppSettings> {
        // Writes land on disk before the in-memory copy, so a poisoned
        // guard still holds the last persisted value.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn persist(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, serde_json::to_vec_pretty(settings)?)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
