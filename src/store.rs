//! Persisted view mode: one `viewMode` key in a small TOML file

use crate::error::{Error, Result};
use crate::view_mode::ViewMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Key under which the mode name is stored
pub const VIEW_MODE_KEY: &str = "viewMode";

pub trait ModeStore {
    /// Stored mode; unreadable or unknown values resolve to GrandScheme
    fn load(&self) -> ViewMode;
    fn save(&mut self, mode: ViewMode) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(rename = "viewMode", default, skip_serializing_if = "Option::is_none")]
    view_mode: Option<String>,
}

/// Store backed by a file on disk
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        match toml::from_str::<StateFile>(&content) {
            Ok(state) => state.view_mode,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring malformed state file: {}", e);
                None
            }
        }
    }

    fn store_err(&self, reason: impl ToString) -> Error {
        Error::Store {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl ModeStore for FileStore {
    fn load(&self) -> ViewMode {
        ViewMode::from_persisted(self.read_raw().as_deref())
    }

    fn save(&mut self, mode: ViewMode) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.store_err(e))?;
            }
        }
        let state = StateFile {
            view_mode: Some(mode.label().to_string()),
        };
        let body = toml::to_string(&state).map_err(|e| self.store_err(e))?;
        fs::write(&self.path, body).map_err(|e| self.store_err(e))?;
        tracing::debug!(path = %self.path.display(), %mode, "saved view mode");
        Ok(())
    }
}

/// In-process store holding the raw string, as a file would
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Option<String>,
}

impl MemoryStore {
    pub fn with_raw(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl ModeStore for MemoryStore {
    fn load(&self) -> ViewMode {
        ViewMode::from_persisted(self.value.as_deref())
    }

    fn save(&mut self, mode: ViewMode) -> Result<()> {
        self.value = Some(mode.label().to_string());
        Ok(())
    }
}
