use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scrape_core::{Settings, SettingsStore};
use scrape_engine::{write_atomic, PersistError};
use scrape_logging::scrape_info;
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "./scrape_settings.ron";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read settings from {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse settings from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid settings path {0:?}")]
    InvalidPath(PathBuf),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Keeps [`Settings`] in a RON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct RonSettingsStore {
    path: PathBuf,
}

impl RonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for RonSettingsStore {
    type Error = StoreError;

    fn load(&self) -> Result<Option<Settings>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let settings = ron::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;
        scrape_info!("Loaded settings from {:?}", self.path);
        Ok(Some(settings))
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StoreError::InvalidPath(self.path.clone()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let content = ron::ser::to_string_pretty(settings, ron::ser::PrettyConfig::new())?;
        write_atomic(dir, filename, content.as_bytes())?;
        Ok(())
    }
}
