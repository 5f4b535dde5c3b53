//! Turning the harvested aggregate into an artifact or a remote push.
mod csv;
mod filename;
mod push;

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

use crate::persist::{write_atomic, PersistError};

pub use self::csv::{normalize_field, to_csv, CSV_HEADERS, DEFAULT_CURRENCY};
pub use filename::export_filename;
pub use push::{ApiExporter, PushError, PushSettings, PushSummary};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("csv output is not utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Push(#[from] PushError),
}

/// Receives a finished text artifact and returns where it ended up.
pub trait ArtifactSink: Send + Sync {
    fn deliver(&self, filename: &str, content: &str) -> Result<String, ExportError>;
}

/// Writes artifacts into one directory, atomically.
#[derive(Debug, Clone)]
pub struct DirectoryArtifactSink {
    dir: PathBuf,
}

impl DirectoryArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirectoryArtifactSink {
    fn deliver(&self, filename: &str, content: &str) -> Result<String, ExportError> {
        let path = write_atomic(&self.dir, filename, content.as_bytes())?;
        Ok(path.display().to_string())
    }
}
