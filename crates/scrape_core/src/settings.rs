use serde::{Deserialize, Serialize};

use crate::ScrapeRequest;

/// User preferences captured at run start and handed to the orchestrator by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: String,
    pub request: ScrapeRequest,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            request: ScrapeRequest::default(),
        }
    }
}

/// Persistence for [`Settings`]; implemented outside the engine.
pub trait SettingsStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Settings>, Self::Error>;
    fn save(&self, settings: &Settings) -> Result<(), Self::Error>;
}
