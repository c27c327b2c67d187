//! Settings persisted as JSON between sessions.

use std::path::{Path, PathBuf};

use anyhow::Context;
use scout_chat::Settings;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored settings, or `None` on first run.
    pub fn load(&self) -> anyhow::Result<Option<Settings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let settings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings file {}", self.path.display()))?;
        Ok(Some(settings))
    }

    /// Stored settings, or `fallback()` when there are none or they can't be read.
    pub fn load_or_else(&self, fallback: impl FnOnce() -> Settings) -> Settings {
        match self.load() {
            Ok(Some(settings)) => {
                tracing::info!(path = %self.path.display(), "Settings loaded");
                settings
            }
            Ok(None) => fallback(),
            Err(e) => {
                tracing::warn!("Ignoring stored settings: {:#}", e);
                fallback()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Write every settings change to disk until the engine goes away.
    pub fn autosave(self, mut changes: watch::Receiver<Settings>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let settings = changes.borrow_and_update().clone();
                match self.save(&settings) {
                    Ok(()) => tracing::debug!(path = %self.path.display(), "Settings saved"),
                    Err(e) => tracing::warn!("Failed to save settings: {:#}", e),
                }
            }
        })
    }
}
