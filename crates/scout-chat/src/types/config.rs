use scout_search::SearchEngineRegistry;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Generation rounds allowed per send, search rounds included
    pub max_rounds: usize,
    pub error_banner_ttl: Duration,
    pub info_banner_ttl: Duration,
    /// Sampling temperature sent with every request; the server default when unset
    pub temperature: Option<f32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            error_banner_ttl: Duration::from_secs(10),
            info_banner_ttl: Duration::from_secs(5),
            temperature: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max.max(1);
        self
    }

    pub fn with_error_banner_ttl(mut self, ttl: Duration) -> Self {
        self.error_banner_ttl = ttl;
        self
    }

    pub fn with_info_banner_ttl(mut self, ttl: Duration) -> Self {
        self.info_banner_ttl = ttl;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// User preferences the engine reads at start-up and reports on change.
/// Persisting them is the embedder's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub web_search_enabled: bool,
    pub streaming_enabled: bool,
    pub search_engines: SearchEngineRegistry,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: None,
            model: None,
            web_search_enabled: true,
            streaming_enabled: true,
            search_engines: SearchEngineRegistry::default(),
        }
    }
}

impl Settings {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_web_search(mut self, enabled: bool) -> Self {
        self.web_search_enabled = enabled;
        self
    }

    pub fn with_streaming(mut self, enabled: bool) -> Self {
        self.streaming_enabled = enabled;
        self
    }

    pub fn with_search_engines(mut self, engines: SearchEngineRegistry) -> Self {
        self.search_engines = engines;
        self
    }

    pub fn has_server_url(&self) -> bool {
        self.server_url.trim().starts_with("http")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert!(settings.web_search_enabled);
        assert!(settings.streaming_enabled);
        assert!(settings.model.is_none());
        assert_eq!(settings.search_engines.selected_id(), scout_search::DEFAULT_ENGINE_ID);
    }

    #[test]
    fn test_partial_settings_deserialize() {
        let settings: Settings =
            serde_json::from_str(r#"{"model":"llama3","streaming_enabled":false}"#).unwrap();
        assert_eq!(settings.model.as_deref(), Some("llama3"));
        assert!(!settings.streaming_enabled);
        assert!(settings.web_search_enabled);
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_max_rounds_never_zero() {
        assert_eq!(EngineConfig::new().with_max_rounds(0).max_rounds, 1);
    }
}
