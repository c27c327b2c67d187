use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scout_chat::EngineConfig;
use scout_search::SearchClientConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub ollama: OllamaSection,
    pub search: SearchSection,
    pub engine: EngineSection,
    pub storage: StorageSection,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub ollama_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OllamaSection {
    /// Used only until a settings file exists
    pub url: String,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    pub timeout_secs: u64,
    pub max_results: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    pub max_rounds: usize,
    pub error_banner_secs: u64,
    pub info_banner_secs: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    pub settings_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl From<&EngineSection> for EngineConfig {
    fn from(section: &EngineSection) -> Self {
        let config = EngineConfig::new()
            .with_max_rounds(section.max_rounds)
            .with_error_banner_ttl(Duration::from_secs(section.error_banner_secs))
            .with_info_banner_ttl(Duration::from_secs(section.info_banner_secs));
        match section.temperature {
            Some(temperature) => config.with_temperature(temperature),
            None => config,
        }
    }
}

impl From<&SearchSection> for SearchClientConfig {
    fn from(section: &SearchSection) -> Self {
        SearchClientConfig {
            timeout_secs: section.timeout_secs,
            max_results: section.max_results,
            user_agent: section.user_agent.clone(),
            ..SearchClientConfig::default()
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. SCOUT__SECTION__KEY environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = with_defaults(ConfigLoader::builder())?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("SCOUT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Optional: a protected server can also be configured from the REPL.
        cfg.ollama_api_key = std::env::var("OLLAMA_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = with_defaults(ConfigLoader::builder())?.add_source(File::from(path.as_ref()));
        builder.build()?.try_deserialize()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.connect_timeout_secs)
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    builder
        .set_default("ollama.url", scout_chat::types::DEFAULT_SERVER_URL)?
        .set_default("ollama.connect_timeout_secs", 30)?
        .set_default("search.timeout_secs", 15)?
        .set_default("search.max_results", 5)?
        .set_default("search.user_agent", "Mozilla/5.0")?
        .set_default("engine.max_rounds", 5)?
        .set_default("engine.error_banner_secs", 10)?
        .set_default("engine.info_banner_secs", 5)?
        .set_default("storage.settings_path", "scout-settings.json")?
        .set_default("logging.level", "warn")?
        .set_default("logging.format", "pretty")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [ollama]
            url = "http://gpu-box:11434"
            connect_timeout_secs = 10

            [search]
            timeout_secs = 20
            max_results = 3
            user_agent = "scout-test"

            [engine]
            max_rounds = 4
            error_banner_secs = 10
            info_banner_secs = 5
            temperature = 0.25

            [storage]
            settings_path = "/tmp/scout.json"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ollama.url, "http://gpu-box:11434");
        assert_eq!(config.search.max_results, 3);
        assert!(config.ollama_api_key.is_none());

        let engine = EngineConfig::from(&config.engine);
        assert_eq!(engine.max_rounds, 4);
        assert_eq!(engine.error_banner_ttl, Duration::from_secs(10));
        assert_eq!(engine.temperature, Some(0.25));

        let search = SearchClientConfig::from(&config.search);
        assert_eq!(search.timeout_secs, 20);
        assert_eq!(search.user_agent, "scout-test");
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.toml");
        std::fs::write(&path, "[engine]\nmax_rounds = 2\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.engine.max_rounds, 2);
        assert_eq!(config.engine.info_banner_secs, 5);
        assert!(config.engine.temperature.is_none());
        assert_eq!(config.ollama.url, "http://localhost:11434");
        assert_eq!(config.logging.format, "pretty");
    }
}
