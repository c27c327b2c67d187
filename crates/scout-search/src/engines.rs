use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SearchError};

pub const DEFAULT_ENGINE_ID: &str = "default_ddg";
pub const DEFAULT_ENGINE_NAME: &str = "DuckDuckGo (Scraper)";
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchEngineType {
    #[serde(rename = "DUCKDUCKGO")]
    DuckDuckGo,
    #[serde(rename = "API_GET")]
    ApiGet,
    #[serde(rename = "API_POST")]
    ApiPost,
    /// Stored configs may name a type this build does not know
    #[serde(other)]
    Unknown,
}

impl SearchEngineType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuckDuckGo => "DUCKDUCKGO",
            Self::ApiGet => "API_GET",
            Self::ApiPost => "API_POST",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SearchEngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchEngineType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DUCKDUCKGO" => Ok(Self::DuckDuckGo),
            "API_GET" => Ok(Self::ApiGet),
            "API_POST" => Ok(Self::ApiPost),
            _ => Err(SearchError::UnknownEngineType),
        }
    }
}

/// One configured search backend.
///
/// `url` may contain a `{query}` placeholder (GET engines). The key is sent
/// under `auth_header`, as a bearer token when that header is `Authorization`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEngineConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub engine_type: SearchEngineType,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    #[serde(default = "default_deletable")]
    pub deletable: bool,
}

fn default_auth_header() -> String {
    DEFAULT_AUTH_HEADER.to_string()
}

fn default_deletable() -> bool {
    true
}

impl SearchEngineConfig {
    pub fn new(name: impl Into<String>, engine_type: SearchEngineType, url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            engine_type,
            url: url.into(),
            api_key: None,
            auth_header: default_auth_header(),
            deletable: true,
        }
    }

    /// The built-in scraping engine. It can never be removed.
    pub fn duckduckgo_default() -> Self {
        Self {
            id: DEFAULT_ENGINE_ID.to_string(),
            name: DEFAULT_ENGINE_NAME.to_string(),
            engine_type: SearchEngineType::DuckDuckGo,
            url: String::new(),
            api_key: None,
            auth_header: default_auth_header(),
            deletable: false,
        }
    }

    /// Blank keys are treated as "no key".
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        self.api_key = if api_key.trim().is_empty() {
            None
        } else {
            Some(api_key)
        };
        self
    }

    /// Blank header names fall back to `Authorization`.
    pub fn with_auth_header(mut self, header: impl Into<String>) -> Self {
        let header = header.into();
        self.auth_header = if header.trim().is_empty() {
            default_auth_header()
        } else {
            header.trim().to_string()
        };
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Header value for the configured key
    pub fn auth_value(&self) -> Option<String> {
        let key = self.api_key()?;
        if self.auth_header.eq_ignore_ascii_case("authorization") {
            Some(format!("Bearer {}", key))
        } else {
            Some(key.to_string())
        }
    }
}

/// The configured engines plus the pointer to the selected one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEngineRegistry {
    engines: Vec<SearchEngineConfig>,
    selected_id: String,
}

impl Default for SearchEngineRegistry {
    fn default() -> Self {
        Self {
            engines: vec![SearchEngineConfig::duckduckgo_default()],
            selected_id: DEFAULT_ENGINE_ID.to_string(),
        }
    }
}

impl SearchEngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted engines; the default engine is restored if missing.
    pub fn from_engines(engines: Vec<SearchEngineConfig>, selected_id: impl Into<String>) -> Self {
        let mut registry = Self {
            engines,
            selected_id: selected_id.into(),
        };
        if registry.get(DEFAULT_ENGINE_ID).is_none() {
            registry
                .engines
                .insert(0, SearchEngineConfig::duckduckgo_default());
        }
        registry
    }

    pub fn engines(&self) -> &[SearchEngineConfig] {
        &self.engines
    }

    pub fn selected_id(&self) -> &str {
        &self.selected_id
    }

    pub fn get(&self, id: &str) -> Option<&SearchEngineConfig> {
        self.engines.iter().find(|e| e.id == id)
    }

    /// The selected engine, falling back to the default when the pointer dangles.
    pub fn selected(&self) -> SearchEngineConfig {
        self.get(&self.selected_id)
            .or_else(|| self.get(DEFAULT_ENGINE_ID))
            .cloned()
            .unwrap_or_else(SearchEngineConfig::duckduckgo_default)
    }

    /// Add an engine and return its id. A clashing id is replaced with a fresh one.
    pub fn add(&mut self, mut engine: SearchEngineConfig) -> String {
        if engine.id.is_empty() || self.get(&engine.id).is_some() {
            engine.id = uuid::Uuid::new_v4().to_string();
        }
        let id = engine.id.clone();
        tracing::debug!(id = %id, name = %engine.name, "Adding search engine");
        self.engines.push(engine);
        id
    }

    /// Remove an engine. Removing the selected engine selects the default.
    pub fn remove(&mut self, id: &str) -> Result<SearchEngineConfig> {
        let index = self
            .engines
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| SearchError::EngineNotFound(id.to_string()))?;

        if !self.engines[index].deletable {
            return Err(SearchError::EngineNotDeletable(id.to_string()));
        }

        let removed = self.engines.remove(index);
        if self.selected_id == id {
            self.selected_id = DEFAULT_ENGINE_ID.to_string();
        }
        Ok(removed)
    }

    pub fn select(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(SearchError::EngineNotFound(id.to_string()));
        }
        self.selected_id = id.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_selects_duckduckgo() {
        let registry = SearchEngineRegistry::default();
        assert_eq!(registry.engines().len(), 1);
        assert_eq!(registry.selected().id, DEFAULT_ENGINE_ID);
        assert!(!registry.selected().deletable);
    }

    #[test]
    fn test_add_and_remove_engine() {
        let mut registry = SearchEngineRegistry::default();
        let id = registry.add(SearchEngineConfig::new(
            "Brave",
            SearchEngineType::ApiGet,
            "https://api.search.brave.com/res/v1/web/search",
        ));
        registry.select(&id).unwrap();
        assert_eq!(registry.selected().name, "Brave");

        let removed = registry.remove(&id).unwrap();
        assert_eq!(removed.name, "Brave");
        assert_eq!(registry.selected_id(), DEFAULT_ENGINE_ID);
    }

    #[test]
    fn test_default_engine_cannot_be_removed() {
        let mut registry = SearchEngineRegistry::default();
        let err = registry.remove(DEFAULT_ENGINE_ID).unwrap_err();
        assert!(matches!(err, SearchError::EngineNotDeletable(_)));
        assert_eq!(registry.engines().len(), 1);
    }

    #[test]
    fn test_selecting_unknown_engine_fails() {
        let mut registry = SearchEngineRegistry::default();
        assert!(matches!(
            registry.select("missing"),
            Err(SearchError::EngineNotFound(_))
        ));
    }

    #[test]
    fn test_dangling_selection_falls_back_to_default() {
        let registry = SearchEngineRegistry::from_engines(Vec::new(), "gone");
        assert_eq!(registry.selected().id, DEFAULT_ENGINE_ID);
    }

    #[test]
    fn test_auth_value_uses_bearer_only_for_authorization() {
        let bearer = SearchEngineConfig::new("A", SearchEngineType::ApiGet, "u").with_api_key("k");
        assert_eq!(bearer.auth_value().as_deref(), Some("Bearer k"));

        let raw = SearchEngineConfig::new("B", SearchEngineType::ApiGet, "u")
            .with_api_key("k")
            .with_auth_header("X-API-KEY");
        assert_eq!(raw.auth_value().as_deref(), Some("k"));

        let none = SearchEngineConfig::new("C", SearchEngineType::ApiGet, "u").with_api_key("");
        assert!(none.auth_value().is_none());
    }

    #[test]
    fn test_unknown_type_deserializes() {
        let engine: SearchEngineConfig = serde_json::from_str(
            r#"{"id":"x","name":"Legacy","type":"SOAP","url":"http://legacy"}"#,
        )
        .unwrap();
        assert_eq!(engine.engine_type, SearchEngineType::Unknown);
        assert_eq!(engine.auth_header, "Authorization");
        assert!(engine.deletable);
    }

    #[test]
    fn test_type_parses_case_insensitively() {
        assert_eq!("api_post".parse::<SearchEngineType>().unwrap(), SearchEngineType::ApiPost);
        assert!("graphql".parse::<SearchEngineType>().is_err());
    }
}
