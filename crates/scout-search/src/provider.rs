use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::duckduckgo::{format_results, parse_results};
use crate::engines::{SearchEngineConfig, SearchEngineType};
use crate::error::{Result, SearchError};

pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";
pub const UNKNOWN_ENGINE_RESULT: &str = "Error: Unknown search engine type.";

const SERPER_HOST: &str = "serper.dev";
const SERPER_KEY_HEADER: &str = "X-API-KEY";

/// Executes a search and always answers with text.
///
/// Failures come back as a readable description so the caller can hand
/// them to the model like any other result.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, engine: &SearchEngineConfig) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchClientConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub duckduckgo_url: String,
    pub max_results: usize,
}

impl Default for SearchClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "Mozilla/5.0".to_string(),
            duckduckgo_url: DUCKDUCKGO_HTML_URL.to_string(),
            max_results: 5,
        }
    }
}

impl SearchClientConfig {
    pub fn with_duckduckgo_url(mut self, url: impl Into<String>) -> Self {
        self.duckduckgo_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }
}

/// HTTP-backed provider covering every engine type
#[derive(Debug, Clone)]
pub struct WebSearchClient {
    http_client: reqwest::Client,
    config: SearchClientConfig,
}

impl WebSearchClient {
    pub fn new(config: SearchClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http_client,
            config,
        })
    }

    pub async fn try_search(&self, query: &str, engine: &SearchEngineConfig) -> Result<String> {
        tracing::info!(engine = %engine.name, kind = %engine.engine_type, query, "Running web search");
        match engine.engine_type {
            SearchEngineType::DuckDuckGo => self.search_duckduckgo(query).await,
            SearchEngineType::ApiGet => self.search_api_get(query, engine).await,
            SearchEngineType::ApiPost => self.search_api_post(query, engine).await,
            SearchEngineType::Unknown => Err(SearchError::UnknownEngineType),
        }
    }

    async fn search_duckduckgo(&self, query: &str) -> Result<String> {
        let url = format!(
            "{}?q={}",
            self.config.duckduckgo_url,
            urlencoding::encode(query)
        );
        let html = self
            .http_client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.config.user_agent)
            .send()
            .await?
            .text()
            .await?;

        let hits = parse_results(&html, self.config.max_results);
        tracing::debug!(hits = hits.len(), "Parsed DuckDuckGo results");
        Ok(format_results(&hits))
    }

    async fn search_api_get(&self, query: &str, engine: &SearchEngineConfig) -> Result<String> {
        let mut request = self.http_client.get(api_get_url(&engine.url, query));
        if let Some(value) = engine.auth_value() {
            request = request.header(engine.auth_header.as_str(), value);
        }

        let body = request.send().await?.text().await?;
        let trimmed = body.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') {
            Ok(format!("Search Results (JSON Raw):\n{}", body))
        } else {
            Ok(format!("Search Results:\n{}", body))
        }
    }

    async fn search_api_post(&self, query: &str, engine: &SearchEngineConfig) -> Result<String> {
        let is_serper = engine.url.contains(SERPER_HOST);
        let payload = if is_serper {
            serde_json::json!({ "q": query })
        } else {
            serde_json::json!({ "query": query })
        };

        let mut request = self.http_client.post(&engine.url).json(&payload);
        if let Some(value) = engine.auth_value() {
            request = request.header(engine.auth_header.as_str(), value);
        }
        if is_serper && !engine.auth_header.eq_ignore_ascii_case(SERPER_KEY_HEADER) {
            if let Some(key) = engine.api_key() {
                request = request.header(SERPER_KEY_HEADER, key);
            }
        }

        let body = request.send().await?.text().await?;
        Ok(format!("Search Results (POST):\n{}", body))
    }
}

#[async_trait]
impl SearchProvider for WebSearchClient {
    async fn search(&self, query: &str, engine: &SearchEngineConfig) -> String {
        match self.try_search(query, engine).await {
            Ok(text) => text,
            Err(SearchError::UnknownEngineType) => UNKNOWN_ENGINE_RESULT.to_string(),
            Err(e) => {
                tracing::warn!(engine = %engine.name, "Search failed: {}", e);
                format!("Search error: {}", e)
            }
        }
    }
}

/// Put the encoded query into `{query}`, or append it as `q`.
pub fn api_get_url(template: &str, query: &str) -> String {
    let encoded = urlencoding::encode(query);
    if template.contains("{query}") {
        template.replace("{query}", &encoded)
    } else {
        let separator = if template.contains('?') { '&' } else { '?' };
        format!("{}{}q={}", template, separator, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_substituted() {
        assert_eq!(
            api_get_url("https://api.example.com/search?term={query}&n=5", "rust lang"),
            "https://api.example.com/search?term=rust%20lang&n=5"
        );
    }

    #[test]
    fn test_query_parameter_is_appended() {
        assert_eq!(api_get_url("https://s.example/api", "a&b"), "https://s.example/api?q=a%26b");
        assert_eq!(
            api_get_url("https://s.example/api?lang=en", "x"),
            "https://s.example/api?lang=en&q=x"
        );
    }
}
