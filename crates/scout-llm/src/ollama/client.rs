// Ollama-specific client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::config::OllamaConfig;
use crate::error::{LlmError, Result};
use crate::streaming::{parse_ndjson_stream, FragmentStream, MessageDelta};
use crate::traits::{
    ChatClient, ChatRequest, ChatResponse, LlmClient, ModelCatalog, ModelInfo, RunningModel,
};
use crate::types::{Message, Tool};

/// Ollama client (HTTP direct, no SDK)
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| LlmError::Config(format!("invalid API key format: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_chat_payload<'a>(&self, request: &'a ChatRequest, stream: bool) -> ChatPayload<'a> {
        ChatPayload {
            model: &request.model,
            messages: &request.messages,
            stream,
            tools: request.options.tools.as_deref().filter(|t| !t.is_empty()),
            web_search: request.options.web_search.then_some(true),
            options: request
                .options
                .temperature
                .map(|temperature| PayloadOptions { temperature }),
        }
    }

    async fn post_chat(&self, payload: &ChatPayload<'_>) -> Result<Response> {
        tracing::debug!(
            model = payload.model,
            messages = payload.messages.len(),
            stream = payload.stream,
            tools = payload.tools.is_some(),
            "Sending chat request"
        );

        let response = self
            .http_client
            .post(self.url("/api/chat"))
            .json(payload)
            .send()
            .await?;

        ensure_success(response).await
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let response = self.http_client.get(self.url(path)).send().await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let error_text = response.text().await.unwrap_or_default();
    tracing::warn!("Ollama API error ({}): {}", status, error_text);
    Err(LlmError::from_error_body(status, error_text))
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_chat_payload(&request, false);
        let response = self.post_chat(&payload).await?;

        let body = response.text().await?;
        let raw: OllamaChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Decode(e.to_string()))?;

        if let Some(message) = raw.error {
            return Err(LlmError::from_server_message(message));
        }

        let message = raw.message.unwrap_or_default();
        Ok(ChatResponse {
            model: raw.model,
            content: message.content,
            reasoning: message.reasoning,
            tool_calls: message.tool_calls,
            done: raw.done,
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<FragmentStream> {
        let payload = self.build_chat_payload(&request, true);
        let response = self.post_chat(&payload).await?;
        Ok(parse_ndjson_stream(response))
    }
}

#[async_trait]
impl ModelCatalog for OllamaClient {
    async fn health_check(&self) -> Result<()> {
        self.get("/").await?;
        Ok(())
    }

    async fn version(&self) -> Result<String> {
        let raw: VersionResponse = self.get("/api/version").await?.json().await?;
        Ok(raw.version)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let raw: ModelsResponse<ModelInfo> = self.get("/api/tags").await?.json().await?;
        Ok(raw.models)
    }

    async fn running_models(&self) -> Result<Vec<RunningModel>> {
        let raw: ModelsResponse<RunningModel> = self.get("/api/ps").await?.json().await?;
        Ok(raw.models)
    }
}

impl LlmClient for OllamaClient {}

// ============================================================================
// OLLAMA WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    web_search: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<PayloadOptions>,
}

#[derive(Debug, Serialize)]
struct PayloadOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    message: Option<MessageDelta>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse<T> {
    #[serde(default = "Vec::new")]
    models: Vec<T>,
}
