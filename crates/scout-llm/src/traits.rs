use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::streaming::{FragmentStream, StreamFragment};
use crate::types::{Message, Tool, ToolCall};

/// Chat completions against a model server.
///
/// Implementations must be safe to share between the generation path and
/// the search path.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Non-streaming chat completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Streaming chat completion. The returned stream is lazy and finite.
    async fn chat_stream(&self, request: ChatRequest) -> Result<FragmentStream>;
}

/// Server plumbing: reachability and model discovery
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    async fn health_check(&self) -> Result<()>;

    async fn version(&self) -> Result<String>;

    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    async fn running_models(&self) -> Result<Vec<RunningModel>>;
}

/// Convenience trait for clients that chat and describe their models
pub trait LlmClient: ChatClient + ModelCatalog {}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn has_tools(&self) -> bool {
        self.options.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub tools: Option<Vec<Tool>>,
    /// Ask the server to search on the model's behalf
    pub web_search: bool,
    pub temperature: Option<f32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Complete answer of a non-streaming request
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub model: String,
    pub content: Option<String>,
    pub reasoning: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
    pub done: bool,
}

impl ChatResponse {
    /// View the whole answer as a single fragment.
    pub fn into_fragment(self) -> StreamFragment {
        StreamFragment {
            content: self.content.unwrap_or_default(),
            reasoning: self.reasoning.unwrap_or_default(),
            tool_calls: self.tool_calls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub parameter_size: Option<String>,
    #[serde(default)]
    pub quantization_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningModel {
    pub name: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub size_vram: u64,
}
