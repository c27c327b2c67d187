#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use futures::stream;
use scout_chat::{ChatEngine, ConversationSession, EngineConfig, Settings};
use scout_llm::{
    decode_ndjson, ChatClient, ChatRequest, ChatResponse, FragmentStream, LlmClient, LlmError,
    ModelCatalog, ModelInfo, RunningModel,
};
use scout_search::{SearchEngineConfig, SearchProvider};
use serde_json::json;
use tokio::sync::{watch, Notify};

pub type ByteChunk = Result<Vec<u8>, std::io::Error>;

pub const TEST_MODEL: &str = "llama3";

/// What the fake server answers to the next chat call
pub enum Reply {
    /// NDJSON lines, streamed and then closed
    Lines(Vec<String>),
    /// Bytes pushed by the test; the stream stays open until the sender drops
    Channel(UnboundedReceiver<ByteChunk>),
    ToolsUnsupported,
    ApiError(u16, String),
    Complete(ChatResponse),
}

pub fn line(content: &str) -> String {
    json!({"model": TEST_MODEL, "message": {"role": "assistant", "content": content}, "done": false})
        .to_string()
}

pub fn done_line() -> String {
    json!({"model": TEST_MODEL, "message": {"role": "assistant", "content": ""}, "done": true})
        .to_string()
}

pub fn tool_call_line(id: Option<&str>, query: &str) -> String {
    let mut call = json!({"function": {"name": "web_search", "arguments": {"query": query}}});
    if let Some(id) = id {
        call["id"] = json!(id);
    }
    json!({"model": TEST_MODEL, "message": {"role": "assistant", "content": "", "tool_calls": [call]}, "done": false})
        .to_string()
}

pub fn chunk(line: &str) -> ByteChunk {
    Ok(format!("{}\n", line).into_bytes())
}

fn tools_rejection() -> LlmError {
    LlmError::from_error_body(
        400,
        format!(r#"{{"error":"registry.ollama.ai/library/{} does not support tools"}}"#, TEST_MODEL),
    )
}

/// Fake model server answering from a script and recording every request
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
    models: Vec<String>,
    healthy: bool,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            models: vec![TEST_MODEL.to_string()],
            healthy: true,
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            models: Vec::new(),
            healthy: false,
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn take(&self, request: ChatRequest) -> Option<Reply> {
        self.requests.lock().unwrap().push(request);
        self.replies.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> scout_llm::Result<ChatResponse> {
        match self.take(request) {
            Some(Reply::Complete(response)) => Ok(response),
            Some(Reply::ToolsUnsupported) => Err(tools_rejection()),
            Some(Reply::ApiError(status, body)) => Err(LlmError::from_error_body(status, body)),
            _ => Err(LlmError::Server("no scripted non-streaming reply".into())),
        }
    }

    async fn chat_stream(&self, request: ChatRequest) -> scout_llm::Result<FragmentStream> {
        match self.take(request) {
            Some(Reply::Lines(lines)) => {
                let chunks: Vec<ByteChunk> = lines.iter().map(|l| chunk(l)).collect();
                Ok(decode_ndjson(stream::iter(chunks)))
            }
            Some(Reply::Channel(rx)) => Ok(decode_ndjson(rx)),
            Some(Reply::ToolsUnsupported) => Err(tools_rejection()),
            Some(Reply::ApiError(status, body)) => Err(LlmError::from_error_body(status, body)),
            _ => Err(LlmError::Server("no scripted streaming reply".into())),
        }
    }
}

#[async_trait]
impl ModelCatalog for ScriptedClient {
    async fn health_check(&self) -> scout_llm::Result<()> {
        if self.healthy {
            Ok(())
        } else {
            Err(LlmError::Stream("connection refused".into()))
        }
    }

    async fn version(&self) -> scout_llm::Result<String> {
        Ok("0.0.0-test".into())
    }

    async fn list_models(&self) -> scout_llm::Result<Vec<ModelInfo>> {
        Ok(self
            .models
            .iter()
            .map(|name| ModelInfo {
                name: name.clone(),
                model: name.clone(),
                size: 0,
                modified_at: None,
                details: None,
            })
            .collect())
    }

    async fn running_models(&self) -> scout_llm::Result<Vec<RunningModel>> {
        Ok(vec![RunningModel {
            name: TEST_MODEL.into(),
            model: TEST_MODEL.into(),
            size: 0,
            size_vram: 0,
        }])
    }
}

impl LlmClient for ScriptedClient {}

/// Search double returning a fixed text, optionally held until released
pub struct FakeSearch {
    result: String,
    queries: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl FakeSearch {
    pub fn returning(result: &str) -> Arc<Self> {
        Arc::new(Self {
            result: result.to_string(),
            queries: Mutex::new(Vec::new()),
            gate: None,
        })
    }

    pub fn gated(result: &str, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            result: result.to_string(),
            queries: Mutex::new(Vec::new()),
            gate: Some(gate),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FakeSearch {
    async fn search(&self, query: &str, _engine: &SearchEngineConfig) -> String {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.result.clone()
    }
}

pub fn settings() -> Settings {
    Settings::new("http://ollama.test").with_model(TEST_MODEL)
}

pub fn engine(
    client: Arc<ScriptedClient>,
    search: Arc<dyn SearchProvider>,
    settings: Settings,
) -> ChatEngine {
    engine_with_config(client, search, settings, EngineConfig::default())
}

pub fn engine_with_config(
    client: Arc<ScriptedClient>,
    search: Arc<dyn SearchProvider>,
    settings: Settings,
    config: EngineConfig,
) -> ChatEngine {
    ChatEngine::new(client, search, settings, config)
}

pub async fn wait_until<F>(rx: &mut watch::Receiver<ConversationSession>, pred: F) -> ConversationSession
where
    F: FnMut(&ConversationSession) -> bool,
{
    wait_until_within(rx, Duration::from_secs(5), pred).await
}

pub async fn wait_until_within<F>(
    rx: &mut watch::Receiver<ConversationSession>,
    limit: Duration,
    mut pred: F,
) -> ConversationSession
where
    F: FnMut(&ConversationSession) -> bool,
{
    let session = tokio::time::timeout(limit, rx.wait_for(|s| pred(s)))
        .await
        .expect("timed out waiting for session state")
        .expect("session channel closed");
    session.clone()
}
