//! # Scout
//!
//! Chat orchestration for locally hosted Ollama models, with web search the
//! model can ask for mid-answer.
//!
//! ## Overview
//!
//! A single send runs as a background task that:
//!
//! - **Streams the answer** from Ollama's NDJSON `/api/chat` endpoint
//! - **Watches for search requests**, either structured `web_search` calls or
//!   text markers such as `[SEARCH: "query"]`
//! - **Searches the web** through DuckDuckGo or a configured HTTP API
//! - **Resumes generation** with the results appended to the request history
//!
//! Models that reject tools are retried once in text-marker mode and
//! remembered as tool-less until another model is selected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scout::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new("http://localhost:11434").with_model("llama3.1");
//!
//!     let llm = Arc::new(OllamaClient::new(OllamaConfig::new(&settings.server_url))?);
//!     let search = Arc::new(WebSearchClient::new(SearchClientConfig::default())?);
//!     let engine = ChatEngine::new(llm, search, settings, EngineConfig::default());
//!
//!     let mut session = engine.subscribe();
//!     engine.send("What changed in the latest Rust release?").await?;
//!
//!     let answer = session.wait_for(|s| s.status.phase.is_settled()).await?;
//!     if let Some(turn) = answer.last_turn() {
//!         println!("{}", turn.text());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`scout-llm`**: Ollama client, NDJSON decoding and message types
//! - **`scout-search`**: search engine registry and the web search provider
//! - **`scout-chat`**: conversation session, search detection and the chat engine
//!
//! ## License
//!
//! MIT

pub mod prelude;

pub use scout_llm::{
    ChatClient, ModelCatalog, LlmClient,
    OllamaClient, OllamaConfig,
    ChatRequest, ChatResponse, ChatOptions, ModelInfo, RunningModel,
    Message, Role, Tool, ToolCall, FunctionCall,
    StreamFragment, FragmentStream, LlmError,
};

pub use scout_search::{
    SearchProvider, WebSearchClient, SearchClientConfig,
    SearchEngineConfig, SearchEngineRegistry, SearchEngineType, SearchError,
    web_search_tool, WEB_SEARCH_TOOL,
};

pub use scout_chat::{
    ChatEngine, ChatError, EngineConfig, Settings,
    ConversationSession, ChatTurn, Banner, Phase, SessionStatus, QuickAction,
    ResponseAccumulator, StepOutcome, SearchRequest,
};
