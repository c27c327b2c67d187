//! Prelude module for convenient imports
//!
//! ```rust
//! use scout::prelude::*;
//! ```

pub use crate::{
    ChatClient, ModelCatalog, LlmClient, OllamaClient, OllamaConfig,
    ChatRequest, ChatOptions, Message, Role, ToolCall,
    SearchProvider, WebSearchClient, SearchClientConfig, SearchEngineConfig, SearchEngineType,
    ChatEngine, ChatError, EngineConfig, Settings,
    ConversationSession, ChatTurn, Phase,
};
