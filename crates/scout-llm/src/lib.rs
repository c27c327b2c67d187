pub mod config;
pub mod error;
pub mod line_buffer;
pub mod ollama;
pub mod streaming;
pub mod traits;
pub mod types;

pub use traits::{
    ChatClient,
    ModelCatalog,
    LlmClient,
    ChatRequest, ChatResponse, ChatOptions,
    ModelInfo, ModelDetails, RunningModel,
};

pub use config::OllamaConfig;
pub use error::{LlmError, Result};
pub use line_buffer::LineBuffer;
pub use ollama::OllamaClient;
pub use streaming::{decode_ndjson, FragmentStream, StreamFragment};
pub use types::{FunctionCall, Message, Role, Tool, ToolCall};
