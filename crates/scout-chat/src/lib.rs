pub mod detector;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod publisher;
mod run;
pub mod types;

pub use detector::{detect, find_text_query, ResponseAccumulator};
pub use engine::{
    ChatEngine, READY_MESSAGE, SELECT_MODEL_MESSAGE, SERVER_UNREACHABLE_MESSAGE, WELCOME_MESSAGE,
};
pub use error::{ChatError, Result};
pub use publisher::{SessionPublisher, UNKNOWN_ERROR};
pub use types::{
    Banner, ChatTurn, ConversationSession, EngineConfig, Phase, QuickAction, RequestHistory,
    RoundOutcome, SearchRequest, SessionStatus, Settings, StepOutcome, ANALYZING_PROGRESS, IDLE_PROGRESS,
    SEARCHING_PROGRESS, SYNTHESIZING_PROGRESS,
};
