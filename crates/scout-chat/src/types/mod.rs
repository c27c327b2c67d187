pub mod config;
pub mod history;
pub mod outcome;
pub mod quick_action;
pub mod session;

pub use config::{EngineConfig, Settings, DEFAULT_SERVER_URL};
pub use history::RequestHistory;
pub use outcome::{RoundOutcome, SearchRequest, StepOutcome};
pub use quick_action::QuickAction;
pub use session::{
    Banner, ChatTurn, ConversationSession, Phase, SessionStatus, ANALYZING_PROGRESS,
    IDLE_PROGRESS, SEARCHING_PROGRESS, SYNTHESIZING_PROGRESS,
};
