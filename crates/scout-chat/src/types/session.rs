use scout_llm::{Message, Role};

pub const IDLE_PROGRESS: &str = "Thinking...";
pub const SEARCHING_PROGRESS: &str = "AI is searching the web...";
pub const ANALYZING_PROGRESS: &str = "AI is analyzing search results...";
pub const SYNTHESIZING_PROGRESS: &str = "Writing final response...";

/// Where the active send is in its request/search/resume cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Requesting,
    StreamingAnswer,
    Searching,
    Synthesizing,
    Done,
    Errored,
    Cancelled,
}

impl Phase {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Idle | Self::Done | Self::Errored | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase: Phase,
    pub generating: bool,
    pub searching: bool,
    pub search_query: Option<String>,
    pub progress: &'static str,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::settled(Phase::Idle)
    }
}

impl SessionStatus {
    /// Terminal status: indicators off, idle label
    pub fn settled(phase: Phase) -> Self {
        Self {
            phase,
            generating: false,
            searching: false,
            search_query: None,
            progress: IDLE_PROGRESS,
        }
    }

    pub fn requesting() -> Self {
        Self {
            phase: Phase::Requesting,
            generating: true,
            ..Self::default()
        }
    }

    pub fn searching(query: impl Into<String>) -> Self {
        Self {
            phase: Phase::Searching,
            generating: true,
            searching: true,
            search_query: Some(query.into()),
            progress: SEARCHING_PROGRESS,
        }
    }

    pub fn synthesizing() -> Self {
        Self {
            phase: Phase::Synthesizing,
            generating: true,
            searching: false,
            search_query: None,
            progress: SYNTHESIZING_PROGRESS,
        }
    }
}

/// A displayed turn. Ids are unique within the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub id: u64,
    pub message: Message,
}

impl ChatTurn {
    pub fn new(id: u64, message: Message) -> Self {
        Self { id, message }
    }

    pub fn role(&self) -> Role {
        self.message.role
    }

    pub fn text(&self) -> &str {
        self.message.text()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: u64,
    pub message: String,
}

/// Everything the presentation layer renders, published as one value.
///
/// `turns` is the committed conversation and doubles as the prompt context
/// of the next send. The answer being streamed lives in `draft` until it
/// completes, so abandoning it never touches `turns`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSession {
    pub turns: Vec<ChatTurn>,
    pub draft: Option<ChatTurn>,
    /// Starts true; cleared for good when the server rejects a tools request.
    /// Only an explicit model switch sets it back.
    pub model_supports_tools: bool,
    pub status: SessionStatus,
    pub error: Option<Banner>,
    pub info: Option<Banner>,
    pub attached_images: Vec<String>,
    pub available_models: Vec<String>,
    pub server_healthy: Option<bool>,
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self {
            turns: Vec::new(),
            draft: None,
            model_supports_tools: true,
            status: SessionStatus::default(),
            error: None,
            info: None,
            attached_images: Vec::new(),
            available_models: Vec::new(),
            server_healthy: None,
        }
    }
}

impl ConversationSession {
    pub fn messages(&self) -> Vec<Message> {
        self.turns.iter().map(|t| t.message.clone()).collect()
    }

    /// Committed turns followed by the draft, if one is streaming
    pub fn visible_turns(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter().chain(self.draft.iter())
    }

    pub fn last_turn(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn is_generating(&self) -> bool {
        self.status.generating
    }
}
