use scout_llm::ToolCall;

/// A search the model asked for, with what it had produced up to that point
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    /// Id of the structured call, when the server supplied one
    pub call_id: Option<String>,
    pub partial_text: String,
    pub partial_reasoning: String,
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Result of feeding one fragment (or the end of the response) to the accumulator
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Continue,
    ToolCallDetected(SearchRequest),
    Done,
}

/// How one generation round ended
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    Answer {
        id: u64,
        content: String,
        reasoning: String,
    },
    Search(SearchRequest),
    Cancelled,
}
