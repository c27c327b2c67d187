use scout_llm::Tool;
use serde_json::json;

pub const WEB_SEARCH_TOOL: &str = "web_search";

/// The single tool offered to models that accept structured calls.
pub fn web_search_tool() -> Tool {
    Tool::new(
        WEB_SEARCH_TOOL,
        "Search the web for up-to-date information.",
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" }
            },
            "required": ["query"]
        }),
    )
}
