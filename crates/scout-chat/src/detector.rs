//! Search-request detection over a response that is still arriving.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use scout_llm::{StreamFragment, ToolCall};
use serde_json::Value;

use crate::types::{SearchRequest, StepOutcome};

lazy_static! {
    /// `web_search(query="..")`, `[SEARCH: ".."]` and `call web_search query: ".."`.
    static ref SEARCH_PATTERN: Regex = RegexBuilder::new(concat!(
        r#"web_search\s*\(\s*(?:query\s*=\s*)?["'](.+?)["']\s*\)"#,
        r#"|\[SEARCH:\s*["'](.+?)["']\]"#,
        r#"|(?:tool_code|call|use|query|search|lookup)\s+web_search\s+query:?\s*["'](.+?)["']"#,
    ))
    .case_insensitive(true)
    .build()
    .expect("valid search pattern");
}

/// Every phrasing ends on one of these, so a delta without them cannot
/// complete a new match.
const MATCH_TERMINATORS: [char; 4] = ['"', '\'', ')', ']'];

/// First quoted query found by the text fallback
pub fn find_text_query(text: &str) -> Option<String> {
    let caps = SEARCH_PATTERN.captures(text)?;
    caps.iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// `query` argument of the first structured call
pub fn structured_query(tool_calls: &[ToolCall]) -> Option<String> {
    let query = match tool_calls.first()?.function.arguments.get("query")? {
        Value::String(s) => s.clone(),
        Value::Null => return None,
        other => other.to_string(),
    };
    (!query.is_empty()).then_some(query)
}

/// Structured calls win; otherwise text, then reasoning.
pub fn detect(tool_calls: Option<&[ToolCall]>, text: &str, reasoning: &str) -> Option<String> {
    tool_calls
        .and_then(structured_query)
        .or_else(|| find_text_query(text))
        .or_else(|| find_text_query(reasoning))
}

fn may_complete_match(delta: &str) -> bool {
    delta.contains(MATCH_TERMINATORS)
}

/// Rebuilds one response from its fragments and watches it for a search request.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    detect: bool,
    text: String,
    reasoning: String,
    tool_calls: Option<Vec<ToolCall>>,
}

impl ResponseAccumulator {
    /// `detect` is false when web search is off; the response is then
    /// only accumulated.
    pub fn new(detect: bool) -> Self {
        Self {
            detect,
            ..Self::default()
        }
    }

    /// Feed the next fragment, or `None` once the response has ended.
    pub fn step(&mut self, fragment: Option<StreamFragment>) -> StepOutcome {
        let Some(fragment) = fragment else {
            return StepOutcome::Done;
        };

        self.text.push_str(&fragment.content);
        self.reasoning.push_str(&fragment.reasoning);
        let new_calls = fragment.tool_calls.is_some();
        if new_calls {
            self.tool_calls = fragment.tool_calls;
        }

        if !self.detect {
            return StepOutcome::Continue;
        }

        let structured = if new_calls {
            self.tool_calls.as_deref().and_then(structured_query)
        } else {
            None
        };
        let query = structured
            .or_else(|| {
                may_complete_match(&fragment.content)
                    .then(|| find_text_query(&self.text))
                    .flatten()
            })
            .or_else(|| {
                may_complete_match(&fragment.reasoning)
                    .then(|| find_text_query(&self.reasoning))
                    .flatten()
            });

        match query {
            Some(query) => StepOutcome::ToolCallDetected(self.search_request(query)),
            None => StepOutcome::Continue,
        }
    }

    fn search_request(&self, query: String) -> SearchRequest {
        SearchRequest {
            query,
            call_id: self
                .tool_calls
                .as_ref()
                .and_then(|calls| calls.first())
                .and_then(|call| call.id.clone()),
            partial_text: self.text.clone(),
            partial_reasoning: self.reasoning.clone(),
            tool_calls: self.tool_calls.clone(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn tool_calls(&self) -> Option<&[ToolCall]> {
        self.tool_calls.as_deref()
    }

    pub fn into_parts(self) -> (String, String) {
        (self.text, self.reasoning)
    }
}
