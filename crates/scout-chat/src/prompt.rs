//! Request assembly: the per-request system turn, image trimming and the
//! turns that carry search results back to the model.

use chrono::{Local, NaiveDate};
use scout_llm::{Message, ToolCall};
use scout_search::WEB_SEARCH_TOOL;
use serde_json::{Map, Value};

use crate::types::SearchRequest;

pub const BASE_SYSTEM_PROMPT: &str = "You are a helpful, professional AI assistant with real-time web access.

OPERATING RULES:
1. TOOL FIRST: for facts, dates, news or events that may postdate your training data, request a 'web_search' immediately.
2. NO PREAMBLE: when searching, output only the search request. Do not announce that you are going to search.
3. RESULTS WIN: when search results are present, prefer them over your internal knowledge.
4. NO GUESSING: if results are empty or inconclusive, say \"I cannot find current information for that.\"
5. Use TODAY'S DATE above to decide whether a search is necessary.";

pub const WEB_SEARCH_INSTRUCTION: &str =
    "You MUST use the 'web_search' tool for current events or facts. ";
pub const TOOL_MODE_PROMPT: &str =
    "Format tool calls EXACTLY as: web_search(query=\"your search query\")";
pub const NO_TOOL_MODE_PROMPT: &str =
    "IMPORTANT: To search the web, output exactly: [SEARCH: \"your query\"].";

pub const SEARCH_RESULTS_PREFIX: &str = "SEARCH_RESULTS:\n";
pub const ANSWER_FROM_RESULTS: &str = "\n\nPlease answer based on these results.";

/// Trailing history turns, counted by position, that keep their images.
pub const IMAGE_WINDOW: usize = 2;

pub fn build_system_prompt(date: NaiveDate, web_search: bool, supports_tools: bool) -> String {
    let mut prompt = format!("TODAY'S DATE: {}\n\n{}", date.format("%Y-%m-%d"), BASE_SYSTEM_PROMPT);
    if web_search {
        prompt.push_str("\n\n");
        prompt.push_str(WEB_SEARCH_INSTRUCTION);
        prompt.push_str(if supports_tools {
            TOOL_MODE_PROMPT
        } else {
            NO_TOOL_MODE_PROMPT
        });
    }
    prompt
}

/// Fresh system turn stamped with the local date
pub fn system_turn(web_search: bool, supports_tools: bool) -> Message {
    Message::system(build_system_prompt(
        Local::now().date_naive(),
        web_search,
        supports_tools,
    ))
}

/// History as it is sent: images survive only on the last `IMAGE_WINDOW` turns.
pub fn history_for_request(turns: &[Message]) -> Vec<Message> {
    let cutoff = turns.len().saturating_sub(IMAGE_WINDOW);
    turns
        .iter()
        .enumerate()
        .map(|(index, turn)| {
            let mut turn = turn.clone();
            if index < cutoff {
                turn.images.clear();
            }
            turn
        })
        .collect()
}

/// The assistant turn that asked for `request` and the turn answering it.
///
/// With tool support the answer is a `tool` turn linked by call id; a
/// call id is minted when the server did not send one. Without tool support
/// the partial text is kept and the results come back as a user turn.
pub fn search_exchange(
    request: &SearchRequest,
    result: &str,
    supports_tools: bool,
) -> (Message, Message) {
    if supports_tools {
        let call_id = request
            .call_id
            .clone()
            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
        let tool_calls = linked_tool_calls(request, &call_id);
        let assistant =
            Message::assistant_with_tools(tool_calls).with_reasoning(request.partial_reasoning.as_str());
        let answer = Message::tool_result(call_id, format!("{}{}", SEARCH_RESULTS_PREFIX, result));
        (assistant, answer)
    } else {
        let mut assistant = Message::assistant(request.partial_text.as_str())
            .with_reasoning(request.partial_reasoning.as_str());
        if let Some(calls) = request.tool_calls.clone().filter(|c| !c.is_empty()) {
            assistant = assistant.with_tool_calls(calls);
        }
        let answer = Message::user(format!(
            "{}{}{}",
            SEARCH_RESULTS_PREFIX, result, ANSWER_FROM_RESULTS
        ));
        (assistant, answer)
    }
}

fn linked_tool_calls(request: &SearchRequest, call_id: &str) -> Vec<ToolCall> {
    match request.tool_calls.clone().filter(|c| !c.is_empty()) {
        Some(mut calls) => {
            if calls[0].id.is_none() {
                calls[0].id = Some(call_id.to_string());
            }
            calls
        }
        None => {
            let mut arguments = Map::new();
            arguments.insert("query".to_string(), Value::String(request.query.clone()));
            vec![ToolCall::new(
                Some(call_id.to_string()),
                WEB_SEARCH_TOOL,
                arguments,
            )]
        }
    }
}
