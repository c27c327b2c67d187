use std::fmt::Display;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use reqwest::Response;
use serde::Deserialize;

use crate::error::{LlmError, Result};
use crate::line_buffer::LineBuffer;
use crate::types::{Role, ToolCall};

/// Raw-text completion marker. A line that fails to parse but still carries
/// this is treated as the end of the response.
const DONE_MARKER: &str = "\"done\":true";

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<StreamFragment>> + Send>>;

/// One decoded unit of a streaming chat response.
///
/// `content` and `reasoning` are deltas and must be concatenated in arrival
/// order. `tool_calls`, once present, is the complete list for the response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamFragment {
    pub content: String,
    pub reasoning: String,
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl StreamFragment {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn reasoning(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            ..Self::default()
        }
    }

    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(tool_calls),
            ..Self::default()
        }
    }

    /// True when the fragment carries nothing worth emitting.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.reasoning.is_empty() && self.tool_calls.is_none()
    }
}

// ============================================================================
// WIRE TYPES
// ============================================================================

/// One NDJSON line of `/api/chat` output.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub message: Option<MessageDelta>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageDelta {
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "reasoning_content", alias = "thinking")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl MessageDelta {
    pub fn into_fragment(self) -> StreamFragment {
        StreamFragment {
            content: self.content.unwrap_or_default(),
            reasoning: self.reasoning.unwrap_or_default(),
            tool_calls: self.tool_calls,
        }
    }
}

// ============================================================================
// LINE DECODING
// ============================================================================

/// What a single NDJSON line means for the fragment sequence.
#[derive(Debug)]
pub enum LineOutcome {
    /// Blank, unparseable, or content-free line
    Skip,
    Fragment(StreamFragment),
    /// The response is complete; an optional last fragment rode along
    Finished(Option<StreamFragment>),
    /// The server reported an error inside the stream
    Failed(LlmError),
}

pub fn decode_line(line: &str) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Skip;
    }

    let chunk = match serde_json::from_str::<ChatChunk>(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            if line.contains(DONE_MARKER) {
                return LineOutcome::Finished(None);
            }
            tracing::debug!("Skipping malformed stream line: {}", e);
            return LineOutcome::Skip;
        }
    };

    if let Some(message) = chunk.error {
        return LineOutcome::Failed(LlmError::from_server_message(message));
    }

    let fragment = chunk
        .message
        .map(MessageDelta::into_fragment)
        .filter(|f| !f.is_empty());

    match (chunk.done, fragment) {
        (true, fragment) => LineOutcome::Finished(fragment),
        (false, Some(fragment)) => LineOutcome::Fragment(fragment),
        (false, None) => LineOutcome::Skip,
    }
}

/// Decode a newline-delimited JSON byte stream into chat fragments.
///
/// Lines are processed strictly in order. Transport errors end the sequence
/// with an `Err`. Dropping the returned stream drops the source with it.
pub fn decode_ndjson<S, B, E>(source: S) -> FragmentStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(source);
        let mut buffer = LineBuffer::with_capacity(8192);
        let mut finished = false;

        'read: while let Some(chunk_result) = byte_chunks.next().await {
            match chunk_result {
                Ok(bytes) => {
                    buffer.extend(bytes.as_ref());

                    while let Some(line) = buffer.next_line() {
                        match decode_line(&line) {
                            LineOutcome::Skip => continue,
                            LineOutcome::Fragment(fragment) => yield Ok(fragment),
                            LineOutcome::Finished(last) => {
                                if let Some(fragment) = last {
                                    yield Ok(fragment);
                                }
                                finished = true;
                                break 'read;
                            }
                            LineOutcome::Failed(err) => {
                                yield Err(err);
                                finished = true;
                                break 'read;
                            }
                        }
                    }
                }
                Err(e) => {
                    yield Err(LlmError::Stream(e.to_string()));
                    finished = true;
                    break 'read;
                }
            }
        }

        if !finished {
            if let Some(line) = buffer.take_remainder() {
                match decode_line(&line) {
                    LineOutcome::Fragment(fragment) | LineOutcome::Finished(Some(fragment)) => {
                        yield Ok(fragment);
                    }
                    LineOutcome::Failed(err) => yield Err(err),
                    LineOutcome::Skip | LineOutcome::Finished(None) => {}
                }
            }
        }
    })
}

/// Decode the body of a streaming `/api/chat` response.
pub fn parse_ndjson_stream(response: Response) -> FragmentStream {
    decode_ndjson(response.bytes_stream())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_is_skipped() {
        assert!(matches!(decode_line("   "), LineOutcome::Skip));
    }

    #[test]
    fn test_malformed_done_line_finishes() {
        let outcome = decode_line(r#"{"model":"llama3","done":true,"message":{"content":"#);
        assert!(matches!(outcome, LineOutcome::Finished(None)));
    }

    #[test]
    fn test_empty_delta_is_suppressed() {
        let outcome = decode_line(r#"{"message":{"role":"assistant","content":""},"done":false}"#);
        assert!(matches!(outcome, LineOutcome::Skip));
    }

    #[test]
    fn test_thinking_alias_is_read_as_reasoning() {
        match decode_line(r#"{"message":{"role":"assistant","content":"","thinking":"hmm"},"done":false}"#) {
            LineOutcome::Fragment(f) => assert_eq!(f.reasoning, "hmm"),
            other => panic!("Expected fragment, got {:?}", other),
        }
    }
}
