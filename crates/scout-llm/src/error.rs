use thiserror::Error;

/// Marker the server puts in its error body when a model cannot take a `tools` list.
const TOOLS_UNSUPPORTED_MARKER: &str = "not support tools";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ollama API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Model does not support tools: {0}")]
    ToolsUnsupported(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Classify a non-success HTTP response body.
    pub fn from_error_body(status: u16, body: String) -> Self {
        if body.contains(TOOLS_UNSUPPORTED_MARKER) {
            Self::ToolsUnsupported(body)
        } else {
            Self::Api { status, body }
        }
    }

    /// Classify an `error` field reported inside an otherwise successful payload.
    pub fn from_server_message(message: String) -> Self {
        if message.contains(TOOLS_UNSUPPORTED_MARKER) {
            Self::ToolsUnsupported(message)
        } else {
            Self::Server(message)
        }
    }

    pub fn is_tools_unsupported(&self) -> bool {
        matches!(self, Self::ToolsUnsupported(_))
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_rejection_is_recognized() {
        let err = LlmError::from_error_body(
            400,
            r#"{"error":"registry.ollama.ai/library/gemma:2b does not support tools"}"#.to_string(),
        );
        assert!(err.is_tools_unsupported());
    }

    #[test]
    fn test_other_bodies_stay_api_errors() {
        let err = LlmError::from_error_body(404, "model not found".to_string());
        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "model not found");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }
}
