use scout_llm::LlmError;
use scout_search::SearchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("No model selected. Please select one in settings.")]
    NoModelSelected,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("No final answer after {0} generation rounds")]
    RoundLimit(usize),
}

impl ChatError {
    pub fn is_tools_unsupported(&self) -> bool {
        matches!(self, Self::Llm(e) if e.is_tools_unsupported())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
