use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Unknown search engine type")]
    UnknownEngineType,

    #[error("Search engine not found: {0}")]
    EngineNotFound(String),

    #[error("Search engine cannot be removed: {0}")]
    EngineNotDeletable(String),
}

pub type Result<T> = std::result::Result<T, SearchError>;
