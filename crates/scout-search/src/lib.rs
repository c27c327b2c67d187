pub mod duckduckgo;
pub mod engines;
pub mod error;
pub mod provider;
pub mod tool;

pub use engines::{
    SearchEngineConfig, SearchEngineRegistry, SearchEngineType, DEFAULT_AUTH_HEADER,
    DEFAULT_ENGINE_ID, DEFAULT_ENGINE_NAME,
};
pub use error::{Result, SearchError};
pub use provider::{SearchClientConfig, SearchProvider, WebSearchClient, UNKNOWN_ENGINE_RESULT};
pub use tool::{web_search_tool, WEB_SEARCH_TOOL};
