use thiserror::Error;

#[derive(Error, Debug)]
pub enum NewsAggError {
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("request failed with status code {code}")]
    UnexpectedStatus { code: u16 },

    #[error("Malformed feed: {0}")]
    MalformedFeed(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Source not found: {0}")]
    SourceNotFound(i64),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for NewsAggError {
    fn from(e: reqwest::Error) -> Self {
        NewsAggError::Fetch(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NewsAggError>;
