use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhoislyError {
    #[error("WHOIS lookup failed: {0}")]
    WhoisError(String),

    #[error("WHOIS server not found for: {0}")]
    WhoisServerNotFound(String),

    #[error("WHOIS connection failed: {0}")]
    WhoisConnectionFailed(#[from] std::io::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cache store failed: {0}")]
    CacheError(String),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WhoislyError>;
