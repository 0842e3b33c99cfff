use thiserror::Error;

#[derive(Error, Debug)]
pub enum FamGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Query not found: {0}")]
    QueryNotFound(String),

    #[error("Query validation failed: {0}")]
    QueryValidation(String),

    #[error("Graph algorithms extension unavailable: {0}")]
    GdsUnavailable(String),

    #[error("Language model unavailable: {0}")]
    LlmUnavailable(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, FamGraphError>;
