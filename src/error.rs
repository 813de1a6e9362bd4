use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Search cancelled")]
    Cancelled,

    /// Should not happen with a validated alphabet; carries enough context to diagnose.
    #[error("Internal failure at attempt {attempts} on candidate {candidate}: {reason}")]
    Internal {
        candidate: String,
        attempts: u64,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, SearchError>;

impl SearchError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SearchError::InvalidInput(message.into())
    }
}
