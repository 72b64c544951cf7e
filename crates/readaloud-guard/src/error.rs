//! Error types for the URL guard

use crate::types::Rejection;
use thiserror::Error;

/// Result type alias for guard operations
pub type Result<T> = std::result::Result<T, GuardError>;

/// Guard error types
#[derive(Debug, Error)]
pub enum GuardError {
    /// The URL was judged unsafe to fetch
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GuardError {
    /// The rejection reason, if this is a rejection
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            GuardError::Rejected(rejection) => Some(rejection),
            GuardError::Config(_) => None,
        }
    }
}
