//! Common error types for the FEC pipeline

use thiserror::Error;

use crate::api::FecError;

/// Common result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across pipeline stages
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stage input produced by an earlier stage is absent
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Requested FEC entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// FEC API failure after retries
    #[error("FEC API error: {0}")]
    Api(#[from] FecError),
}

impl Error {
    /// Errors that must terminate the process rather than skip one entity
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Config(_) | Error::MissingInput(_) | Error::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_level_errors_are_not_fatal() {
        assert!(!Error::NotFound("C00000001".into()).is_fatal());
        assert!(!Error::Api(FecError::RateLimited).is_fatal());
    }

    #[test]
    fn test_config_and_io_errors_are_fatal() {
        assert!(Error::Config("missing key".into()).is_fatal());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(Error::from(io).is_fatal());
    }
}
