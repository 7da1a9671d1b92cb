use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the backend was doing.
        message: String,
        /// Backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A record the caller expected does not exist.
    #[error("{what} `{id}` not found")]
    Missing {
        /// Kind of record.
        what: &'static str,
        /// Identifier that was looked up.
        id: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct an error for a record the caller expected to exist.
    pub fn missing(what: &'static str, id: impl ToString) -> Self {
        StorageError::Missing {
            what,
            id: id.to_string(),
        }
    }
}
