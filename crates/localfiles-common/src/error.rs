//! Common error types used throughout localfiles.
//!
//! The registry, scheduler and prober all report failures through this one
//! enum so callers can match on the failure class (lookup, transfer, storage)
//! without caring which component produced it.

use std::path::PathBuf;

/// Common error type for localfiles.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested key, file name, target or entry was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A remote fetch could not complete.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Metadata could not be extracted from a file.
    #[error("Probe failed: {0}")]
    Probe(String),

    /// A filesystem operation on an asset failed.
    #[error("Storage error at {}: {source}", path.display())]
    StorageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The named thing already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// No free key could be found within the retry budget.
    #[error("Key space exhausted after {0} attempts")]
    KeySpaceExhausted(usize),

    /// Persisted state could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new Transfer error.
    pub fn transfer<S: Into<String>>(msg: S) -> Self {
        Self::Transfer(msg.into())
    }

    /// Create a new Probe error.
    pub fn probe<S: Into<String>>(msg: S) -> Self {
        Self::Probe(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new AlreadyExists error.
    pub fn already_exists<S: Into<String>>(msg: S) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Wrap an I/O error together with the path it happened on.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageIo {
            path: path.into(),
            source,
        }
    }

    /// True for lookup failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
