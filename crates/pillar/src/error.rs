//! Error types for pillar resolution.
//!
//! Resolution distinguishes expected outcomes from failures: a node with no
//! pillar document is not an error (the resolver returns an empty document),
//! and a pipeline producing more than one document is absorbed into a
//! diagnostic. Everything else - unreachable store, failed authentication,
//! a stage the server rejects - surfaces here and propagates to the caller
//! unmodified.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for pillar resolution.
#[derive(Error, Debug)]
pub enum PillarError {
    /// Connection to the document store could not be established.
    #[error("connection failed to {host}: {message}")]
    ConnectionFailed { host: String, message: String },

    /// The `id_pattern` option is not a valid regular expression.
    #[error("invalid id_pattern: {0}")]
    IdPattern(#[from] regex::Error),

    /// Query execution failed in the store.
    ///
    /// This covers malformed aggregation stages: stage contents are opaque
    /// to this crate and are not pre-validated, so a syntactically invalid
    /// stage is only detected by the server at execution time.
    #[error("query execution failed on collection '{collection}': {message}")]
    Query {
        collection: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid resolution configuration.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

/// Result type alias for pillar resolution.
pub type PillarResult<T> = Result<T, PillarError>;

impl PillarError {
    /// Wraps a driver error raised while querying `collection`.
    pub(crate) fn query(collection: &str, err: mongodb::error::Error) -> Self {
        PillarError::Query {
            collection: collection.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
