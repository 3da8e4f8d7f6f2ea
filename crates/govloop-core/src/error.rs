//! Error types for govloop
//!
//! The semantic pipeline and the cost evaluator are total; only the
//! boundary paths (loading configuration, re-hydrating persisted data,
//! re-parsing canonical text) return `Result<T, Error>`.

use thiserror::Error;

/// govloop error types
#[derive(Debug, Error)]
pub enum Error {
    /// Synonym table configuration could not be loaded
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A persisted AST mapping is malformed
    #[error("AST error: {0}")]
    AstError(String),

    /// Input offered as canonical form is not canonicalizable
    #[error("Canonicalization error: {0}")]
    CanonicalError(String),

    /// A string is not a `sha256:<hex>` or bare hex digest
    #[error("Hash format error: {0}")]
    HashFormat(String),

    /// Filesystem failure while reading configuration or inputs
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for govloop operations
pub type Result<T> = std::result::Result<T, Error>;
