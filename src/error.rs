//! Error types for the caching engine
//!
//! Provides unified error handling using thiserror.
//!
//! Normal cache conditions (miss, expired, capacity pressure, oversized
//! value) are never errors; they surface as `Option`/`bool` returns. Errors
//! exist only for construction-time problems and the persistence layer,
//! whose failures are logged and absorbed rather than propagated to callers.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Malformed configuration, rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Durable mirror I/O failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// Tag list could not be encoded/decoded for the durable mirror
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the caching engine.
pub type Result<T> = std::result::Result<T, CacheError>;
