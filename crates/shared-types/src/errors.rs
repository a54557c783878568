//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors surfaced by the remote collaborator.
///
/// A rejected write rolls the cache back to the begin snapshot and passes
/// the error through unmodified to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The record does not exist remotely.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The remote store rejected the payload.
    #[error("Rejected by remote store: {reason}")]
    Rejected { reason: String },

    /// Transport-level failure reaching the remote store.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote response could not be decoded.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors from the read-model cache.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    /// A writer panicked while holding the cache lock.
    #[error("Cache lock poisoned")]
    LockPoisoned,

    /// A write was attempted before the initial dataset load.
    #[error("Dataset {0} not loaded")]
    NotLoaded(String),
}
