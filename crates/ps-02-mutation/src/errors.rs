use shared_types::{CacheError, DealId, RemoteError};
use thiserror::Error;

/// Errors surfaced by the mutation pipeline.
///
/// `Remote` wraps the collaborator's error unmodified so the UI layer sees
/// exactly what the store reported.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    /// The remote store rejected the write. The cache was rolled back.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The cache could not be accessed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The target record is not in the cache; nothing was dispatched.
    #[error("No cached record with id {0}")]
    MissingRecord(DealId),
}
