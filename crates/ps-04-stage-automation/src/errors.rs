use ps_02_mutation::MutationError;
use shared_types::{CacheError, DealId, PipelineId, RemoteError, StageId};
use thiserror::Error;

/// Errors surfaced by the stage automator.
///
/// Only the primary move can fail here; side-effect failures are logged,
/// never returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AutomationError {
    /// The primary stage update was rejected and rolled back.
    #[error(transparent)]
    Mutation(#[from] MutationError),

    /// A configuration lookup before the primary write failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The cache could not be accessed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The moved deal is not in the cache.
    #[error("No cached record with id {0}")]
    MissingRecord(DealId),

    /// The owning pipeline's configuration could not be found.
    #[error("Pipeline configuration not found: {0}")]
    MissingPipeline(PipelineId),

    /// The destination stage does not belong to the owning pipeline.
    #[error("Stage {stage} is not part of pipeline {pipeline}")]
    UnknownStage { pipeline: PipelineId, stage: StageId },
}
