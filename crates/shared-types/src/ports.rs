//! # Remote-Store Ports
//!
//! Async traits describing the remote collaborator, one per entity type.
//! Subsystems depend on these traits only; adapters (real transport or
//! in-memory) live with the composition root.

use crate::entities::{
    Contact, ContactId, DealDraft, DealId, DealPatch, DealRecord, HistoryEntry, LifecycleStage,
    PipelineConfig, PipelineId,
};
use crate::errors::RemoteError;
use async_trait::async_trait;

/// Remote deal collection.
#[async_trait]
pub trait DealStore: Send + Sync {
    /// Fetch the full dataset for one pipeline.
    async fn get_all(&self, pipeline: &PipelineId) -> Result<Vec<DealRecord>, RemoteError>;

    /// Create a deal; the returned record carries the confirmed id.
    async fn create(&self, draft: DealDraft) -> Result<DealRecord, RemoteError>;

    /// Apply a partial update to a deal.
    async fn update(&self, id: &DealId, patch: DealPatch) -> Result<(), RemoteError>;

    /// Delete a deal.
    async fn delete(&self, id: &DealId) -> Result<(), RemoteError>;
}

/// Remote contact collection.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn get(&self, id: &ContactId) -> Result<Option<Contact>, RemoteError>;

    /// Propagate a lifecycle marker onto a contact.
    async fn set_lifecycle(
        &self,
        id: &ContactId,
        marker: LifecycleStage,
    ) -> Result<(), RemoteError>;
}

/// Remote pipeline configuration.
#[async_trait]
pub trait PipelineStore: Send + Sync {
    async fn get(&self, id: &PipelineId) -> Result<Option<PipelineConfig>, RemoteError>;
}

/// Remote history log. Entries are append-only and immutable.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, entry: HistoryEntry) -> Result<(), RemoteError>;
}
