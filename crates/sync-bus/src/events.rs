//! # Change Events
//!
//! Defines the notification payloads that flow through the sync bus.

use serde::{Deserialize, Serialize};
use shared_types::{DealId, DealPatch, DealRecord, PipelineId};

/// One remote change, as pushed by the store.
///
/// `Updated` carries a partial payload only: the fields the remote actually
/// changed. Display fields resolved locally never appear here, which is why
/// the reconciler must merge field-by-field instead of replacing records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Change {
    /// A record was created remotely (possibly by this client's own write).
    Inserted(DealRecord),

    /// Fields of an existing record changed remotely.
    Updated { id: DealId, patch: DealPatch },

    /// A record was deleted remotely.
    Deleted(DealId),
}

impl Change {
    /// The id of the record this change concerns.
    #[must_use]
    pub fn deal_id(&self) -> &DealId {
        match self {
            Self::Inserted(record) => &record.id,
            Self::Updated { id, .. } => id,
            Self::Deleted(id) => id,
        }
    }
}

/// A change notification scoped to one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The dataset (pipeline) this change belongs to.
    pub dataset: PipelineId,
    /// The change itself.
    pub change: Change,
}

impl ChangeEvent {
    #[must_use]
    pub fn new(dataset: PipelineId, change: Change) -> Self {
        Self { dataset, change }
    }
}

/// Filter for subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    /// Datasets to include. Empty means all datasets.
    pub datasets: Vec<PipelineId>,
}

impl ChangeFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for a single dataset.
    #[must_use]
    pub fn dataset(dataset: PipelineId) -> Self {
        Self {
            datasets: vec![dataset],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.datasets.is_empty() || self.datasets.contains(&event.dataset)
    }
}
