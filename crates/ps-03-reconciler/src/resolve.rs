//! Lazy resolution of denormalized display fields.

use shared_types::{ContactStore, DealRecord, PipelineStore};
use std::sync::Arc;
use tracing::debug;

/// Resolves `stage_label` and `contact_name` from the related entities.
///
/// Resolution is best-effort: a failed or empty lookup leaves the field
/// unresolved rather than erroring, since display fields are cosmetic.
#[derive(Clone)]
pub struct DisplayResolver {
    pipelines: Arc<dyn PipelineStore>,
    contacts: Arc<dyn ContactStore>,
}

impl DisplayResolver {
    #[must_use]
    pub fn new(pipelines: Arc<dyn PipelineStore>, contacts: Arc<dyn ContactStore>) -> Self {
        Self { pipelines, contacts }
    }

    /// Fill in any unresolved display fields on `record`.
    pub async fn resolve(&self, record: &mut DealRecord) {
        if record.stage_label.is_none() {
            match self.pipelines.get(&record.pipeline_id).await {
                Ok(Some(pipeline)) => {
                    record.stage_label = pipeline.stage(&record.stage_id).map(|s| s.label.clone());
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(deal = %record.id, error = %err, "Stage label lookup failed");
                }
            }
        }

        if record.contact_name.is_none() {
            if let Some(contact_id) = record.contact_id.clone() {
                match self.contacts.get(&contact_id).await {
                    Ok(Some(contact)) => record.contact_name = Some(contact.name),
                    Ok(None) => {}
                    Err(err) => {
                        debug!(deal = %record.id, error = %err, "Contact name lookup failed");
                    }
                }
            }
        }
    }
}
