//! # Push Reconciler
//!
//! Folds remote change notifications into the cache, resolving races against
//! in-flight optimistic writes.
//!
//! ## Merge Rules
//!
//! - **Insert**: ignore if the id is already present; otherwise append and
//!   resolve display fields.
//! - **Update**: field-level merge into the existing record by id. A stage or
//!   contact change invalidates the corresponding display field, which is
//!   re-resolved afterwards. An update for an absent id is treated as an
//!   insert when the delta carries enough to materialize a record.
//! - **Delete**: remove by id if present.
//!
//! The reconciler never triggers a dataset refetch; notifications carry raw
//! fields only, and replacing whole records would discard locally-derived
//! display fields.

use crate::resolve::DisplayResolver;
use ps_01_read_cache::DealCache;
use shared_types::{now_ms, CacheError, DealId, DealPatch, DealRecord};
use std::sync::Arc;
use sync_bus::{Change, Subscription};
use tracing::{debug, warn};

/// Per-dataset consumer of push notifications.
pub struct Reconciler {
    cache: Arc<DealCache>,
    resolver: DisplayResolver,
}

impl Reconciler {
    #[must_use]
    pub fn new(cache: Arc<DealCache>, resolver: DisplayResolver) -> Self {
        Self { cache, resolver }
    }

    /// Consume a subscription until the push channel closes.
    ///
    /// Events for other datasets are filtered by the subscription itself;
    /// apply failures are logged and skipped, never fatal to the loop.
    pub async fn run(self: Arc<Self>, mut subscription: Subscription) {
        while let Some(event) = subscription.recv().await {
            if let Err(err) = self.apply(event.change).await {
                warn!(error = %err, "Failed to reconcile change event");
            }
        }
        debug!(dataset = %self.cache.dataset(), "Push channel closed, reconciler stopping");
    }

    /// Fold one change into the cache.
    pub async fn apply(&self, change: Change) -> Result<(), CacheError> {
        match change {
            Change::Inserted(record) => self.apply_insert(record).await,
            Change::Updated { id, patch } => self.apply_update(id, patch).await,
            Change::Deleted(id) => self.apply_delete(id),
        }
    }

    async fn apply_insert(&self, mut record: DealRecord) -> Result<(), CacheError> {
        if self.cache.contains(&record.id)? {
            // Optimistic confirmation won the race, or a duplicate
            // notification: the present record stays authoritative.
            debug!(id = %record.id, "Push insert ignored, id already present");
            return Ok(());
        }

        self.resolver.resolve(&mut record).await;

        let id = record.id.clone();
        self.cache.write(move |mut records| {
            // Re-check under the lock: a confirmation may have landed while
            // display fields were being resolved.
            if records.iter().all(|r| r.id != record.id) {
                records.push(record);
            }
            records
        })?;
        debug!(id = %id, "Push insert applied");
        Ok(())
    }

    async fn apply_update(&self, id: DealId, patch: DealPatch) -> Result<(), CacheError> {
        if !self.cache.contains(&id)? {
            return self.insert_from_delta(id, patch).await;
        }

        let stage_changed = patch.stage_id.is_some();
        let contact_changed = patch.contact_id.is_some();
        {
            let id = id.clone();
            let now = now_ms();
            self.cache.write(move |mut records| {
                if let Some(record) = records.iter_mut().find(|r| r.id == id) {
                    patch.apply(record, now);
                    // The merged raw fields invalidate these display fields.
                    if stage_changed {
                        record.stage_label = None;
                    }
                    if contact_changed {
                        record.contact_name = None;
                    }
                }
                records
            })?;
        }
        debug!(id = %id, "Push update merged");

        if stage_changed || contact_changed {
            self.refresh_display(&id).await?;
        }
        Ok(())
    }

    fn apply_delete(&self, id: DealId) -> Result<(), CacheError> {
        let removed_id = id.clone();
        self.cache.write(move |mut records| {
            records.retain(|r| r.id != id);
            records
        })?;
        debug!(id = %removed_id, "Push delete applied");
        Ok(())
    }

    /// Insert-if-absent fallback for an update whose target never arrived.
    ///
    /// The delta is enough to materialize a record only when it carries the
    /// stage; otherwise the event is dropped.
    async fn insert_from_delta(&self, id: DealId, patch: DealPatch) -> Result<(), CacheError> {
        let Some(stage_id) = patch.stage_id.clone() else {
            debug!(id = %id, "Push update for absent record dropped, delta too sparse");
            return Ok(());
        };

        let mut record = DealRecord {
            id,
            pipeline_id: self.cache.dataset().clone(),
            stage_id,
            title: patch.title.clone().unwrap_or_default(),
            value: patch.value.unwrap_or(0),
            contact_id: patch.contact_id.clone(),
            is_won: patch.is_won.unwrap_or(false),
            is_lost: patch.is_lost.unwrap_or(false),
            closed_at: patch.closed_at.flatten(),
            stage_label: None,
            contact_name: None,
            source_deal_id: None,
            updated_at: now_ms(),
        };
        self.resolver.resolve(&mut record).await;
        self.apply_insert(record).await
    }

    /// Re-resolve display fields after an await, guarding against the record
    /// having moved again in the meantime.
    async fn refresh_display(&self, id: &DealId) -> Result<(), CacheError> {
        let Some(mut record) = self.cache.get(id)? else {
            return Ok(());
        };
        let stage_at_lookup = record.stage_id.clone();
        self.resolver.resolve(&mut record).await;

        let stage_label = record.stage_label;
        let contact_name = record.contact_name;
        let id = id.clone();
        self.cache.write(move |mut records| {
            if let Some(record) = records.iter_mut().find(|r| r.id == id) {
                // Only apply if the stage has not moved again since lookup.
                if record.stage_id == stage_at_lookup {
                    record.stage_label = record.stage_label.take().or(stage_label);
                    record.contact_name = record.contact_name.take().or(contact_name);
                }
            }
            records
        })
    }
}
