//! # Mutation Pipeline
//!
//! Wraps one edit in begin → dispatch → confirm/rollback phases.
//!
//! ## Phases
//!
//! 1. **Begin**: snapshot the rollback state and apply the edit to the cache
//!    synchronously. Creates synthesize a temp record under a placeholder id.
//! 2. **Dispatch**: issue the remote call and await its settlement.
//! 3. **Confirm**: creates swap the temp record for the confirmed one unless
//!    a push insert already delivered it; updates and deletes need no further
//!    cache work.
//! 4. **Rollback**: a rejected write restores exactly the begin snapshot for
//!    this mutation's target record.
//!
//! The visible state changes within one render cycle of the user action,
//! independent of remote latency.

use crate::errors::MutationError;
use ps_01_read_cache::DealCache;
use shared_types::{now_ms, DealDraft, DealId, DealPatch, DealRecord, DealStore};
use std::sync::Arc;
use tracing::debug;

/// Orchestrates optimistic mutations against one dataset's cache.
pub struct MutationPipeline {
    cache: Arc<DealCache>,
    deals: Arc<dyn DealStore>,
}

impl MutationPipeline {
    #[must_use]
    pub fn new(cache: Arc<DealCache>, deals: Arc<dyn DealStore>) -> Self {
        Self { cache, deals }
    }

    /// The cache this pipeline mutates.
    #[must_use]
    pub fn cache(&self) -> &Arc<DealCache> {
        &self.cache
    }

    /// Create a deal optimistically.
    ///
    /// A temp record is visible immediately; the returned record carries the
    /// confirmed id. Once confirmation completes the cache never contains
    /// both the temp and the confirmed record.
    pub async fn create_deal(&self, draft: DealDraft) -> Result<DealRecord, MutationError> {
        // Begin: synthesize the placeholder and make it visible.
        let temp_id = DealId::temp();
        let temp = draft.materialize(temp_id.clone(), now_ms());
        {
            let temp = temp.clone();
            self.cache.write(move |mut records| {
                records.push(temp);
                records
            })?;
        }
        debug!(temp_id = %temp_id, "Optimistic create applied");

        // Dispatch.
        match self.deals.create(draft).await {
            Ok(confirmed) => {
                let confirmed_id = confirmed.id.clone();
                let result = confirmed.clone();
                let temp_id_for_write = temp_id.clone();
                self.cache.write(move |mut records| {
                    if records.iter().any(|r| r.id == confirmed_id) {
                        // A push insert won the race; the confirmed record is
                        // already present. Drop the placeholder only.
                        records.retain(|r| r.id != temp_id_for_write);
                    } else if let Some(slot) =
                        records.iter_mut().find(|r| r.id == temp_id_for_write)
                    {
                        // Keep display fields the client resolved onto the
                        // placeholder; the raw confirmation lacks them.
                        let stage_label = slot.stage_label.take();
                        let contact_name = slot.contact_name.take();
                        *slot = confirmed;
                        slot.stage_label = slot.stage_label.take().or(stage_label);
                        slot.contact_name = slot.contact_name.take().or(contact_name);
                    } else {
                        // Placeholder vanished (e.g. a push delete); the
                        // confirmed record is still authoritative.
                        records.push(confirmed);
                    }
                    records
                })?;
                debug!(temp_id = %temp_id, confirmed_id = %result.id, "Create confirmed");
                Ok(result)
            }
            Err(err) => {
                self.cache.write(move |mut records| {
                    records.retain(|r| r.id != temp_id);
                    records
                })?;
                Err(err.into())
            }
        }
    }

    /// Update a deal optimistically.
    ///
    /// On success the optimistic values stand; the reconciler supersedes them
    /// if a notification later arrives. On failure the begin snapshot is
    /// restored.
    pub async fn update_deal(&self, id: &DealId, patch: DealPatch) -> Result<(), MutationError> {
        // Begin: snapshot, then apply the diff.
        let snapshot = self
            .cache
            .get(id)?
            .ok_or_else(|| MutationError::MissingRecord(id.clone()))?;
        {
            let id = id.clone();
            let patch = patch.clone();
            let now = now_ms();
            self.cache.write(move |mut records| {
                if let Some(record) = records.iter_mut().find(|r| r.id == id) {
                    patch.apply(record, now);
                }
                records
            })?;
        }
        debug!(id = %id, "Optimistic update applied");

        // Dispatch.
        match self.deals.update(id, patch).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.restore(snapshot)?;
                Err(err.into())
            }
        }
    }

    /// Delete a deal optimistically.
    ///
    /// On failure the record is restored at its original position.
    pub async fn delete_deal(&self, id: &DealId) -> Result<(), MutationError> {
        // Begin: snapshot record and position, then remove.
        let records = self
            .cache
            .read()?
            .records()
            .ok_or_else(|| MutationError::MissingRecord(id.clone()))?;
        let (index, snapshot) = records
            .iter()
            .enumerate()
            .find(|(_, r)| &r.id == id)
            .map(|(i, r)| (i, r.clone()))
            .ok_or_else(|| MutationError::MissingRecord(id.clone()))?;
        {
            let id = id.clone();
            self.cache.write(move |mut records| {
                records.retain(|r| r.id != id);
                records
            })?;
        }
        debug!(id = %id, "Optimistic delete applied");

        // Dispatch.
        match self.deals.delete(id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.cache.write(move |mut records| {
                    let at = index.min(records.len());
                    records.insert(at, snapshot);
                    records
                })?;
                Err(err.into())
            }
        }
    }

    /// Restore a single record to its begin snapshot.
    ///
    /// Replaces the record in place when present, otherwise re-appends it.
    /// Records other than the snapshot's are never touched.
    fn restore(&self, snapshot: DealRecord) -> Result<(), MutationError> {
        self.cache.write(move |mut records| {
            if let Some(record) = records.iter_mut().find(|r| r.id == snapshot.id) {
                *record = snapshot;
            } else {
                records.push(snapshot);
            }
            records
        })?;
        Ok(())
    }
}
