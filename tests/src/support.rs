//! Test doubles for controlling suspension points.
//!
//! The in-memory stores settle immediately, which makes "while the write is
//! in flight" races impossible to stage. [`GatedDealStore`] parks each write
//! on a semaphore until the test releases it, so events can be interleaved
//! deterministically between the optimistic begin and the confirmation.

use async_trait::async_trait;
use client_runtime::adapters::MemoryDealStore;
use shared_types::{
    now_ms, DealDraft, DealId, DealPatch, DealRecord, DealStore, PipelineId, RemoteError,
};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Wraps a [`MemoryDealStore`], holding every write until a permit arrives.
pub struct GatedDealStore {
    inner: Arc<MemoryDealStore>,
    gate: Arc<Semaphore>,
    /// Fixed id assigned to created deals, so tests can stage id races.
    confirmed_id: Option<DealId>,
}

impl GatedDealStore {
    pub fn new(inner: Arc<MemoryDealStore>) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
            confirmed_id: None,
        }
    }

    pub fn with_confirmed_id(mut self, id: DealId) -> Self {
        self.confirmed_id = Some(id);
        self
    }

    /// Let one parked write proceed.
    pub fn release_one(&self) {
        self.gate.add_permits(1);
    }

    async fn wait(&self) -> Result<(), RemoteError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| RemoteError::Transport("gate closed".into()))?;
        permit.forget();
        Ok(())
    }
}

#[async_trait]
impl DealStore for GatedDealStore {
    async fn get_all(&self, pipeline: &PipelineId) -> Result<Vec<DealRecord>, RemoteError> {
        self.inner.get_all(pipeline).await
    }

    async fn create(&self, draft: DealDraft) -> Result<DealRecord, RemoteError> {
        self.wait().await?;
        match &self.confirmed_id {
            Some(id) => {
                let record = draft.materialize(id.clone(), now_ms());
                self.inner.seed(vec![record.clone()])?;
                Ok(record)
            }
            None => self.inner.create(draft).await,
        }
    }

    async fn update(&self, id: &DealId, patch: DealPatch) -> Result<(), RemoteError> {
        self.wait().await?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &DealId) -> Result<(), RemoteError> {
        self.wait().await?;
        self.inner.delete(id).await
    }
}
