//! In-memory remote stores.
//!
//! Used as the wiring default and by the test suites. `MemoryDealStore` can
//! be primed to fail its next write, which is how rollback paths are
//! exercised without a real transport.

use async_trait::async_trait;
use shared_types::{
    now_ms, Contact, ContactId, ContactStore, DealDraft, DealId, DealPatch, DealRecord, DealStore,
    HistoryEntry, HistoryStore, LifecycleStage, PipelineConfig, PipelineId, PipelineStore,
    RemoteError,
};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use uuid::Uuid;

fn poisoned() -> RemoteError {
    RemoteError::Transport("adapter lock poisoned".into())
}

/// In-memory deal collection.
#[derive(Default)]
pub struct MemoryDealStore {
    deals: RwLock<HashMap<String, DealRecord>>,
    fail_next: Mutex<Option<RemoteError>>,
}

impl MemoryDealStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records.
    pub fn seed(&self, records: Vec<DealRecord>) -> Result<(), RemoteError> {
        let mut deals = self.deals.write().map_err(|_| poisoned())?;
        for record in records {
            deals.insert(record.id.to_string(), record);
        }
        Ok(())
    }

    /// Make the next write operation fail with `err`.
    pub fn fail_next(&self, err: RemoteError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(err);
        }
    }

    fn take_failure(&self) -> Option<RemoteError> {
        self.fail_next.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Snapshot of one stored record, for assertions.
    pub fn stored(&self, id: &DealId) -> Result<Option<DealRecord>, RemoteError> {
        let deals = self.deals.read().map_err(|_| poisoned())?;
        Ok(deals.get(id.as_str()).cloned())
    }
}

#[async_trait]
impl DealStore for MemoryDealStore {
    async fn get_all(&self, pipeline: &PipelineId) -> Result<Vec<DealRecord>, RemoteError> {
        let deals = self.deals.read().map_err(|_| poisoned())?;
        Ok(deals
            .values()
            .filter(|r| &r.pipeline_id == pipeline)
            .cloned()
            .collect())
    }

    async fn create(&self, draft: DealDraft) -> Result<DealRecord, RemoteError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let record = draft.materialize(DealId::new(format!("deal-{}", Uuid::new_v4())), now_ms());
        let mut deals = self.deals.write().map_err(|_| poisoned())?;
        deals.insert(record.id.to_string(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &DealId, patch: DealPatch) -> Result<(), RemoteError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let mut deals = self.deals.write().map_err(|_| poisoned())?;
        let record = deals
            .get_mut(id.as_str())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        patch.apply(record, now_ms());
        Ok(())
    }

    async fn delete(&self, id: &DealId) -> Result<(), RemoteError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let mut deals = self.deals.write().map_err(|_| poisoned())?;
        deals
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))
    }
}

/// In-memory contact collection.
#[derive(Default)]
pub struct MemoryContactStore {
    contacts: RwLock<HashMap<String, Contact>>,
}

impl MemoryContactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, contacts: Vec<Contact>) -> Result<(), RemoteError> {
        let mut map = self.contacts.write().map_err(|_| poisoned())?;
        for contact in contacts {
            map.insert(contact.id.to_string(), contact);
        }
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn get(&self, id: &ContactId) -> Result<Option<Contact>, RemoteError> {
        let contacts = self.contacts.read().map_err(|_| poisoned())?;
        Ok(contacts.get(id.as_str()).cloned())
    }

    async fn set_lifecycle(
        &self,
        id: &ContactId,
        marker: LifecycleStage,
    ) -> Result<(), RemoteError> {
        let mut contacts = self.contacts.write().map_err(|_| poisoned())?;
        let contact = contacts
            .get_mut(id.as_str())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        contact.lifecycle_stage = Some(marker);
        Ok(())
    }
}

/// In-memory pipeline configuration store.
#[derive(Default)]
pub struct MemoryPipelineStore {
    pipelines: RwLock<HashMap<String, PipelineConfig>>,
}

impl MemoryPipelineStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, configs: Vec<PipelineConfig>) -> Result<(), RemoteError> {
        let mut map = self.pipelines.write().map_err(|_| poisoned())?;
        for config in configs {
            map.insert(config.id.to_string(), config);
        }
        Ok(())
    }
}

#[async_trait]
impl PipelineStore for MemoryPipelineStore {
    async fn get(&self, id: &PipelineId) -> Result<Option<PipelineConfig>, RemoteError> {
        let pipelines = self.pipelines.read().map_err(|_| poisoned())?;
        Ok(pipelines.get(id.as_str()).cloned())
    }
}

/// In-memory append-only history log.
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl MemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All appended entries, in order.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>, RemoteError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.clone())
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, entry: HistoryEntry) -> Result<(), RemoteError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.push(entry);
        Ok(())
    }
}
