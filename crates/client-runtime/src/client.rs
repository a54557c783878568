//! # Pipeline Client
//!
//! The UI-facing facade for one dataset. Each entry point settles when the
//! remote call does; the cache is already updated optimistically by then, so
//! callers render from [`PipelineClient::records`] immediately and treat the
//! returned future as the pending/settled signal.

use ps_01_read_cache::{CacheRead, DealCache};
use ps_02_mutation::{MutationError, MutationPipeline};
use ps_03_reconciler::{DisplayResolver, Reconciler};
use ps_04_stage_automation::{AutomationError, MoveRequest, StageAutomator, Transition};
use shared_types::{
    CacheError, ContactStore, DealDraft, DealId, DealPatch, DealRecord, DealStore, HistoryStore,
    PipelineId, PipelineStore,
};
use std::sync::Arc;
use sync_bus::{ChangeFilter, InMemoryChangeBus};
use tokio::task::JoinHandle;
use tracing::info;

/// Client facade for one pipeline dataset.
pub struct PipelineClient {
    dataset: PipelineId,
    cache: Arc<DealCache>,
    deals: Arc<dyn DealStore>,
    mutations: Arc<MutationPipeline>,
    automator: StageAutomator,
    reconciler: Arc<Reconciler>,
    resolver: DisplayResolver,
}

impl PipelineClient {
    /// Wire up a client for one dataset against the given remote ports.
    #[must_use]
    pub fn new(
        dataset: PipelineId,
        deals: Arc<dyn DealStore>,
        contacts: Arc<dyn ContactStore>,
        pipelines: Arc<dyn PipelineStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let cache = Arc::new(DealCache::new(dataset.clone()));
        let mutations = Arc::new(MutationPipeline::new(cache.clone(), deals.clone()));
        let resolver = DisplayResolver::new(pipelines.clone(), contacts.clone());
        let reconciler = Arc::new(Reconciler::new(cache.clone(), resolver.clone()));
        let automator = StageAutomator::new(
            mutations.clone(),
            deals.clone(),
            contacts,
            pipelines,
            history,
        );
        Self {
            dataset,
            cache,
            deals,
            mutations,
            automator,
            reconciler,
            resolver,
        }
    }

    /// The dataset this client serves.
    #[must_use]
    pub fn dataset(&self) -> &PipelineId {
        &self.dataset
    }

    /// The underlying cache, shared with every subsystem.
    #[must_use]
    pub fn cache(&self) -> &Arc<DealCache> {
        &self.cache
    }

    /// Fetch the dataset, resolve display fields, and prime the cache.
    pub async fn load(&self) -> Result<usize, MutationError> {
        let mut records = self
            .deals
            .get_all(&self.dataset)
            .await
            .map_err(MutationError::Remote)?;
        for record in &mut records {
            self.resolver.resolve(record).await;
        }
        let count = records.len();
        self.cache.load(records)?;
        info!(dataset = %self.dataset, count, "Dataset loaded");
        Ok(count)
    }

    /// Current denormalized sequence, or `NotLoaded` before [`Self::load`].
    pub fn records(&self) -> Result<CacheRead, CacheError> {
        self.cache.read()
    }

    /// Create an item optimistically; settles with the confirmed record.
    pub async fn create_item(&self, draft: DealDraft) -> Result<DealRecord, MutationError> {
        let confirmed = self.mutations.create_deal(draft).await?;
        self.refresh_display(&confirmed.id).await?;
        Ok(confirmed)
    }

    /// Update an item optimistically.
    pub async fn update_item(&self, id: &DealId, patch: DealPatch) -> Result<(), MutationError> {
        self.mutations.update_deal(id, patch).await
    }

    /// Delete an item optimistically.
    pub async fn delete_item(&self, id: &DealId) -> Result<(), MutationError> {
        self.mutations.delete_deal(id).await
    }

    /// Move an item to another stage, running the full automation cascade.
    pub async fn move_item(&self, request: MoveRequest) -> Result<Transition, AutomationError> {
        self.automator.move_deal(request).await
    }

    /// Attach the reconciler to the push channel.
    ///
    /// The returned handle completes when the channel closes.
    #[must_use]
    pub fn spawn_reconciler(&self, bus: &InMemoryChangeBus) -> JoinHandle<()> {
        let subscription = bus.subscribe(ChangeFilter::dataset(self.dataset.clone()));
        let reconciler = self.reconciler.clone();
        tokio::spawn(reconciler.run(subscription))
    }

    /// Resolve display fields for one cached record after a confirmation.
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
                if record.stage_id == stage_at_lookup {
                    record.stage_label = record.stage_label.take().or(stage_label);
                    record.contact_name = record.contact_name.take().or(contact_name);
                }
            }
            records
        })
    }
}
