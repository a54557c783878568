//! Cross-subsystem integration scenarios.

pub mod optimistic_flow;
pub mod push_reconciliation;
pub mod stage_flows;

use client_runtime::adapters::{
    MemoryContactStore, MemoryDealStore, MemoryHistoryStore, MemoryPipelineStore,
};
use client_runtime::PipelineClient;
use shared_types::{
    Contact, ContactId, DealDraft, DealStore, LifecycleStage, PipelineConfig, PipelineId,
    StageConfig, StageId,
};
use std::sync::Arc;

/// Shared fixture: a client over in-memory stores, plus handles on the
/// stores for seeding and assertions.
pub struct Harness {
    pub client: Arc<PipelineClient>,
    pub deals: Arc<MemoryDealStore>,
    pub contacts: Arc<MemoryContactStore>,
    pub pipelines: Arc<MemoryPipelineStore>,
    pub history: Arc<MemoryHistoryStore>,
}

/// Pipeline "p1" with stages [New, Won, Lost], Won configured as the won
/// stage and carrying the Customer marker, Lost as the lost stage.
pub fn sales_pipeline() -> PipelineConfig {
    PipelineConfig {
        id: PipelineId::from("p1"),
        name: "Sales".into(),
        stages: vec![
            StageConfig::new("new", "New"),
            StageConfig::new("won", "Won").with_marker(LifecycleStage::Customer),
            StageConfig::new("lost", "Lost"),
        ],
        won_stage: Some(StageId::from("won")),
        lost_stage: Some(StageId::from("lost")),
        forward_to: None,
    }
}

pub fn harness(configs: Vec<PipelineConfig>) -> Harness {
    let deals = Arc::new(MemoryDealStore::new());
    harness_with_deals(configs, deals.clone(), deals)
}

/// Build a harness whose client talks to `client_deals` while assertions go
/// through `deals` (used to interpose the gated store).
pub fn harness_with_deals(
    configs: Vec<PipelineConfig>,
    client_deals: Arc<dyn DealStore>,
    deals: Arc<MemoryDealStore>,
) -> Harness {
    let contacts = Arc::new(MemoryContactStore::new());
    contacts
        .seed(vec![Contact {
            id: ContactId::from("c1"),
            name: "Ada Lovelace".into(),
            lifecycle_stage: Some(LifecycleStage::Lead),
        }])
        .unwrap();
    let pipelines = Arc::new(MemoryPipelineStore::new());
    pipelines.seed(configs).unwrap();
    let history = Arc::new(MemoryHistoryStore::new());
    let client = Arc::new(PipelineClient::new(
        PipelineId::from("p1"),
        client_deals,
        contacts.clone(),
        pipelines.clone(),
        history.clone(),
    ));
    Harness {
        client,
        deals,
        contacts,
        pipelines,
        history,
    }
}

/// A draft in pipeline "p1", stage "new".
pub fn draft(title: &str, value: i64) -> DealDraft {
    DealDraft {
        pipeline_id: PipelineId::from("p1"),
        stage_id: StageId::from("new"),
        title: title.into(),
        value,
        contact_id: Some(ContactId::from("c1")),
        source_deal_id: None,
    }
}
