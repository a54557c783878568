//! # Stage Automator
//!
//! Interprets a "move to stage" request: resolves the transition, runs the
//! primary stage-and-flags update through the Mutation Pipeline, then fires
//! the cascading side effects.
//!
//! ## Ordering
//!
//! The primary update is optimistic and settles before any side effect runs.
//! Side effects are best-effort and at-least-once; the forwarding path in
//! particular has no deduplication key, so a deal re-entering a qualifying
//! stage after a manual reopen is forwarded again.

use crate::effects::{run_effects, SideEffect};
use crate::errors::AutomationError;
use crate::transition::{resolve_transition, LifecycleFlags, OutcomeOverride, Transition};
use ps_02_mutation::MutationPipeline;
use shared_types::{
    now_ms, ContactStore, DealDraft, DealId, DealPatch, DealStore, HistoryEntry, HistoryKind,
    HistoryStore, PipelineStore, StageId,
};
use std::sync::Arc;
use tracing::debug;

/// One "move to stage" request from the UI layer.
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub deal_id: DealId,
    pub to_stage: StageId,
    /// Explicit win/lose override; beats any stage configuration.
    pub outcome: Option<OutcomeOverride>,
    /// Reason text recorded with the history entry, typically for losses.
    pub loss_reason: Option<String>,
}

impl MoveRequest {
    #[must_use]
    pub fn new(deal_id: DealId, to_stage: StageId) -> Self {
        Self {
            deal_id,
            to_stage,
            outcome: None,
            loss_reason: None,
        }
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: OutcomeOverride) -> Self {
        self.outcome = Some(outcome);
        self
    }

    #[must_use]
    pub fn with_loss_reason(mut self, reason: impl Into<String>) -> Self {
        self.loss_reason = Some(reason.into());
        self
    }
}

/// The domain state machine plus its side-effect orchestration.
pub struct StageAutomator {
    mutations: Arc<MutationPipeline>,
    deals: Arc<dyn DealStore>,
    contacts: Arc<dyn ContactStore>,
    pipelines: Arc<dyn PipelineStore>,
    history: Arc<dyn HistoryStore>,
}

impl StageAutomator {
    #[must_use]
    pub fn new(
        mutations: Arc<MutationPipeline>,
        deals: Arc<dyn DealStore>,
        contacts: Arc<dyn ContactStore>,
        pipelines: Arc<dyn PipelineStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            mutations,
            deals,
            contacts,
            pipelines,
            history,
        }
    }

    /// Execute a move request.
    ///
    /// Returns the resolved transition once the primary write has settled
    /// and the side effects have run. Only the primary write can fail.
    pub async fn move_deal(&self, request: MoveRequest) -> Result<Transition, AutomationError> {
        let cache = self.mutations.cache();
        let record = cache
            .get(&request.deal_id)?
            .ok_or_else(|| AutomationError::MissingRecord(request.deal_id.clone()))?;

        let dataset = cache.dataset().clone();
        let config = self
            .pipelines
            .get(&dataset)
            .await?
            .ok_or_else(|| AutomationError::MissingPipeline(dataset.clone()))?;
        let destination = config
            .stage(&request.to_stage)
            .ok_or_else(|| AutomationError::UnknownStage {
                pipeline: dataset,
                stage: request.to_stage.clone(),
            })?
            .clone();

        let transition = resolve_transition(
            LifecycleFlags::from(&record),
            &destination,
            &config,
            request.outcome,
            now_ms(),
        );
        debug!(deal = %request.deal_id, stage = %destination.id, ?transition, "Move resolved");

        // Primary: stage + flags, optimistic, through the mutation pipeline.
        let mut patch = DealPatch::default().with_stage(destination.id.clone());
        match transition {
            Transition::Won { closed_at } => {
                patch.is_won = Some(true);
                patch.is_lost = Some(false);
                patch.closed_at = Some(Some(closed_at));
            }
            Transition::Lost { closed_at } => {
                patch.is_won = Some(false);
                patch.is_lost = Some(true);
                patch.closed_at = Some(Some(closed_at));
            }
            Transition::Reopened => {
                patch.is_won = Some(false);
                patch.is_lost = Some(false);
                patch.closed_at = Some(None);
            }
            Transition::Unchanged => {}
        }
        self.mutations.update_deal(&request.deal_id, patch).await?;

        // The patch carries raw fields only; refresh the display label here
        // rather than waiting for a push notification.
        {
            let id = request.deal_id.clone();
            let stage_id = destination.id.clone();
            let label = destination.label.clone();
            cache.write(move |mut records| {
                if let Some(record) = records.iter_mut().find(|r| r.id == id) {
                    if record.stage_id == stage_id {
                        record.stage_label = Some(label);
                    }
                }
                records
            })?;
        }

        // Cascade: ordered, independent, catch-and-log.
        let mut effects = Vec::new();

        let mut entry = HistoryEntry::new(
            request.deal_id.clone(),
            HistoryKind::StageMoved,
            format!("Moved to {}", destination.label),
        );
        if let Some(reason) = &request.loss_reason {
            entry = entry.with_loss_reason(reason.clone());
        }
        let history = self.history.clone();
        effects.push(SideEffect::new("history_stage_moved", async move {
            history.append(entry).await
        }));

        if let (Some(marker), Some(contact_id)) =
            (destination.lifecycle_marker, record.contact_id.clone())
        {
            let contacts = self.contacts.clone();
            let history = self.history.clone();
            let deal_id = request.deal_id.clone();
            effects.push(SideEffect::new("lifecycle_propagation", async move {
                contacts.set_lifecycle(&contact_id, marker).await?;
                history
                    .append(HistoryEntry::new(
                        deal_id,
                        HistoryKind::LifecycleChanged,
                        format!("Contact lifecycle set to {}", marker.as_str()),
                    ))
                    .await
            }));
        }

        let qualifies = transition.is_won()
            || destination
                .lifecycle_marker
                .is_some_and(|m| m.is_success_marker());
        if qualifies {
            if let Some(forward_to) = config.forward_to.clone() {
                let pipelines = self.pipelines.clone();
                let deals = self.deals.clone();
                let history = self.history.clone();
                let deal_id = request.deal_id.clone();
                let source = record.clone();
                effects.push(SideEffect::new("forwarding", async move {
                    let Some(target) = pipelines.get(&forward_to).await? else {
                        debug!(pipeline = %forward_to, "Forwarding skipped, target pipeline missing");
                        return Ok(());
                    };
                    let Some(first) = target.first_stage() else {
                        debug!(pipeline = %forward_to, "Forwarding skipped, target pipeline has no stages");
                        return Ok(());
                    };
                    let draft = DealDraft {
                        pipeline_id: target.id.clone(),
                        stage_id: first.id.clone(),
                        title: source.title.clone(),
                        value: source.value,
                        contact_id: source.contact_id.clone(),
                        source_deal_id: Some(deal_id.clone()),
                    };
                    let created = deals.create(draft).await?;
                    history
                        .append(HistoryEntry::new(
                            deal_id,
                            HistoryKind::Forwarded,
                            format!("Handed off to pipeline {} as {}", target.name, created.id),
                        ))
                        .await
                }));
            }
        }

        run_effects(effects).await;
        Ok(transition)
    }
}
