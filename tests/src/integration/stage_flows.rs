//! Stage moves through the full cascade: primary write, history, lifecycle
//! propagation, and forwarding.

use super::{draft, harness, sales_pipeline, Harness};
use ps_04_stage_automation::{MoveRequest, OutcomeOverride, Transition};
use shared_types::{
    ContactId, ContactStore, DealRecord, DealStore, HistoryKind, LifecycleStage, PipelineConfig,
    PipelineId, StageConfig, StageId,
};

/// Pipeline "p2", the forwarding target, with a single Onboarding stage.
fn onboarding_pipeline() -> PipelineConfig {
    PipelineConfig {
        id: PipelineId::from("p2"),
        name: "Onboarding".into(),
        stages: vec![StageConfig::new("onboard", "Onboarding")],
        won_stage: None,
        lost_stage: None,
        forward_to: None,
    }
}

async fn loaded_with_deal(configs: Vec<PipelineConfig>) -> (Harness, DealRecord) {
    let h = harness(configs);
    h.client.load().await.unwrap();
    let deal = h.client.create_item(draft("Acme", 500)).await.unwrap();
    (h, deal)
}

#[tokio::test]
async fn test_winning_move_closes_flags_and_records_history() {
    let (h, deal) = loaded_with_deal(vec![sales_pipeline()]).await;

    let transition = h
        .client
        .move_item(MoveRequest::new(deal.id.clone(), StageId::from("won")))
        .await
        .unwrap();
    assert!(matches!(transition, Transition::Won { .. }));

    let record = h.client.cache().get(&deal.id).unwrap().unwrap();
    assert!(record.is_won);
    assert!(!record.is_lost);
    assert!(record.closed_at.is_some());
    assert_eq!(record.stage_id, StageId::from("won"));
    assert_eq!(record.stage_label.as_deref(), Some("Won"));

    let moves: Vec<_> = h
        .history
        .entries()
        .unwrap()
        .into_iter()
        .filter(|e| e.kind == HistoryKind::StageMoved)
        .collect();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].deal_id, deal.id);
    assert_eq!(moves[0].message, "Moved to Won");
}

#[tokio::test]
async fn test_winning_move_propagates_lifecycle_to_contact() {
    let (h, deal) = loaded_with_deal(vec![sales_pipeline()]).await;

    h.client
        .move_item(MoveRequest::new(deal.id.clone(), StageId::from("won")))
        .await
        .unwrap();

    let contact = h
        .contacts
        .get(&ContactId::from("c1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(contact.lifecycle_stage, Some(LifecycleStage::Customer));
    assert!(h
        .history
        .entries()
        .unwrap()
        .iter()
        .any(|e| e.kind == HistoryKind::LifecycleChanged));
}

#[tokio::test]
async fn test_reopening_clears_flags_and_close_timestamp() {
    let (h, deal) = loaded_with_deal(vec![sales_pipeline()]).await;

    h.client
        .move_item(MoveRequest::new(deal.id.clone(), StageId::from("won")))
        .await
        .unwrap();
    let transition = h
        .client
        .move_item(MoveRequest::new(deal.id.clone(), StageId::from("new")))
        .await
        .unwrap();
    assert!(matches!(transition, Transition::Reopened));

    let record = h.client.cache().get(&deal.id).unwrap().unwrap();
    assert!(!record.is_won);
    assert!(!record.is_lost);
    assert_eq!(record.closed_at, None);
    assert_eq!(record.stage_label.as_deref(), Some("New"));
}

#[tokio::test]
async fn test_losing_move_keeps_the_reason_in_history() {
    let (h, deal) = loaded_with_deal(vec![sales_pipeline()]).await;

    let transition = h
        .client
        .move_item(
            MoveRequest::new(deal.id.clone(), StageId::from("lost"))
                .with_loss_reason("no budget"),
        )
        .await
        .unwrap();
    assert!(matches!(transition, Transition::Lost { .. }));

    let record = h.client.cache().get(&deal.id).unwrap().unwrap();
    assert!(record.is_lost);
    assert!(!record.is_won);

    let entries = h.history.entries().unwrap();
    let moved = entries
        .iter()
        .find(|e| e.kind == HistoryKind::StageMoved)
        .unwrap();
    assert_eq!(moved.loss_reason.as_deref(), Some("no budget"));
}

#[tokio::test]
async fn test_outcome_override_beats_stage_configuration() {
    let (h, deal) = loaded_with_deal(vec![sales_pipeline()]).await;

    // "new" is an open stage, but the caller marks the move as a win.
    let transition = h
        .client
        .move_item(
            MoveRequest::new(deal.id.clone(), StageId::from("new"))
                .with_outcome(OutcomeOverride::Won),
        )
        .await
        .unwrap();
    assert!(matches!(transition, Transition::Won { .. }));

    let record = h.client.cache().get(&deal.id).unwrap().unwrap();
    assert!(record.is_won);
    assert_eq!(record.stage_id, StageId::from("new"));
}

#[tokio::test]
async fn test_winning_move_forwards_into_the_target_pipeline() {
    let mut sales = sales_pipeline();
    sales.forward_to = Some(PipelineId::from("p2"));
    let (h, deal) = loaded_with_deal(vec![sales, onboarding_pipeline()]).await;

    h.client
        .move_item(MoveRequest::new(deal.id.clone(), StageId::from("won")))
        .await
        .unwrap();

    let forwarded = h.deals.get_all(&PipelineId::from("p2")).await.unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].stage_id, StageId::from("onboard"));
    assert_eq!(forwarded[0].title, deal.title);
    assert_eq!(forwarded[0].source_deal_id, Some(deal.id.clone()));
    assert!(!forwarded[0].is_won);

    // The forwarded copy lives in another dataset and stays out of this cache.
    let records = h.client.records().unwrap().records().unwrap();
    assert_eq!(records.len(), 1);

    assert!(h
        .history
        .entries()
        .unwrap()
        .iter()
        .any(|e| e.kind == HistoryKind::Forwarded && e.deal_id == deal.id));
}

#[tokio::test]
async fn test_outcome_flags_stay_exclusive_across_moves() {
    let (h, deal) = loaded_with_deal(vec![sales_pipeline()]).await;

    h.client
        .move_item(MoveRequest::new(deal.id.clone(), StageId::from("won")))
        .await
        .unwrap();
    h.client
        .move_item(MoveRequest::new(deal.id.clone(), StageId::from("lost")))
        .await
        .unwrap();

    let record = h.client.cache().get(&deal.id).unwrap().unwrap();
    assert!(record.is_lost);
    assert!(!record.is_won);
    assert!(record.closed_at.is_some());
}
