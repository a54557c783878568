//! Push notifications racing against in-flight optimistic writes.

use super::{draft, harness, harness_with_deals, sales_pipeline, Harness};
use crate::support::GatedDealStore;
use client_runtime::adapters::MemoryDealStore;
use ps_03_reconciler::{DisplayResolver, Reconciler};
use ps_04_stage_automation::MoveRequest;
use shared_types::{now_ms, DealId, DealPatch, PipelineId, StageId};
use std::sync::Arc;
use std::time::Duration;
use sync_bus::{Change, ChangeEvent, ChangePublisher, InMemoryChangeBus};
use tokio::task::yield_now;

/// A reconciler over the harness client's own cache, for applying push
/// changes directly without going through a bus.
fn reconciler_for(h: &Harness) -> Reconciler {
    Reconciler::new(
        h.client.cache().clone(),
        DisplayResolver::new(h.pipelines.clone(), h.contacts.clone()),
    )
}

#[tokio::test]
async fn test_optimistic_edit_survives_concurrent_push_merge() {
    let inner = Arc::new(MemoryDealStore::new());
    let gated = Arc::new(GatedDealStore::new(inner.clone()));
    let h = harness_with_deals(vec![sales_pipeline()], gated.clone(), inner.clone());

    let id = DealId::from("d1");
    inner
        .seed(vec![draft("Acme", 500).materialize(id.clone(), now_ms())])
        .unwrap();
    h.client.load().await.unwrap();

    // The rename applies locally, then the dispatch parks on the gate.
    let client = h.client.clone();
    let edit_id = id.clone();
    let edit = tokio::spawn(async move {
        client
            .update_item(&edit_id, DealPatch::default().with_title("Acme Corp"))
            .await
    });
    yield_now().await;

    // A push update for a different field lands while the edit is in flight.
    reconciler_for(&h)
        .apply(Change::Updated {
            id: id.clone(),
            patch: DealPatch::default().with_value(750),
        })
        .await
        .unwrap();

    gated.release_one();
    edit.await.unwrap().unwrap();

    let record = h.client.cache().get(&id).unwrap().unwrap();
    assert_eq!(record.title, "Acme Corp");
    assert_eq!(record.value, 750);
}

#[tokio::test]
async fn test_push_insert_arriving_before_confirmation_leaves_one_record() {
    let inner = Arc::new(MemoryDealStore::new());
    let gated = Arc::new(
        GatedDealStore::new(inner.clone()).with_confirmed_id(DealId::from("d-fixed")),
    );
    let h = harness_with_deals(vec![sales_pipeline()], gated.clone(), inner);
    h.client.load().await.unwrap();

    let client = h.client.clone();
    let create = tokio::spawn(async move { client.create_item(draft("Acme", 500)).await });
    yield_now().await;

    // The push feed announces the created record before the create settles.
    let announced = draft("Acme", 500).materialize(DealId::from("d-fixed"), now_ms());
    reconciler_for(&h)
        .apply(Change::Inserted(announced))
        .await
        .unwrap();

    gated.release_one();
    let confirmed = create.await.unwrap().unwrap();
    assert_eq!(confirmed.id, DealId::from("d-fixed"));

    // The confirmation finds its id already present and only drops the
    // placeholder, so the push insert and the confirmation do not stack.
    let records = h.client.records().unwrap().records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, DealId::from("d-fixed"));
    assert!(records.iter().all(|r| !r.id.is_temp()));
}

#[tokio::test]
async fn test_bus_events_flow_into_the_cache() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();

    let bus = InMemoryChangeBus::new();
    let reconciler = h.client.spawn_reconciler(&bus);

    let pushed = draft("Pushed", 300).materialize(DealId::from("d9"), now_ms());
    let delivered = bus
        .publish(ChangeEvent::new(
            PipelineId::from("p1"),
            Change::Inserted(pushed),
        ))
        .await;
    assert_eq!(delivered, 1);

    // An event tagged with another dataset never reaches this cache.
    let other = draft("Elsewhere", 1).materialize(DealId::from("d10"), now_ms());
    bus.publish(ChangeEvent::new(
        PipelineId::from("p2"),
        Change::Inserted(other),
    ))
    .await;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let records = h.client.records().unwrap().records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, DealId::from("d9"));
    assert_eq!(records[0].stage_label.as_deref(), Some("New"));

    drop(bus);
    reconciler.await.unwrap();
}

#[tokio::test]
async fn test_duplicate_push_insert_is_ignored() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();
    let a = h.client.create_item(draft("Acme", 500)).await.unwrap();

    let mut stale = a.clone();
    stale.title = "Stale copy".into();
    reconciler_for(&h)
        .apply(Change::Inserted(stale))
        .await
        .unwrap();

    let records = h.client.records().unwrap().records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Acme");
}

#[tokio::test]
async fn test_push_close_from_another_client_keeps_flags_exclusive() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();
    let deal = h.client.create_item(draft("Acme", 500)).await.unwrap();
    h.client
        .move_item(MoveRequest::new(deal.id.clone(), StageId::from("won")))
        .await
        .unwrap();

    // Another client closed the same deal as lost; the push payload carries
    // only the remotely-changed fields.
    let mut patch = DealPatch::default();
    patch.is_lost = Some(true);
    patch.closed_at = Some(Some(9_000));
    reconciler_for(&h)
        .apply(Change::Updated {
            id: deal.id.clone(),
            patch,
        })
        .await
        .unwrap();

    let record = h.client.cache().get(&deal.id).unwrap().unwrap();
    assert!(record.is_lost);
    assert!(!record.is_won);
    assert_eq!(record.closed_at, Some(9_000));
}

#[tokio::test]
async fn test_push_delete_clears_a_settled_record() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();
    let a = h.client.create_item(draft("Gone", 50)).await.unwrap();

    reconciler_for(&h)
        .apply(Change::Deleted(a.id.clone()))
        .await
        .unwrap();

    let records = h.client.records().unwrap().records().unwrap();
    assert!(records.is_empty());
}
