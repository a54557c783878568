//! Optimistic create/update/delete flows through the full client.

use super::{draft, harness, sales_pipeline};
use shared_types::{DealId, DealPatch, RemoteError, StageId};

#[tokio::test]
async fn test_create_settles_with_exactly_one_record() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();

    let confirmed = h.client.create_item(draft("Acme", 500)).await.unwrap();
    assert!(!confirmed.id.is_temp());

    let records = h.client.records().unwrap().records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, confirmed.id);
    assert!(records.iter().all(|r| !r.id.is_temp()));

    // The remote store holds the same record.
    assert!(h.deals.stored(&confirmed.id).unwrap().is_some());
}

#[tokio::test]
async fn test_failed_create_leaves_no_record_for_the_attempt() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();

    h.deals.fail_next(RemoteError::Rejected {
        reason: "quota exceeded".into(),
    });
    let err = h.client.create_item(draft("Doomed", 1)).await.unwrap_err();
    assert!(matches!(
        err,
        ps_02_mutation::MutationError::Remote(RemoteError::Rejected { .. })
    ));

    let records = h.client.records().unwrap().records().unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_rollback_spares_other_settled_mutations() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();
    let a = h.client.create_item(draft("Deal A", 100)).await.unwrap();
    let b = h.client.create_item(draft("Deal B", 200)).await.unwrap();

    // B's edit settles, then A's edit is rejected.
    h.client
        .update_item(&b.id, DealPatch::default().with_value(999))
        .await
        .unwrap();

    let a_before = h.client.cache().get(&a.id).unwrap().unwrap();
    h.deals.fail_next(RemoteError::Transport("offline".into()));
    h.client
        .update_item(&a.id, DealPatch::default().with_value(1))
        .await
        .unwrap_err();

    // A is back to its snapshot; B keeps its settled edit.
    let a_after = h.client.cache().get(&a.id).unwrap().unwrap();
    assert_eq!(a_after, a_before);
    assert_eq!(h.client.cache().get(&b.id).unwrap().unwrap().value, 999);
}

#[tokio::test]
async fn test_failed_delete_restores_the_record() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();
    let a = h.client.create_item(draft("Keeper", 100)).await.unwrap();

    h.deals.fail_next(RemoteError::Transport("offline".into()));
    h.client.delete_item(&a.id).await.unwrap_err();

    let records = h.client.records().unwrap().records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, a.id);
}

#[tokio::test]
async fn test_update_to_unknown_id_dispatches_nothing() {
    let h = harness(vec![sales_pipeline()]);
    h.client.load().await.unwrap();

    let err = h
        .client
        .update_item(
            &DealId::from("ghost"),
            DealPatch::default().with_stage(StageId::from("won")),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ps_02_mutation::MutationError::MissingRecord(_)
    ));
}
