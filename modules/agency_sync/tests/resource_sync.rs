//! Fetch and mutation behaviour of a single resource against the in-memory store.

mod common;

use std::sync::Arc;

use agency_sync::contract::model::{
    ClientPatch, ClientStatus, NewTransaction, TransactionPatch, TransactionStatus,
    TransactionType,
};
use agency_sync::domain::error::DomainError;
use agency_sync::domain::resource::{
    ClientsResource, FetchOutcome, ResourceOptions, ResourceStatus, TransactionsResource,
};
use agency_sync::infra::store::{InMemoryRecordStore, StoreOp};
use chrono::NaiveDate;
use common::{new_client, seeded_store, GatedStore};
use rust_decimal::Decimal;
use uuid::Uuid;

#[tokio::test]
async fn new_resource_is_idle_until_fetched() {
    let store = seeded_store();
    let clients = ClientsResource::new(store.clone());
    assert_eq!(clients.status(), ResourceStatus::Idle);
    assert!(clients.is_empty());
    assert_eq!(store.calls(StoreOp::Query), 0);

    let mounted = ClientsResource::mount(store.clone(), ResourceOptions::default()).await;
    assert_eq!(mounted.status(), ResourceStatus::Ready);
    assert_eq!(mounted.len(), 3);
    assert_eq!(store.calls(StoreOp::Query), 1);
}

#[tokio::test]
async fn fetch_is_idempotent_and_ordered() {
    let store = seeded_store();
    let clients = ClientsResource::new(store);

    let first = clients.fetch().await.unwrap();
    let items_first = clients.items();
    let second = clients.refetch().await.unwrap();

    assert_eq!(first, FetchOutcome::Applied { count: 3 });
    assert_eq!(second, FetchOutcome::Applied { count: 3 });
    assert_eq!(items_first, clients.items());

    let names: Vec<_> = clients.items().into_iter().map(|c| c.name).collect();
    assert_eq!(names, ["Loja Bella", "StartupX", "Tech Solutions"]);
    assert!(!clients.is_loading());
    assert!(clients.error().is_none());
}

#[tokio::test]
async fn transactions_come_newest_first_within_the_window() {
    let store = seeded_store();
    let txs = TransactionsResource::with_options(
        store,
        ResourceOptions {
            limit: Some(2),
            ..ResourceOptions::default()
        },
    );
    txs.fetch().await.unwrap();
    let descriptions: Vec<_> = txs.items().into_iter().map(|t| t.description).collect();
    assert_eq!(descriptions, ["Hosting", "Landing page"]);
}

#[tokio::test]
async fn failed_fetch_keeps_items_and_reports_error() {
    let store = seeded_store();
    let clients = ClientsResource::new(store.clone());
    clients.fetch().await.unwrap();

    store.fail_next(StoreOp::Query, "JWT expired");
    let err = clients.fetch().await.unwrap_err();

    assert_eq!(err, DomainError::store("JWT expired"));
    assert_eq!(clients.status(), ResourceStatus::Error);
    assert_eq!(clients.error().as_deref(), Some("JWT expired"));
    assert_eq!(clients.len(), 3);
    assert!(!clients.is_loading());

    clients.fetch().await.unwrap();
    assert_eq!(clients.status(), ResourceStatus::Ready);
    assert!(clients.error().is_none());
}

#[tokio::test]
async fn create_appends_exactly_once_with_stored_fields() {
    let store = seeded_store();
    let clients = ClientsResource::new(store.clone());
    clients.fetch().await.unwrap();

    let created = clients
        .create(new_client("Padaria Sol", "padaria-sol"))
        .await
        .unwrap();

    assert_eq!(clients.len(), 4);
    let matching: Vec<_> = clients
        .items()
        .into_iter()
        .filter(|c| c.id == created.id)
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].slug, "padaria-sol");
    assert_eq!(store.rows("clients").len(), 4);
    assert!(!clients.has_pending_mutations());
}

#[tokio::test]
async fn delete_removes_exactly_one() {
    let store = seeded_store();
    let clients = ClientsResource::new(store.clone());
    clients.fetch().await.unwrap();
    let victim = clients.items()[1].clone();

    clients.delete(victim.id).await.unwrap();

    assert_eq!(clients.len(), 2);
    assert!(clients.get(victim.id).is_none());
    assert_eq!(store.rows("clients").len(), 2);

    // Unknown ids are accepted by the store and change nothing locally.
    clients.delete(Uuid::new_v4()).await.unwrap();
    assert_eq!(clients.len(), 2);
}

#[tokio::test]
async fn failed_mutations_leave_items_unchanged() {
    let store = seeded_store();
    let clients = ClientsResource::new(store.clone());
    clients.fetch().await.unwrap();
    let before = clients.items();

    store.fail_next(StoreOp::Insert, "duplicate key value violates unique constraint");
    let err = clients
        .create(new_client("Padaria Sol", "padaria-sol"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Store { .. }));
    assert_eq!(clients.items(), before);
    assert_eq!(
        clients.error().as_deref(),
        Some("duplicate key value violates unique constraint")
    );

    store.fail_next(StoreOp::Delete, "permission denied");
    assert!(clients.delete(before[0].id).await.is_err());
    assert_eq!(clients.items(), before);
    assert_eq!(clients.error().as_deref(), Some("permission denied"));

    clients.clear_error();
    assert!(clients.error().is_none());
}

#[tokio::test]
async fn validation_failures_never_reach_the_store() {
    let store = seeded_store();
    let clients = ClientsResource::new(store.clone());
    clients.fetch().await.unwrap();

    let err = clients
        .create(new_client("Copycat", "startupx"))
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::slug_already_exists("startupx"));

    let err = clients
        .create(new_client("Bad Slug", "Bad Slug"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    assert_eq!(store.calls(StoreOp::Insert), 0);
    assert_eq!(clients.len(), 3);
    assert!(clients.error().is_some());
}

#[tokio::test]
async fn update_replaces_the_local_copy() {
    let store = seeded_store();
    let clients = ClientsResource::new(store.clone());
    clients.fetch().await.unwrap();
    let target = clients.items()[0].clone();

    let patch = ClientPatch {
        status: Some(ClientStatus::Blocked),
        monthly_value: Some(Decimal::from(799)),
        ..ClientPatch::default()
    };
    let updated = clients.update(target.id, patch).await.unwrap();

    assert_eq!(updated.status, ClientStatus::Blocked);
    let local = clients.get(target.id).unwrap();
    assert_eq!(local.monthly_value, Decimal::from(799));
    assert_eq!(local.name, target.name);
    assert_eq!(clients.len(), 3);
}

#[tokio::test]
async fn mark_paid_settles_once() {
    let store = seeded_store();
    let txs = TransactionsResource::new(store.clone());
    txs.fetch().await.unwrap();
    let pending = txs
        .items()
        .into_iter()
        .find(|t| t.status == TransactionStatus::Pending)
        .unwrap();

    let paid = txs.mark_paid(pending.id).await.unwrap();
    assert_eq!(paid.status, TransactionStatus::Paid);
    assert!(paid.paid_at.is_some());
    assert_eq!(txs.get(pending.id).unwrap().status, TransactionStatus::Paid);
    assert_eq!(store.calls(StoreOp::Update), 1);

    let again = txs.mark_paid(pending.id).await.unwrap();
    assert_eq!(again.paid_at, paid.paid_at);
    assert_eq!(store.calls(StoreOp::Update), 1);

    let err = txs.mark_paid(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn reopening_a_paid_transaction_clears_its_payment_date() {
    let store = seeded_store();
    let txs = TransactionsResource::new(store.clone());
    txs.fetch().await.unwrap();
    let pending = txs
        .items()
        .into_iter()
        .find(|t| t.status == TransactionStatus::Pending)
        .unwrap();
    txs.mark_paid(pending.id).await.unwrap();

    let err = txs
        .update(
            pending.id,
            TransactionPatch {
                status: Some(TransactionStatus::Pending),
                ..TransactionPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "paid_at"));
    assert_eq!(store.calls(StoreOp::Update), 1);
    assert!(txs.get(pending.id).unwrap().paid_at.is_some());

    let reopened = txs
        .update(pending.id, TransactionPatch::reopen(TransactionStatus::Pending))
        .await
        .unwrap();
    assert_eq!(reopened.status, TransactionStatus::Pending);
    assert_eq!(reopened.paid_at, None);
    assert_eq!(txs.get(pending.id).unwrap().paid_at, None);
}

#[tokio::test]
async fn created_transaction_is_decoded_from_the_store_echo() {
    let store = Arc::new(InMemoryRecordStore::new());
    let txs = TransactionsResource::new(store);
    txs.fetch().await.unwrap();

    let created = txs
        .create(NewTransaction {
            client_id: None,
            client_name: Some("StartupX".into()),
            kind: TransactionType::Expense,
            status: TransactionStatus::Pending,
            amount: Decimal::from(80),
            description: "Domain renewal".into(),
            due_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            paid_at: None,
        })
        .await
        .unwrap();

    assert_eq!(created.kind, TransactionType::Expense);
    assert_eq!(txs.items(), vec![created]);
}

#[tokio::test]
async fn fetch_overtaken_by_a_mutation_reads_again() {
    let gated = Arc::new(GatedStore::new(seeded_store()));
    let clients = ClientsResource::new(gated.clone());
    clients.fetch().await.unwrap();

    let release = gated.hold_next_query();
    let background = clients.clone();
    let in_flight = tokio::spawn(async move { background.fetch().await });
    gated.wait_for_held_query().await;
    assert!(clients.is_loading());
    assert_eq!(clients.status(), ResourceStatus::Loading);

    let created = clients
        .create(new_client("Padaria Sol", "padaria-sol"))
        .await
        .unwrap();
    release.send(()).unwrap();

    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { count: 4 });
    assert!(clients.get(created.id).is_some());
    assert_eq!(clients.len(), 4);
    assert!(!clients.is_loading());
    assert_eq!(clients.status(), ResourceStatus::Ready);
    assert_eq!(gated.inner().calls(StoreOp::Query), 3);
}

#[tokio::test]
async fn create_during_first_fetch_still_loads_the_collection() {
    let gated = Arc::new(GatedStore::new(seeded_store()));
    let clients = ClientsResource::new(gated.clone());
    assert_eq!(clients.status(), ResourceStatus::Idle);

    let release = gated.hold_next_query();
    let background = clients.clone();
    let in_flight = tokio::spawn(async move { background.fetch().await });
    gated.wait_for_held_query().await;

    let created = clients
        .create(new_client("Padaria Sol", "padaria-sol"))
        .await
        .unwrap();
    assert_eq!(clients.len(), 1);
    release.send(()).unwrap();

    let outcome = in_flight.await.unwrap().unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { count: 4 });
    assert_eq!(clients.status(), ResourceStatus::Ready);
    assert_eq!(clients.error(), None);
    assert_eq!(clients.len(), gated.inner().rows("clients").len());
    assert!(clients.get(created.id).is_some());
}

#[tokio::test]
async fn superseded_fetch_failure_does_not_override_fresh_data() {
    let gated = Arc::new(GatedStore::new(seeded_store()));
    let clients = ClientsResource::new(gated.clone());

    gated.inner().fail_next(StoreOp::Query, "timeout from old request");
    let release = gated.hold_next_query();
    let background = clients.clone();
    let older = tokio::spawn(async move { background.fetch().await });
    gated.wait_for_held_query().await;

    let newer = clients.fetch().await.unwrap();
    assert_eq!(newer, FetchOutcome::Applied { count: 3 });
    release.send(()).unwrap();

    let err = older.await.unwrap().unwrap_err();
    assert!(err.to_string().contains("timeout from old request"));
    assert_eq!(clients.status(), ResourceStatus::Ready);
    assert_eq!(clients.error(), None);
    assert_eq!(clients.len(), 3);
}

#[tokio::test]
async fn responses_after_close_are_not_applied() {
    let gated = Arc::new(GatedStore::new(seeded_store()));
    let clients = ClientsResource::new(gated.clone());

    let release = gated.hold_next_query();
    let background = clients.clone();
    let in_flight = tokio::spawn(async move { background.fetch().await });
    gated.wait_for_held_query().await;

    clients.close();
    release.send(()).unwrap();

    assert_eq!(in_flight.await.unwrap().unwrap(), FetchOutcome::Closed);
    assert!(clients.is_empty());
    assert!(!clients.is_live());

    let err = clients
        .create(new_client("Late", "late"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Closed { .. }));
    assert_eq!(gated.inner().calls(StoreOp::Insert), 0);
}
