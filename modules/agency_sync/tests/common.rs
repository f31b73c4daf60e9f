//! Shared fixtures for the agency_sync integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use agency_sync::contract::model::{ClientPlan, ClientStatus, NewClient};
use agency_sync::domain::repo::{ListQuery, RecordStore};
use agency_sync::infra::store::InMemoryRecordStore;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{oneshot, Notify};
use uuid::Uuid;

pub fn client_row(name: &str, slug: &str, status: &str, monthly_value: i64) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "name": name,
        "slug": slug,
        "status": status,
        "plan": "professional",
        "due_date": "2026-02-10",
        "monthly_value": monthly_value,
        "created_at": Utc::now().to_rfc3339(),
    })
}

pub fn tx_row(kind: &str, status: &str, amount: i64, description: &str, days_ago: i64) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "client_name": "Tech Solutions",
        "type": kind,
        "status": status,
        "amount": amount,
        "description": description,
        "due_date": "2026-01-10",
        "created_at": (Utc::now() - Duration::days(days_ago)).to_rfc3339(),
    })
}

pub fn credential_row(title: &str, username: &str) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "client_id": "tech",
        "client_name": "Tech Solutions",
        "title": title,
        "username": username,
        "password": "s3cret",
        "created_at": Utc::now().to_rfc3339(),
    })
}

/// Three clients, three transactions (599 + 899 income, 150 expense) and one credential.
pub fn seeded_store() -> Arc<InMemoryRecordStore> {
    let store = InMemoryRecordStore::new();
    store.seed(
        "clients",
        vec![
            client_row("Tech Solutions", "tech-solutions", "active", 1299),
            client_row("StartupX", "startupx", "active", 599),
            client_row("Loja Bella", "loja-bella", "blocked", 2499),
        ],
    );
    store.seed(
        "transactions",
        vec![
            tx_row("income", "paid", 599, "Monthly fee", 3),
            tx_row("income", "pending", 899, "Landing page", 2),
            tx_row("expense", "paid", 150, "Hosting", 1),
        ],
    );
    store.seed("credentials", vec![credential_row("Hosting panel", "admin")]);
    Arc::new(store)
}

pub fn new_client(name: &str, slug: &str) -> NewClient {
    NewClient {
        name: name.to_string(),
        slug: slug.to_string(),
        status: ClientStatus::Active,
        plan: ClientPlan::Essential,
        due_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
        monthly_value: 599.into(),
        notes: None,
    }
}

/// Wraps an in-memory store and can hold a query mid-flight.
///
/// A held query snapshots the rows when it starts and only returns them once
/// released, which is what a slow network round trip looks like.
pub struct GatedStore {
    inner: Arc<InMemoryRecordStore>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    entered: Notify,
}

impl GatedStore {
    pub fn new(inner: Arc<InMemoryRecordStore>) -> Self {
        Self {
            inner,
            gate: Mutex::new(None),
            entered: Notify::new(),
        }
    }

    pub fn inner(&self) -> &InMemoryRecordStore {
        &self.inner
    }

    /// Hold the next `query_all` until the returned sender fires.
    pub fn hold_next_query(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock() = Some(rx);
        tx
    }

    /// Resolves once a held query has taken its snapshot.
    pub async fn wait_for_held_query(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn query_all(&self, collection: &str, query: &ListQuery) -> anyhow::Result<Vec<Value>> {
        let gate = self.gate.lock().take();
        let rows = self.inner.query_all(collection, query).await;
        if let Some(release) = gate {
            self.entered.notify_one();
            let _ = release.await;
        }
        rows
    }

    async fn insert(&self, collection: &str, record: Value) -> anyhow::Result<Value> {
        self.inner.insert(collection, record).await
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> anyhow::Result<Value> {
        self.inner.update_by_id(collection, id, patch).await
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> anyhow::Result<()> {
        self.inner.delete_by_id(collection, id).await
    }
}
