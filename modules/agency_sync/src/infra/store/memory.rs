//! Process-local record store.
//!
//! Backs `--mock` runs and the test suite. Behaves like the hosted store for
//! ordering, limits and id assignment, and can be told to fail the next call
//! of a given kind.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::config::CollectionNames;
use crate::domain::repo::{Direction, ListQuery, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Query,
    Insert,
    Update,
    Delete,
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    failures: Mutex<HashMap<StoreOp, VecDeque<String>>>,
    calls: Mutex<HashMap<StoreOp, usize>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of `collection`.
    pub fn seed(&self, collection: &str, rows: Vec<Value>) {
        self.collections.lock().insert(collection.to_string(), rows);
    }

    /// Make the next `op` call fail with `message`. Queued failures are
    /// consumed one per call.
    pub fn fail_next(&self, op: StoreOp, message: impl Into<String>) {
        self.failures
            .lock()
            .entry(op)
            .or_default()
            .push_back(message.into());
    }

    /// How many `op` calls were made, failed ones included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// Raw rows of `collection` in insertion order.
    pub fn rows(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    fn enter(&self, op: StoreOp) -> anyhow::Result<()> {
        *self.calls.lock().entry(op).or_insert(0) += 1;
        if let Some(message) = self
            .failures
            .lock()
            .get_mut(&op)
            .and_then(VecDeque::pop_front)
        {
            debug!(?op, %message, "injected store failure");
            bail!(message);
        }
        Ok(())
    }

    /// A small agency with a few clients, a month of billing and two vault
    /// entries, seeded under the configured collection names.
    pub fn demo(collections: &CollectionNames) -> Self {
        let store = Self::new();
        let now = Utc::now();
        let ts = |days_ago: i64| (now - Duration::days(days_ago)).to_rfc3339();

        let tech = Uuid::new_v4();
        let startup = Uuid::new_v4();
        let bella = Uuid::new_v4();

        store.seed(
            &collections.clients,
            vec![
                json!({
                    "id": tech, "name": "Tech Solutions", "slug": "tech-solutions",
                    "status": "active", "plan": "professional", "due_date": "2026-02-10",
                    "monthly_value": 1299, "created_at": ts(90)
                }),
                json!({
                    "id": startup, "name": "StartupX", "slug": "startupx",
                    "status": "active", "plan": "essential", "due_date": "2026-02-05",
                    "monthly_value": 599, "created_at": ts(60)
                }),
                json!({
                    "id": bella, "name": "Loja Bella", "slug": "loja-bella",
                    "status": "blocked", "plan": "enterprise", "due_date": "2026-01-20",
                    "monthly_value": 2499, "notes": "Payment overdue since January",
                    "created_at": ts(30)
                }),
            ],
        );

        store.seed(
            &collections.transactions,
            vec![
                json!({
                    "id": Uuid::new_v4(), "client_id": startup.to_string(),
                    "client_name": "StartupX", "type": "income", "status": "paid",
                    "amount": 599, "description": "Monthly fee", "due_date": "2026-01-05",
                    "paid_at": ts(10), "created_at": ts(12)
                }),
                json!({
                    "id": Uuid::new_v4(), "client_id": tech.to_string(),
                    "client_name": "Tech Solutions", "type": "income", "status": "pending",
                    "amount": 1299, "description": "Monthly fee", "due_date": "2026-02-10",
                    "created_at": ts(5)
                }),
                json!({
                    "id": Uuid::new_v4(), "client_id": bella.to_string(),
                    "client_name": "Loja Bella", "type": "income", "status": "overdue",
                    "amount": 2499, "description": "Monthly fee", "due_date": "2026-01-20",
                    "created_at": ts(20)
                }),
                json!({
                    "id": Uuid::new_v4(), "type": "expense", "status": "paid",
                    "amount": 150, "description": "Hosting", "due_date": "2026-01-01",
                    "paid_at": ts(15), "created_at": ts(15)
                }),
            ],
        );

        store.seed(
            &collections.credentials,
            vec![
                json!({
                    "id": Uuid::new_v4(), "client_id": tech.to_string(),
                    "client_name": "Tech Solutions", "title": "Hosting panel",
                    "username": "admin@techsolutions.com", "password": "demo-password",
                    "url": "https://panel.techsolutions.com", "created_at": ts(40)
                }),
                json!({
                    "id": Uuid::new_v4(), "client_id": startup.to_string(),
                    "client_name": "StartupX", "title": "Instagram",
                    "username": "startupx", "password": "demo-password",
                    "created_at": ts(25)
                }),
            ],
        );

        store
    }
}

fn row_id(row: &Value) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

fn compare_field(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        // Nulls last, as the hosted store does for ascending order.
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn query_all(&self, collection: &str, query: &ListQuery) -> anyhow::Result<Vec<Value>> {
        self.enter(StoreOp::Query)?;
        let mut rows = self.rows(collection);
        let field = query.order.field;
        rows.sort_by(|a, b| {
            let ord = compare_field(
                a.get(field).unwrap_or(&Value::Null),
                b.get(field).unwrap_or(&Value::Null),
            );
            match query.order.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn insert(&self, collection: &str, record: Value) -> anyhow::Result<Value> {
        self.enter(StoreOp::Insert)?;
        let Value::Object(mut fields) = record else {
            bail!("insert into '{collection}' expects a JSON object");
        };
        fields
            .entry("id")
            .or_insert_with(|| json!(Uuid::new_v4()));
        fields
            .entry("created_at")
            .or_insert_with(|| json!(Utc::now().to_rfc3339()));
        let row = Value::Object(fields);
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        patch: Value,
    ) -> anyhow::Result<Value> {
        self.enter(StoreOp::Update)?;
        let Value::Object(changes) = patch else {
            bail!("update of '{collection}' expects a JSON object");
        };
        let mut collections = self.collections.lock();
        let row = collections
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r) == Some(id)))
            .ok_or_else(|| anyhow!("no row with id {id} in '{collection}'"))?;
        if let Some(fields) = row.as_object_mut() {
            merge(fields, changes);
            fields.insert("updated_at".into(), json!(Utc::now().to_rfc3339()));
        }
        Ok(row.clone())
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> anyhow::Result<()> {
        self.enter(StoreOp::Delete)?;
        if let Some(rows) = self.collections.lock().get_mut(collection) {
            rows.retain(|r| row_id(r) != Some(id));
        }
        Ok(())
    }
}

fn merge(fields: &mut Map<String, Value>, changes: Map<String, Value>) {
    for (key, value) in changes {
        fields.insert(key, value);
    }
}
