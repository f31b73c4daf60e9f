use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{
    ActivityKind, Client, Credential, FinancialStats, Transaction, TransactionPatch,
};
use crate::domain::entity::{ChangeKind, Entity};
use crate::domain::error::DomainError;
use crate::domain::events::SyncEvent;
use crate::domain::filter::{self, Searchable};
use crate::domain::ports::EventPublisher;
use crate::domain::repo::{ListQuery, RecordStore};

pub type ClientsResource = Resource<Client>;
pub type TransactionsResource = Resource<Transaction>;
pub type CredentialsResource = Resource<Credential>;

/// Lifecycle of a resource's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceStatus {
    /// Built but never fetched.
    Idle,
    /// At least one fetch is in flight.
    Loading,
    /// Last settled fetch succeeded.
    Ready,
    /// Last settled fetch failed; items are whatever was loaded before.
    Error,
}

/// What a completed `fetch` did to local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { count: usize },
    /// A newer fetch was issued while this one was in flight.
    Stale,
    /// The resource was closed before the response arrived.
    Closed,
}

#[derive(Clone, Default)]
pub struct ResourceOptions {
    /// Remote collection; `Entity::COLLECTION` when unset.
    pub collection: Option<String>,
    /// Row cap for fetches, on top of the entity's own ordering.
    pub limit: Option<u32>,
    pub events: Option<Arc<dyn EventPublisher<SyncEvent>>>,
}

struct State<E> {
    items: Vec<E>,
    settled: ResourceStatus,
    error: Option<String>,
    fetches_in_flight: usize,
    mutations_in_flight: usize,
    latest_ticket: u64,
    mutation_epoch: u64,
    live: bool,
}

impl<E> State<E> {
    fn status(&self) -> ResourceStatus {
        if self.fetches_in_flight > 0 {
            ResourceStatus::Loading
        } else {
            self.settled
        }
    }
}

struct Shared<E> {
    collection: String,
    query: ListQuery,
    store: Arc<dyn RecordStore>,
    events: Option<Arc<dyn EventPublisher<SyncEvent>>>,
    state: Mutex<State<E>>,
}

/// Mirrors one remote collection into owned local state.
///
/// Mutations are confirm-then-apply: local items change only after the store
/// accepted the call, and a failed call leaves them untouched with the
/// message stored in [`error`](Resource::error). Clones are handles to the
/// same resource; independent resources never share items.
///
/// The state lock is never held across an `.await`, so a fetch and any number
/// of mutations may be outstanding at once. Each fetch takes a ticket and
/// remembers the mutation epoch. Its result, success or failure, is dropped if
/// a newer fetch was issued in the meantime; if only a mutation was applied,
/// the query is re-run under a fresh ticket so the confirmed change is not lost.
pub struct Resource<E: Entity> {
    shared: Arc<Shared<E>>,
}

impl<E: Entity> Clone for Resource<E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Fetch,
    Mutation,
}

/// Keeps the in-flight counters honest on every exit path, including a
/// dropped future.
struct InFlight<'a, E> {
    shared: &'a Shared<E>,
    slot: Slot,
}

impl<'a, E> InFlight<'a, E> {
    fn begin(shared: &'a Shared<E>, slot: Slot) -> Self {
        let mut st = shared.state.lock();
        match slot {
            Slot::Fetch => st.fetches_in_flight += 1,
            Slot::Mutation => st.mutations_in_flight += 1,
        }
        Self { shared, slot }
    }
}

impl<E> Drop for InFlight<'_, E> {
    fn drop(&mut self) {
        let mut st = self.shared.state.lock();
        match self.slot {
            Slot::Fetch => st.fetches_in_flight = st.fetches_in_flight.saturating_sub(1),
            Slot::Mutation => st.mutations_in_flight = st.mutations_in_flight.saturating_sub(1),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value).map_err(|e| DomainError::decode(e.to_string()))
}

fn decode_one<E: Entity>(row: Value) -> Result<E, DomainError> {
    serde_json::from_value(row).map_err(|e| DomainError::decode(e.to_string()))
}

/// Decode a result set, keeping the first occurrence of every id.
fn decode_all<E: Entity>(rows: Vec<Value>) -> Result<Vec<E>, DomainError> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let item: E = decode_one(row)?;
        if seen.insert(item.id()) {
            items.push(item);
        }
    }
    Ok(items)
}

impl<E: Entity> Resource<E> {
    /// An idle resource over the entity's default collection.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_options(store, ResourceOptions::default())
    }

    pub fn with_options(store: Arc<dyn RecordStore>, options: ResourceOptions) -> Self {
        let mut query = E::list_query();
        if let Some(limit) = options.limit {
            query = query.with_limit(limit);
        }
        Self {
            shared: Arc::new(Shared {
                collection: options
                    .collection
                    .unwrap_or_else(|| E::COLLECTION.to_string()),
                query,
                store,
                events: options.events,
                state: Mutex::new(State {
                    items: Vec::new(),
                    settled: ResourceStatus::Idle,
                    error: None,
                    fetches_in_flight: 0,
                    mutations_in_flight: 0,
                    latest_ticket: 0,
                    mutation_epoch: 0,
                    live: true,
                }),
            }),
        }
    }

    /// Build and run the initial fetch. A failed initial fetch is not an
    /// error here: it is visible through `status()` and `error()`.
    pub async fn mount(store: Arc<dyn RecordStore>, options: ResourceOptions) -> Self {
        let resource = Self::with_options(store, options);
        if let Err(e) = resource.fetch().await {
            debug!(collection = %resource.collection(), error = %e, "initial fetch failed");
        }
        resource
    }

    pub fn collection(&self) -> &str {
        &self.shared.collection
    }

    // --- reads ---

    pub fn items(&self) -> Vec<E> {
        self.shared.state.lock().items.clone()
    }

    /// Borrow the items without cloning them.
    pub fn with_items<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        f(&self.shared.state.lock().items)
    }

    pub fn get(&self, id: Uuid) -> Option<E> {
        self.with_items(|items| items.iter().find(|i| i.id() == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> ResourceStatus {
        self.shared.state.lock().status()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.lock().fetches_in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.shared.state.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.shared.state.lock().error = None;
    }

    pub fn has_pending_mutations(&self) -> bool {
        self.shared.state.lock().mutations_in_flight > 0
    }

    // --- lifecycle ---

    /// Mark the resource unmounted. Responses that arrive afterwards are not
    /// applied and new operations are refused.
    pub fn close(&self) {
        self.shared.state.lock().live = false;
    }

    pub fn is_live(&self) -> bool {
        self.shared.state.lock().live
    }

    fn ensure_live(&self) -> Result<(), DomainError> {
        if self.is_live() {
            Ok(())
        } else {
            Err(DomainError::closed(self.collection()))
        }
    }

    fn record_failure(&self, err: DomainError) -> DomainError {
        let mut st = self.shared.state.lock();
        if st.live {
            st.error = Some(err.to_string());
        }
        err
    }

    // --- remote operations ---

    /// Re-read the whole collection. Alias of [`fetch`](Self::fetch) for view code.
    pub async fn refetch(&self) -> Result<FetchOutcome, DomainError> {
        self.fetch().await
    }

    #[instrument(
        name = "agency_sync.resource.fetch",
        skip(self),
        fields(entity = %E::KIND, collection = %self.shared.collection)
    )]
    pub async fn fetch(&self) -> Result<FetchOutcome, DomainError> {
        self.ensure_live()?;
        let _in_flight = InFlight::begin(&self.shared, Slot::Fetch);

        loop {
            let (ticket, epoch) = {
                let mut st = self.shared.state.lock();
                st.latest_ticket += 1;
                (st.latest_ticket, st.mutation_epoch)
            };

            let result = match self
                .shared
                .store
                .query_all(&self.shared.collection, &self.shared.query)
                .await
            {
                Ok(rows) => decode_all::<E>(rows),
                Err(e) => Err(DomainError::store(e.to_string())),
            };

            let mut st = self.shared.state.lock();
            if !st.live {
                return Ok(FetchOutcome::Closed);
            }
            if ticket != st.latest_ticket {
                debug!(ticket, latest = st.latest_ticket, "discarding superseded fetch result");
                return result.map(|_| FetchOutcome::Stale);
            }
            match result {
                // The rows may predate a confirmed mutation; read them again.
                Ok(_) if epoch != st.mutation_epoch => {
                    debug!(ticket, "mutation applied during fetch, querying again");
                }
                Ok(items) => {
                    let count = items.len();
                    st.items = items;
                    st.error = None;
                    st.settled = ResourceStatus::Ready;
                    debug!(count, "collection refreshed");
                    return Ok(FetchOutcome::Applied { count });
                }
                Err(err) => {
                    warn!(error = %err, "fetch failed, keeping previous items");
                    st.error = Some(err.to_string());
                    st.settled = ResourceStatus::Error;
                    return Err(err);
                }
            }
        }
    }

    /// Validate, insert, then append the record the store echoed back.
    #[instrument(
        name = "agency_sync.resource.create",
        skip_all,
        fields(entity = %E::KIND, collection = %self.shared.collection)
    )]
    pub async fn create(&self, draft: E::Draft) -> Result<E, DomainError> {
        self.ensure_live()?;
        let checked = self.with_items(|items| E::validate_draft(&draft, items));
        checked.map_err(|e| self.record_failure(e))?;
        let payload = encode(&draft).map_err(|e| self.record_failure(e))?;

        let _pending = InFlight::begin(&self.shared, Slot::Mutation);
        let stored = self
            .shared
            .store
            .insert(&self.shared.collection, payload)
            .await
            .map_err(|e| {
                warn!(error = %e, "insert rejected");
                self.record_failure(DomainError::store(e.to_string()))
            })?;
        let record: E = decode_one(stored).map_err(|e| self.record_failure(e))?;

        let id = record.id();
        self.apply(ChangeKind::Created, &record, |items| {
            match items.iter().position(|i| i.id() == id) {
                Some(pos) => items[pos] = record.clone(),
                None => items.push(record.clone()),
            }
        });
        info!(id = %id, "record created");
        Ok(record)
    }

    /// Validate, patch remotely, then replace the local copy with the stored result.
    #[instrument(
        name = "agency_sync.resource.update",
        skip(self, patch),
        fields(entity = %E::KIND, collection = %self.shared.collection)
    )]
    pub async fn update(&self, id: Uuid, patch: E::Patch) -> Result<E, DomainError> {
        self.ensure_live()?;
        let checked = self.with_items(|items| E::validate_patch(id, &patch, items));
        checked.map_err(|e| self.record_failure(e))?;
        let payload = encode(&patch).map_err(|e| self.record_failure(e))?;

        let _pending = InFlight::begin(&self.shared, Slot::Mutation);
        let stored = self
            .shared
            .store
            .update_by_id(&self.shared.collection, id, payload)
            .await
            .map_err(|e| {
                warn!(error = %e, "update rejected");
                self.record_failure(DomainError::store(e.to_string()))
            })?;
        let record: E = decode_one(stored).map_err(|e| self.record_failure(e))?;

        self.apply(ChangeKind::Updated, &record, |items| {
            match items.iter().position(|i| i.id() == id) {
                Some(pos) => items[pos] = record.clone(),
                None => items.push(record.clone()),
            }
        });
        info!("record updated");
        Ok(record)
    }

    /// Delete remotely, then drop the record with `id` from local state.
    #[instrument(
        name = "agency_sync.resource.delete",
        skip(self),
        fields(entity = %E::KIND, collection = %self.shared.collection)
    )]
    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.ensure_live()?;

        let _pending = InFlight::begin(&self.shared, Slot::Mutation);
        self.shared
            .store
            .delete_by_id(&self.shared.collection, id)
            .await
            .map_err(|e| {
                warn!(error = %e, "delete rejected");
                self.record_failure(DomainError::store(e.to_string()))
            })?;

        let removed = {
            let mut st = self.shared.state.lock();
            if !st.live {
                debug!("resource closed, confirmed delete not applied");
                return Ok(());
            }
            let removed = st.items.iter().find(|i| i.id() == id).cloned();
            st.items.retain(|i| i.id() != id);
            st.mutation_epoch += 1;
            removed
        };

        let (label, activity) = match removed {
            Some(ref r) => (r.label(), r.activity_kind(ChangeKind::Deleted)),
            None => (id.to_string(), ActivityKind::RecordChanged),
        };
        self.publish(ChangeKind::Deleted, id, label, activity);
        info!("record deleted");
        Ok(())
    }

    fn apply(&self, change: ChangeKind, record: &E, f: impl FnOnce(&mut Vec<E>)) {
        {
            let mut st = self.shared.state.lock();
            if !st.live {
                debug!("resource closed, confirmed change not applied");
                return;
            }
            f(&mut st.items);
            st.mutation_epoch += 1;
        }
        self.publish(
            change,
            record.id(),
            record.label(),
            record.activity_kind(change),
        );
    }

    fn publish(&self, change: ChangeKind, id: Uuid, label: String, activity: ActivityKind) {
        if let Some(ref events) = self.shared.events {
            events.publish(&SyncEvent {
                entity: E::KIND,
                change,
                id,
                label,
                activity,
                at: Utc::now(),
            });
        }
    }
}

impl<E: Entity + Searchable> Resource<E> {
    /// Loaded items matching `term` (case-insensitive, empty matches all).
    pub fn search(&self, term: &str) -> Vec<E> {
        self.with_items(|items| filter::search(items, term).into_iter().cloned().collect())
    }
}

impl Resource<Transaction> {
    pub fn stats(&self) -> FinancialStats {
        self.with_items(FinancialStats::from_transactions)
    }

    /// Settle a transaction. Already-paid transactions are returned as they
    /// are, without a remote call.
    #[instrument(
        name = "agency_sync.resource.mark_paid",
        skip(self),
        fields(collection = %self.shared.collection)
    )]
    pub async fn mark_paid(&self, id: Uuid) -> Result<Transaction, DomainError> {
        self.ensure_live()?;
        let current = self
            .get(id)
            .ok_or_else(|| self.record_failure(DomainError::not_found(self.collection(), id)))?;
        if current.is_paid() {
            debug!("transaction already paid");
            return Ok(current);
        }
        self.update(id, TransactionPatch::paid(Utc::now())).await
    }
}
