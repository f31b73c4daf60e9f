use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::AgencySyncConfig;
use crate::contract::model::{
    ActivityItem, Client, ClientPatch, Credential, DashboardMetrics, FinancialStats, NewClient,
    NewCredential, NewTransaction, Transaction,
};
use crate::domain::activity::ActivityLog;
use crate::domain::error::DomainError;
use crate::domain::events::SyncEvent;
use crate::domain::ports::EventPublisher;
use crate::domain::repo::RecordStore;
use crate::domain::resource::{
    ClientsResource, CredentialsResource, ResourceOptions, TransactionsResource,
};

/// The three synchronized collections plus the session activity feed.
///
/// Depends only on the record store port. Every resource publishes into the
/// same [`ActivityLog`].
#[derive(Clone)]
pub struct AgencyService {
    clients: ClientsResource,
    transactions: TransactionsResource,
    credentials: CredentialsResource,
    activity: Arc<ActivityLog>,
}

impl AgencyService {
    /// Build idle resources; nothing is fetched until [`refresh_all`](Self::refresh_all).
    pub fn new(store: Arc<dyn RecordStore>, config: &AgencySyncConfig) -> Self {
        let activity = Arc::new(ActivityLog::new(config.activity_capacity));
        let events: Arc<dyn EventPublisher<SyncEvent>> = activity.clone();

        let options = |collection: &str, limit: Option<u32>| ResourceOptions {
            collection: Some(collection.to_string()),
            limit,
            events: Some(events.clone()),
        };

        Self {
            clients: ClientsResource::with_options(
                store.clone(),
                options(&config.collections.clients, None),
            ),
            transactions: TransactionsResource::with_options(
                store.clone(),
                options(
                    &config.collections.transactions,
                    Some(config.transactions_window),
                ),
            ),
            credentials: CredentialsResource::with_options(
                store,
                options(&config.collections.credentials, None),
            ),
            activity,
        }
    }

    /// Build and load all three collections concurrently.
    pub async fn mount(store: Arc<dyn RecordStore>, config: &AgencySyncConfig) -> Self {
        let service = Self::new(store, config);
        if let Err(e) = service.refresh_all().await {
            warn!(error = %e, "initial load incomplete");
        }
        service
    }

    /// Fetch every collection concurrently. Each resource keeps its own
    /// status; the first failure is returned.
    #[instrument(name = "agency_sync.service.refresh_all", skip(self))]
    pub async fn refresh_all(&self) -> Result<(), DomainError> {
        let (clients, transactions, credentials) = tokio::join!(
            self.clients.fetch(),
            self.transactions.fetch(),
            self.credentials.fetch()
        );
        info!(
            clients = self.clients.len(),
            transactions = self.transactions.len(),
            credentials = self.credentials.len(),
            "collections loaded"
        );
        clients.and(transactions).and(credentials).map(|_| ())
    }

    pub fn clients(&self) -> &ClientsResource {
        &self.clients
    }

    pub fn transactions(&self) -> &TransactionsResource {
        &self.transactions
    }

    pub fn credentials(&self) -> &CredentialsResource {
        &self.credentials
    }

    pub fn dashboard(&self) -> DashboardMetrics {
        self.clients.with_items(|clients| {
            self.transactions
                .with_items(|txs| DashboardMetrics::compute(clients, txs))
        })
    }

    pub fn financial_stats(&self) -> FinancialStats {
        self.transactions.stats()
    }

    pub fn recent_activity(&self, limit: usize) -> Vec<ActivityItem> {
        self.activity.recent(limit)
    }

    // --- thin delegates used by the local client ---

    pub async fn create_client(&self, draft: NewClient) -> Result<Client, DomainError> {
        self.clients.create(draft).await
    }

    pub async fn update_client(&self, id: Uuid, patch: ClientPatch) -> Result<Client, DomainError> {
        self.clients.update(id, patch).await
    }

    pub async fn delete_client(&self, id: Uuid) -> Result<(), DomainError> {
        self.clients.delete(id).await
    }

    pub async fn create_transaction(
        &self,
        draft: NewTransaction,
    ) -> Result<Transaction, DomainError> {
        self.transactions.create(draft).await
    }

    pub async fn mark_paid(&self, id: Uuid) -> Result<Transaction, DomainError> {
        self.transactions.mark_paid(id).await
    }

    pub async fn delete_transaction(&self, id: Uuid) -> Result<(), DomainError> {
        self.transactions.delete(id).await
    }

    pub async fn create_credential(
        &self,
        draft: NewCredential,
    ) -> Result<Credential, DomainError> {
        self.credentials.create(draft).await
    }

    pub async fn delete_credential(&self, id: Uuid) -> Result<(), DomainError> {
        self.credentials.delete(id).await
    }

    /// Unmount every resource; late responses are dropped from here on.
    pub fn close(&self) {
        self.clients.close();
        self.transactions.close();
        self.credentials.close();
    }
}
