use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{
    ActivityItem, Client, ClientPatch, Credential, DashboardMetrics, FinancialStats, NewClient,
    NewCredential, NewTransaction, Transaction,
};

/// Public API of the agency_sync module for views and other consumers.
///
/// Errors are [`AgencyError`](crate::contract::error::AgencyError) values
/// wrapped in `anyhow`; downcast to inspect them.
#[async_trait]
pub trait AgencyApi: Send + Sync {
    /// Reload every collection from the record store
    async fn refresh(&self) -> anyhow::Result<()>;

    /// Loaded clients ordered by name, optionally narrowed by a search term
    async fn list_clients(&self, search: Option<String>) -> anyhow::Result<Vec<Client>>;

    async fn create_client(&self, new_client: NewClient) -> anyhow::Result<Client>;

    async fn update_client(&self, id: Uuid, patch: ClientPatch) -> anyhow::Result<Client>;

    async fn delete_client(&self, id: Uuid) -> anyhow::Result<()>;

    /// Newest transactions first
    async fn list_transactions(&self, search: Option<String>)
        -> anyhow::Result<Vec<Transaction>>;

    async fn create_transaction(&self, new_tx: NewTransaction) -> anyhow::Result<Transaction>;

    /// Settle a pending or overdue transaction
    async fn mark_paid(&self, id: Uuid) -> anyhow::Result<Transaction>;

    async fn delete_transaction(&self, id: Uuid) -> anyhow::Result<()>;

    async fn list_credentials(&self, search: Option<String>) -> anyhow::Result<Vec<Credential>>;

    async fn create_credential(&self, new_cred: NewCredential) -> anyhow::Result<Credential>;

    async fn delete_credential(&self, id: Uuid) -> anyhow::Result<()>;

    async fn financial_stats(&self) -> anyhow::Result<FinancialStats>;

    async fn dashboard(&self) -> anyhow::Result<DashboardMetrics>;

    async fn recent_activity(&self, limit: usize) -> anyhow::Result<Vec<ActivityItem>>;
}
