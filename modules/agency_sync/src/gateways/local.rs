use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::AgencyApi,
    error::AgencyError,
    model::{
        ActivityItem, Client, ClientPatch, Credential, DashboardMetrics, FinancialStats,
        NewClient, NewCredential, NewTransaction, Transaction,
    },
};
use crate::domain::{error::DomainError, service::AgencyService};

/// Local implementation of the AgencyApi trait that delegates to the domain service
#[derive(Clone)]
pub struct AgencyLocalClient {
    service: Arc<AgencyService>,
}

impl AgencyLocalClient {
    pub fn new(service: Arc<AgencyService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AgencyApi for AgencyLocalClient {
    async fn refresh(&self) -> anyhow::Result<()> {
        self.service.refresh_all().await.map_err(into_anyhow)
    }

    async fn list_clients(&self, search: Option<String>) -> anyhow::Result<Vec<Client>> {
        let clients = self.service.clients();
        Ok(match search {
            Some(term) => clients.search(&term),
            None => clients.items(),
        })
    }

    async fn create_client(&self, new_client: NewClient) -> anyhow::Result<Client> {
        self.service
            .create_client(new_client)
            .await
            .map_err(into_anyhow)
    }

    async fn update_client(&self, id: Uuid, patch: ClientPatch) -> anyhow::Result<Client> {
        self.service
            .update_client(id, patch)
            .await
            .map_err(into_anyhow)
    }

    async fn delete_client(&self, id: Uuid) -> anyhow::Result<()> {
        self.service.delete_client(id).await.map_err(into_anyhow)
    }

    async fn list_transactions(
        &self,
        search: Option<String>,
    ) -> anyhow::Result<Vec<Transaction>> {
        let transactions = self.service.transactions();
        Ok(match search {
            Some(term) => transactions.search(&term),
            None => transactions.items(),
        })
    }

    async fn create_transaction(&self, new_tx: NewTransaction) -> anyhow::Result<Transaction> {
        self.service
            .create_transaction(new_tx)
            .await
            .map_err(into_anyhow)
    }

    async fn mark_paid(&self, id: Uuid) -> anyhow::Result<Transaction> {
        self.service.mark_paid(id).await.map_err(into_anyhow)
    }

    async fn delete_transaction(&self, id: Uuid) -> anyhow::Result<()> {
        self.service
            .delete_transaction(id)
            .await
            .map_err(into_anyhow)
    }

    async fn list_credentials(&self, search: Option<String>) -> anyhow::Result<Vec<Credential>> {
        let credentials = self.service.credentials();
        Ok(match search {
            Some(term) => credentials.search(&term),
            None => credentials.items(),
        })
    }

    async fn create_credential(&self, new_cred: NewCredential) -> anyhow::Result<Credential> {
        self.service
            .create_credential(new_cred)
            .await
            .map_err(into_anyhow)
    }

    async fn delete_credential(&self, id: Uuid) -> anyhow::Result<()> {
        self.service
            .delete_credential(id)
            .await
            .map_err(into_anyhow)
    }

    async fn financial_stats(&self) -> anyhow::Result<FinancialStats> {
        Ok(self.service.financial_stats())
    }

    async fn dashboard(&self) -> anyhow::Result<DashboardMetrics> {
        Ok(self.service.dashboard())
    }

    async fn recent_activity(&self, limit: usize) -> anyhow::Result<Vec<ActivityItem>> {
        Ok(self.service.recent_activity(limit))
    }
}

/// Map domain errors to contract errors wrapped in anyhow
fn into_anyhow(domain_error: DomainError) -> anyhow::Error {
    anyhow::Error::new(AgencyError::from(domain_error))
}
