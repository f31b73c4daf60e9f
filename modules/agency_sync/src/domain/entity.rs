use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::contract::model::{
    ActivityKind, Client, ClientPatch, ClientStatus, Credential, CredentialPatch, NewClient,
    NewCredential, NewTransaction, Transaction, TransactionPatch, TransactionType,
};
use crate::domain::error::DomainError;
use crate::domain::repo::{ListQuery, OrderBy};
use crate::domain::validation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Client,
    Transaction,
    Credential,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Client => "client",
            EntityKind::Transaction => "transaction",
            EntityKind::Credential => "credential",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which confirmed mutation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// A record type mirrored by a [`Resource`](crate::domain::resource::Resource).
///
/// Ties together the wire shape, the draft/patch shapes sent to the store,
/// the default listing and the pre-flight validation.
pub trait Entity:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Draft: Serialize + fmt::Debug + Send + Sync;
    type Patch: Serialize + fmt::Debug + Send + Sync;

    const KIND: EntityKind;
    /// Collection used when none is configured.
    const COLLECTION: &'static str;

    fn id(&self) -> Uuid;

    /// Short human label for logs and the activity list.
    fn label(&self) -> String;

    fn list_query() -> ListQuery;

    fn validate_draft(draft: &Self::Draft, loaded: &[Self]) -> Result<(), DomainError>;

    fn validate_patch(id: Uuid, patch: &Self::Patch, loaded: &[Self]) -> Result<(), DomainError>;

    fn activity_kind(&self, _change: ChangeKind) -> ActivityKind {
        ActivityKind::RecordChanged
    }
}

impl Entity for Client {
    type Draft = NewClient;
    type Patch = ClientPatch;

    const KIND: EntityKind = EntityKind::Client;
    const COLLECTION: &'static str = "clients";

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn list_query() -> ListQuery {
        ListQuery::ordered(OrderBy::asc("name"))
    }

    fn validate_draft(draft: &NewClient, loaded: &[Self]) -> Result<(), DomainError> {
        validation::validate_new_client(draft, loaded)
    }

    fn validate_patch(id: Uuid, patch: &ClientPatch, loaded: &[Self]) -> Result<(), DomainError> {
        validation::validate_client_patch(id, patch, loaded)
    }

    fn activity_kind(&self, change: ChangeKind) -> ActivityKind {
        match change {
            ChangeKind::Created => ActivityKind::ClientCreated,
            ChangeKind::Updated if self.status == ClientStatus::Blocked => {
                ActivityKind::ClientBlocked
            }
            _ => ActivityKind::RecordChanged,
        }
    }
}

impl Entity for Transaction {
    type Draft = NewTransaction;
    type Patch = TransactionPatch;

    const KIND: EntityKind = EntityKind::Transaction;
    const COLLECTION: &'static str = "transactions";

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        match self.client_name {
            Some(ref client) => format!("{} ({client})", self.description),
            None => self.description.clone(),
        }
    }

    /// Newest first; the resource narrows this to the configured window.
    fn list_query() -> ListQuery {
        ListQuery::ordered(OrderBy::desc("created_at"))
    }

    fn validate_draft(draft: &NewTransaction, _loaded: &[Self]) -> Result<(), DomainError> {
        validation::validate_new_transaction(draft)
    }

    fn validate_patch(
        id: Uuid,
        patch: &TransactionPatch,
        loaded: &[Self],
    ) -> Result<(), DomainError> {
        validation::validate_transaction_patch(id, patch, loaded)
    }

    fn activity_kind(&self, change: ChangeKind) -> ActivityKind {
        match change {
            ChangeKind::Updated if self.is_paid() && self.kind == TransactionType::Income => {
                ActivityKind::PaymentReceived
            }
            _ => ActivityKind::RecordChanged,
        }
    }
}

impl Entity for Credential {
    type Draft = NewCredential;
    type Patch = CredentialPatch;

    const KIND: EntityKind = EntityKind::Credential;
    const COLLECTION: &'static str = "credentials";

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }

    fn list_query() -> ListQuery {
        ListQuery::ordered(OrderBy::asc("title"))
    }

    fn validate_draft(draft: &NewCredential, _loaded: &[Self]) -> Result<(), DomainError> {
        validation::validate_new_credential(draft)
    }

    fn validate_patch(
        id: Uuid,
        patch: &CredentialPatch,
        loaded: &[Self],
    ) -> Result<(), DomainError> {
        validation::validate_credential_patch(id, patch, loaded)
    }

    fn activity_kind(&self, change: ChangeKind) -> ActivityKind {
        match change {
            ChangeKind::Created => ActivityKind::CredentialAdded,
            _ => ActivityKind::RecordChanged,
        }
    }
}
