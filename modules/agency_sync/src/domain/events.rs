use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::ActivityKind;
use crate::domain::entity::{ChangeKind, EntityKind};

/// Transport-agnostic event emitted after a confirmed remote mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncEvent {
    pub entity: EntityKind,
    pub change: ChangeKind,
    pub id: Uuid,
    pub label: String,
    pub activity: ActivityKind,
    pub at: DateTime<Utc>,
}
