use std::collections::VecDeque;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::contract::model::{ActivityItem, ActivityKind};
use crate::domain::entity::ChangeKind;
use crate::domain::events::SyncEvent;
use crate::domain::ports::EventPublisher;

/// Bounded, newest-first feed of what happened in this session.
pub struct ActivityLog {
    capacity: usize,
    items: Mutex<VecDeque<ActivityItem>>,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: Mutex::new(VecDeque::new()),
        }
    }

    /// Up to `limit` items, newest first.
    pub fn recent(&self, limit: usize) -> Vec<ActivityItem> {
        self.items.lock().iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

fn describe(event: &SyncEvent) -> String {
    match event.activity {
        ActivityKind::ClientCreated => format!("New client: {}", event.label),
        ActivityKind::PaymentReceived => format!("Payment received: {}", event.label),
        ActivityKind::ClientBlocked => format!("Client blocked: {}", event.label),
        ActivityKind::CredentialAdded => format!("Credential added: {}", event.label),
        ActivityKind::RecordChanged => {
            let verb = match event.change {
                ChangeKind::Created => "created",
                ChangeKind::Updated => "updated",
                ChangeKind::Deleted => "deleted",
            };
            format!("{} {verb}: {}", event.entity, event.label)
        }
    }
}

impl EventPublisher<SyncEvent> for ActivityLog {
    fn publish(&self, event: &SyncEvent) {
        let item = ActivityItem {
            id: Uuid::new_v4(),
            kind: event.activity,
            description: describe(event),
            timestamp: event.at,
        };
        let mut items = self.items.lock();
        items.push_front(item);
        items.truncate(self.capacity);
    }
}
