use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

/// Sort direction for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub direction: Direction,
}

impl OrderBy {
    pub const fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub const fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

/// What `query_all` should return: one ordering and an optional row cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub order: OrderBy,
    pub limit: Option<u32>,
}

impl ListQuery {
    pub const fn ordered(order: OrderBy) -> Self {
        Self { order, limit: None }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Port for the domain layer: the remote record store.
///
/// Records travel as JSON objects; entity decoding happens in the resource.
/// Errors carry the store's own message, which ends up verbatim in the
/// resource's `error` field.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record of `collection`, ordered and capped as `query` says.
    async fn query_all(&self, collection: &str, query: &ListQuery) -> anyhow::Result<Vec<Value>>;
    /// Insert one record and return it as stored (with id and created_at).
    async fn insert(&self, collection: &str, record: Value) -> anyhow::Result<Value>;
    /// Apply `patch` to the record with `id` and return the stored result.
    async fn update_by_id(&self, collection: &str, id: Uuid, patch: Value)
        -> anyhow::Result<Value>;
    /// Delete by id. Deleting a missing id is not an error.
    async fn delete_by_id(&self, collection: &str, id: Uuid) -> anyhow::Result<()>;
}
