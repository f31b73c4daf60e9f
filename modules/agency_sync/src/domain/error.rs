use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Record {id} not found in '{collection}'")]
    NotFound { collection: String, id: Uuid },

    #[error("A client with slug '{slug}' already exists")]
    SlugAlreadyExists { slug: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    /// Remote call failed; `message` is what the store reported.
    #[error("{message}")]
    Store { message: String },

    #[error("Unexpected record shape: {message}")]
    Decode { message: String },

    #[error("Resource for '{collection}' is closed")]
    Closed { collection: String },
}

impl DomainError {
    pub fn not_found(collection: impl Into<String>, id: Uuid) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id,
        }
    }

    pub fn slug_already_exists(slug: impl Into<String>) -> Self {
        Self::SlugAlreadyExists { slug: slug.into() }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn closed(collection: impl Into<String>) -> Self {
        Self::Closed {
            collection: collection.into(),
        }
    }
}
