use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to hand to view code and other consumers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgencyError {
    #[error("Record not found: {id}")]
    NotFound { id: Uuid },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The record store rejected the call or could not be reached.
    #[error("Record store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Internal error")]
    Internal,
}

impl AgencyError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

impl From<crate::domain::error::DomainError> for AgencyError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            NotFound { id, .. } => Self::not_found(id),
            SlugAlreadyExists { slug } => {
                Self::conflict(format!("slug '{slug}' is already taken"))
            }
            Validation { field, message } => Self::validation(format!("{field}: {message}")),
            Store { message } => Self::unavailable(message),
            Closed { collection } => {
                Self::unavailable(format!("resource for '{collection}' is closed"))
            }
            Decode { .. } => Self::internal(),
        }
    }
}
