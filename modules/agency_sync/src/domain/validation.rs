//! Input checks run before anything is sent to the record store.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use url::Url;
use uuid::Uuid;

use crate::contract::model::{
    Client, ClientPatch, Credential, CredentialPatch, NewClient, NewCredential, NewTransaction,
    Transaction, TransactionPatch, TransactionStatus,
};
use crate::domain::error::DomainError;

pub const MAX_NAME_LEN: usize = 120;

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex is valid"));

fn require_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    require_text("name", name)?;
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(DomainError::validation(
            "name",
            format!("too long: {len} characters (max: {MAX_NAME_LEN})"),
        ));
    }
    Ok(())
}

fn validate_slug(
    slug: &str,
    taken_by: Option<Uuid>,
    self_id: Option<Uuid>,
) -> Result<(), DomainError> {
    if !SLUG_RE.is_match(slug) {
        return Err(DomainError::validation(
            "slug",
            "use lowercase letters, digits and single hyphens",
        ));
    }
    match taken_by {
        Some(owner) if Some(owner) != self_id => Err(DomainError::slug_already_exists(slug)),
        _ => Ok(()),
    }
}

fn validate_monthly_value(value: Decimal) -> Result<(), DomainError> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation("monthly_value", "must not be negative"));
    }
    Ok(())
}

fn validate_amount(amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::validation("amount", "must be positive"));
    }
    Ok(())
}

fn validate_url(url: Option<&str>) -> Result<(), DomainError> {
    match url {
        Some(raw) if !raw.trim().is_empty() => Url::parse(raw.trim())
            .map(|_| ())
            .map_err(|e| DomainError::validation("url", e.to_string())),
        _ => Ok(()),
    }
}

fn slug_owner(existing: &[Client], slug: &str) -> Option<Uuid> {
    existing.iter().find(|c| c.slug == slug).map(|c| c.id)
}

pub fn validate_new_client(draft: &NewClient, existing: &[Client]) -> Result<(), DomainError> {
    validate_name(&draft.name)?;
    validate_slug(&draft.slug, slug_owner(existing, &draft.slug), None)?;
    validate_monthly_value(draft.monthly_value)
}

pub fn validate_client_patch(
    id: Uuid,
    patch: &ClientPatch,
    existing: &[Client],
) -> Result<(), DomainError> {
    if let Some(ref name) = patch.name {
        validate_name(name)?;
    }
    if let Some(ref slug) = patch.slug {
        validate_slug(slug, slug_owner(existing, slug), Some(id))?;
    }
    if let Some(value) = patch.monthly_value {
        validate_monthly_value(value)?;
    }
    Ok(())
}

pub fn validate_new_transaction(draft: &NewTransaction) -> Result<(), DomainError> {
    validate_amount(draft.amount)?;
    require_text("description", &draft.description)?;
    if draft.paid_at.is_some() && draft.status != TransactionStatus::Paid {
        return Err(DomainError::validation(
            "paid_at",
            "only paid transactions carry a payment date",
        ));
    }
    Ok(())
}

pub fn validate_transaction_patch(
    id: Uuid,
    patch: &TransactionPatch,
    existing: &[Transaction],
) -> Result<(), DomainError> {
    if let Some(amount) = patch.amount {
        validate_amount(amount)?;
    }
    if let Some(ref description) = patch.description {
        require_text("description", description)?;
    }
    let currently_paid = existing.iter().any(|t| t.id == id && t.is_paid());
    let ends_paid = patch
        .status
        .map_or(currently_paid, |s| s == TransactionStatus::Paid);
    match patch.paid_at {
        Some(Some(_)) if !ends_paid => Err(DomainError::validation(
            "paid_at",
            "only paid transactions carry a payment date",
        )),
        Some(None) if ends_paid => Err(DomainError::validation(
            "paid_at",
            "paid transactions need a payment date",
        )),
        None if ends_paid && !currently_paid => Err(DomainError::validation(
            "paid_at",
            "must be set when a transaction is paid",
        )),
        None if currently_paid && !ends_paid => Err(DomainError::validation(
            "paid_at",
            "must be cleared when a paid transaction is reopened",
        )),
        _ => Ok(()),
    }
}

pub fn validate_new_credential(draft: &NewCredential) -> Result<(), DomainError> {
    require_text("title", &draft.title)?;
    require_text("username", &draft.username)?;
    if draft.password.is_empty() {
        return Err(DomainError::validation("password", "must not be empty"));
    }
    validate_url(draft.url.as_deref())
}

pub fn validate_credential_patch(
    _id: Uuid,
    patch: &CredentialPatch,
    _existing: &[Credential],
) -> Result<(), DomainError> {
    if let Some(ref title) = patch.title {
        require_text("title", title)?;
    }
    if let Some(ref username) = patch.username {
        require_text("username", username)?;
    }
    if matches!(patch.password, Some(ref p) if p.is_empty()) {
        return Err(DomainError::validation("password", "must not be empty"));
    }
    validate_url(patch.url.as_deref())
}
