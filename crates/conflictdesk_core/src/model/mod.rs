//! Domain model for sites, clients, users and conflict checks.
//!
//! # Responsibility
//! - Define canonical records mirrored one-to-one by storage tables.
//! - Own the closed enumerations (roles, statuses, outcomes, kinds).
//! - Provide write-side validation shared by every repository.
//!
//! # Invariants
//! - Every record is identified by a stable UUID v4.
//! - Records are never hard-deleted; lifecycle lives in status fields.
//! - Timestamps are Unix epoch milliseconds.

pub mod access;
pub mod audit;
pub mod client;
pub mod consultation;
pub mod notification;
pub mod response;
pub mod site;
pub mod user;

use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

pub type SiteId = Uuid;
pub type AreaId = Uuid;
pub type ClientId = Uuid;
pub type UserId = Uuid;
pub type ConsultationId = Uuid;
pub type ResponseId = Uuid;
pub type NotificationId = Uuid;
pub type AuditId = Uuid;

/// Write-side validation failure for any domain record.
///
/// Messages never echo the rejected value; it stays on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelValidationError {
    #[error("{field} must not be blank")]
    BlankField { field: &'static str },
    #[error("{field} is not a valid email address")]
    InvalidEmail { field: &'static str, value: String },
    #[error("tax id must contain only letters and digits after normalization")]
    InvalidTaxId(String),
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::BlankField { field });
    }
    Ok(())
}

pub(crate) fn require_email(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    require_text(field, value)?;
    let mut parts = value.trim().split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    );
    if !valid {
        return Err(ModelValidationError::InvalidEmail {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Trims an optional text field, collapsing blank values to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
