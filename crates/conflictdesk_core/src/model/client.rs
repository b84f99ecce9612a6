//! Current client records and the matching keys used by conflict checks.
//!
//! # Invariants
//! - `tax_id` is always stored in normalized form (see [`normalize_tax_id`]).
//! - Name matching compares [`fold_name`] forms; storage keeps original casing.

use super::{
    normalize_optional, now_epoch_ms, require_text, AreaId, ClientId, ModelValidationError, SiteId,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static TAX_ID_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s.\-]+").expect("valid separator regex"));
static TAX_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Z]+$").expect("valid tax id regex"));

/// Existing client of the organization, registered under one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentClient {
    pub id: ClientId,
    pub site_id: SiteId,
    pub area_id: Option<AreaId>,
    pub name: String,
    /// Normalized tax identifier (RUC or equivalent).
    pub tax_id: String,
    pub service_kind: Option<String>,
    /// Free-form engagement state kept by the office.
    pub status: Option<String>,
    pub registered_at: i64,
}

impl CurrentClient {
    /// Creates a client record registered now.
    pub fn new(site_id: SiteId, name: impl Into<String>, tax_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            area_id: None,
            name: name.into().trim().to_string(),
            tax_id: normalize_tax_id(tax_id),
            service_kind: None,
            status: None,
            registered_at: now_epoch_ms(),
        }
    }

    pub fn with_area(mut self, area_id: Option<AreaId>) -> Self {
        self.area_id = area_id;
        self
    }

    pub fn with_service_kind(mut self, service_kind: Option<String>) -> Self {
        self.service_kind = normalize_optional(service_kind);
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = normalize_optional(status);
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("client name", &self.name)?;
        validate_tax_id(&self.tax_id)
    }
}

/// Canonical tax-ID form: separators (whitespace, `.`, `-`) removed, upper-cased.
pub fn normalize_tax_id(value: &str) -> String {
    TAX_ID_SEPARATOR_RE
        .replace_all(value.trim(), "")
        .to_uppercase()
}

/// Checks that an already-normalized tax ID is non-empty and alphanumeric.
pub fn validate_tax_id(normalized: &str) -> Result<(), ModelValidationError> {
    require_text("tax id", normalized)?;
    if !TAX_ID_RE.is_match(normalized) {
        return Err(ModelValidationError::InvalidTaxId(normalized.to_string()));
    }
    Ok(())
}

/// Case-folded name used for substring matching.
///
/// Must agree with the `fold_case` SQL function registered on every connection.
pub fn fold_name(value: &str) -> String {
    value.trim().to_lowercase()
}
