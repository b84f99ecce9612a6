//! Site ("sede") and area records.

use super::{normalize_optional, require_email, require_text, AreaId, ModelValidationError, SiteId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Organizational office owning users, areas and current clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    pub contact_email: String,
    pub address: Option<String>,
}

impl Site {
    /// Creates a site with a generated id and trimmed fields.
    pub fn new(
        name: impl Into<String>,
        contact_email: impl Into<String>,
        address: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            contact_email: contact_email.into().trim().to_string(),
            address: normalize_optional(address),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("site name", &self.name)?;
        require_email("site contact email", &self.contact_email)
    }
}

/// Practice area inside a site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub site_id: SiteId,
    pub name: String,
    /// Name of the person in charge, free text.
    pub manager: Option<String>,
    pub contact_email: Option<String>,
}

impl Area {
    pub fn new(
        site_id: SiteId,
        name: impl Into<String>,
        manager: Option<String>,
        contact_email: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            name: name.into().trim().to_string(),
            manager: normalize_optional(manager),
            contact_email: normalize_optional(contact_email),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("area name", &self.name)?;
        if let Some(email) = self.contact_email.as_deref() {
            require_email("area contact email", email)?;
        }
        Ok(())
    }
}
