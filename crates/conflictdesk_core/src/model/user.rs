//! Users, application roles and role grants.

use super::{require_email, require_text, ModelValidationError, SiteId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application role. Stored as the schema's `app_role` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppRole {
    /// Organization-wide administrator.
    #[serde(rename = "admin_central")]
    CentralAdmin,
    /// Administrator of one site.
    #[serde(rename = "admin_sede")]
    SiteAdmin,
    /// Lawyer or staff member submitting checks.
    #[serde(rename = "usuario_normal")]
    StandardUser,
}

impl AppRole {
    pub const ALL: [Self; 3] = [Self::CentralAdmin, Self::SiteAdmin, Self::StandardUser];
    pub const ADMINS: [Self; 2] = [Self::SiteAdmin, Self::CentralAdmin];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CentralAdmin => "admin_central",
            Self::SiteAdmin => "admin_sede",
            Self::StandardUser => "usuario_normal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == value.trim())
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Self::CentralAdmin | Self::SiteAdmin)
    }

    /// Lower value wins when a user holds several grants.
    pub fn precedence(self) -> u8 {
        match self {
            Self::CentralAdmin => 0,
            Self::SiteAdmin => 1,
            Self::StandardUser => 2,
        }
    }
}

impl Default for AppRole {
    fn default() -> Self {
        Self::StandardUser
    }
}

impl std::fmt::Display for AppRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application user profile ("usuarios" row).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub site_id: Option<SiteId>,
    pub name: String,
    pub email: String,
    pub role: AppRole,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: AppRole,
        site_id: Option<SiteId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            name: name.into().trim().to_string(),
            email: email.into().trim().to_lowercase(),
            role,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_text("user name", &self.name)?;
        require_email("user email", &self.email)
    }
}

/// One row of `user_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub id: Uuid,
    pub user_id: UserId,
    pub role: AppRole,
}

impl RoleGrant {
    pub fn new(user_id: UserId, role: AppRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            role,
        }
    }
}
