//! Role-based capabilities: which dashboard features a role may use.
//!
//! # Invariants
//! - Capabilities are a closed set; unknown strings never grant access.
//! - The mapping is static per role; there are no per-user overrides.

use super::user::AppRole;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Submit a new conflict check.
    SubmitConsultation,
    /// Browse one's own check history.
    ViewOwnConsultations,
    /// Review and answer open checks.
    RespondConsultations,
    /// Create users (site-scoped for site admins).
    ManageUsers,
    /// Create and edit sites.
    ManageSites,
}

const STANDARD_USER_CAPABILITIES: &[Capability] = &[
    Capability::SubmitConsultation,
    Capability::ViewOwnConsultations,
];
const SITE_ADMIN_CAPABILITIES: &[Capability] =
    &[Capability::RespondConsultations, Capability::ManageUsers];
const CENTRAL_ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::RespondConsultations,
    Capability::ManageUsers,
    Capability::ManageSites,
];

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SubmitConsultation => "submit_consultation",
            Self::ViewOwnConsultations => "view_own_consultations",
            Self::RespondConsultations => "respond_consultations",
            Self::ManageUsers => "manage_users",
            Self::ManageSites => "manage_sites",
        }
    }
}

/// Capabilities granted to `role`, in dashboard display order.
pub fn capabilities_for(role: AppRole) -> &'static [Capability] {
    match role {
        AppRole::StandardUser => STANDARD_USER_CAPABILITIES,
        AppRole::SiteAdmin => SITE_ADMIN_CAPABILITIES,
        AppRole::CentralAdmin => CENTRAL_ADMIN_CAPABILITIES,
    }
}

impl AppRole {
    pub fn allows(self, capability: Capability) -> bool {
        capabilities_for(self).contains(&capability)
    }
}

#[cfg(test)]
mod tests {
    use super::{capabilities_for, Capability};
    use crate::model::user::AppRole;

    #[test]
    fn only_standard_users_submit_and_browse_history() {
        assert!(AppRole::StandardUser.allows(Capability::SubmitConsultation));
        assert!(AppRole::StandardUser.allows(Capability::ViewOwnConsultations));
        assert!(!AppRole::SiteAdmin.allows(Capability::SubmitConsultation));
        assert!(!AppRole::CentralAdmin.allows(Capability::ViewOwnConsultations));
    }

    #[test]
    fn admins_respond_and_manage_users() {
        for role in AppRole::ADMINS {
            assert!(role.allows(Capability::RespondConsultations));
            assert!(role.allows(Capability::ManageUsers));
        }
        assert!(!AppRole::StandardUser.allows(Capability::RespondConsultations));
    }

    #[test]
    fn only_central_admin_manages_sites() {
        let holders: Vec<AppRole> = AppRole::ALL
            .into_iter()
            .filter(|role| capabilities_for(*role).contains(&Capability::ManageSites))
            .collect();
        assert_eq!(holders, vec![AppRole::CentralAdmin]);
    }
}
