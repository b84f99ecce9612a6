//! Caller resolution, role lookup and dashboard capabilities.
//!
//! # Responsibility
//! - Turn a `Session` into an `Actor` (profile + effective role).
//! - Decide which dashboard features the caller sees.
//! - Resolve the site scope an administrator may act on.

use super::{ServiceError, ServiceResult, Session};
use crate::model::access::{capabilities_for, Capability};
use crate::model::user::{AppRole, User};
use crate::model::{SiteId, UserId};
use crate::repo::user_repo::UserRepository;
use log::warn;
use serde::Serialize;

/// Resolved caller: profile plus the role read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user: User,
    pub role: AppRole,
}

impl Actor {
    /// Fails with `Forbidden` unless the role grants `capability`.
    pub fn require(&self, capability: Capability, action: &'static str) -> ServiceResult<()> {
        if self.role.allows(capability) {
            return Ok(());
        }
        warn!(
            "event=access_denied module=service capability={} role={}",
            capability.as_str(),
            self.role
        );
        Err(ServiceError::Forbidden {
            action,
            role: self.role,
        })
    }

    /// Site an administrator may act on for `requested`.
    ///
    /// Central admins act on whatever they request (`None` = all sites).
    /// Site admins are pinned to their own site; asking for another one, or
    /// having no site assigned, is forbidden. Standard users have no scope.
    pub fn admin_site_scope(
        &self,
        requested: Option<SiteId>,
        action: &'static str,
    ) -> ServiceResult<Option<SiteId>> {
        let forbidden = ServiceError::Forbidden {
            action,
            role: self.role,
        };
        match self.role {
            AppRole::CentralAdmin => Ok(requested),
            AppRole::SiteAdmin => match (self.user.site_id, requested) {
                (Some(own), None) => Ok(Some(own)),
                (Some(own), Some(requested)) if own == requested => Ok(Some(own)),
                _ => Err(forbidden),
            },
            AppRole::StandardUser => Err(forbidden),
        }
    }
}

/// Role-dependent dashboard view for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: AppRole,
    pub capabilities: Vec<Capability>,
}

/// Loads the caller's profile and effective role.
pub(crate) fn resolve_actor<R: UserRepository>(repo: &R, session: &Session) -> ServiceResult<Actor> {
    let user = repo
        .get_user(session.user_id)?
        .ok_or(ServiceError::UnknownUser(session.user_id))?;
    let role = repo.user_role(user.id)?.unwrap_or(user.role);
    Ok(Actor { user, role })
}

pub struct AccessService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccessService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Effective role of any user; `None` when the user does not exist.
    pub fn role_of(&self, user_id: UserId) -> ServiceResult<Option<AppRole>> {
        Ok(self.repo.user_role(user_id)?)
    }

    pub fn has_role(&self, user_id: UserId, role: AppRole) -> ServiceResult<bool> {
        Ok(self.repo.has_role(user_id, role)?)
    }

    pub fn dashboard(&self, session: &Session) -> ServiceResult<Dashboard> {
        let actor = resolve_actor(&self.repo, session)?;
        Ok(Dashboard {
            user_id: actor.user.id,
            name: actor.user.name,
            email: actor.user.email,
            role: actor.role,
            capabilities: capabilities_for(actor.role).to_vec(),
        })
    }

    pub fn require(&self, session: &Session, capability: Capability) -> ServiceResult<Actor> {
        let actor = resolve_actor(&self.repo, session)?;
        actor.require(capability, capability.as_str())?;
        Ok(actor)
    }
}
