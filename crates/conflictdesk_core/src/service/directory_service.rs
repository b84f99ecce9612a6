//! Directory administration: sites, areas, users and current clients.
//!
//! # Responsibility
//! - Bootstrap the first central administrator on an empty store.
//! - Let administrators maintain the directory inside their site scope.
//!
//! # Invariants
//! - Site admins never act outside their own site.
//! - Only central admins create sites or other central admins.
//! - A user profile and its role grant are written together.

use super::access_service::{resolve_actor, Actor};
use super::{ServiceError, ServiceResult, Session};
use crate::model::access::Capability;
use crate::model::client::CurrentClient;
use crate::model::site::{Area, Site};
use crate::model::user::{AppRole, RoleGrant, User};
use crate::model::{AreaId, SiteId};
use crate::repo::client_repo::ClientRepository;
use crate::repo::site_repo::SiteRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::UnitOfWork;
use log::info;

/// Input for registering a current client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientRegistration {
    pub site_id: SiteId,
    pub area_id: Option<AreaId>,
    pub name: String,
    pub tax_id: String,
    pub service_kind: Option<String>,
    pub status: Option<String>,
}

pub struct DirectoryService<R> {
    repo: R,
}

impl<R> DirectoryService<R>
where
    R: UnitOfWork + UserRepository + SiteRepository + ClientRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates the first central administrator.
    ///
    /// # Errors
    /// - `AlreadyInitialized` when any user exists.
    pub fn bootstrap_central_admin(&self, name: &str, email: &str) -> ServiceResult<User> {
        let user = self.repo.atomically(|repo| -> ServiceResult<User> {
            if repo.count_users()? > 0 {
                return Err(ServiceError::AlreadyInitialized);
            }
            let user = User::new(name, email, AppRole::CentralAdmin, None);
            repo.create_user(&user)?;
            repo.grant_role(&RoleGrant::new(user.id, AppRole::CentralAdmin))?;
            Ok(user)
        })?;
        info!(
            "event=directory_bootstrap module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    pub fn create_site(&self, session: &Session, site: &Site) -> ServiceResult<Site> {
        let actor = resolve_actor(&self.repo, session)?;
        actor.require(Capability::ManageSites, "create sites")?;
        self.repo.create_site(site)?;
        info!(
            "event=site_create module=service status=ok site_id={} user_id={}",
            site.id, actor.user.id
        );
        Ok(site.clone())
    }

    /// Every site, by name. Any known user may read the list.
    pub fn list_sites(&self, session: &Session) -> ServiceResult<Vec<Site>> {
        resolve_actor(&self.repo, session)?;
        Ok(self.repo.list_sites()?)
    }

    pub fn create_area(&self, session: &Session, area: &Area) -> ServiceResult<Area> {
        let actor = resolve_actor(&self.repo, session)?;
        actor.require(Capability::ManageUsers, "create areas")?;
        actor.admin_site_scope(Some(area.site_id), "create areas outside own site")?;
        self.repo.create_area(area)?;
        info!(
            "event=area_create module=service status=ok area_id={} site_id={}",
            area.id, area.site_id
        );
        Ok(area.clone())
    }

    pub fn list_areas(&self, session: &Session, site_id: SiteId) -> ServiceResult<Vec<Area>> {
        resolve_actor(&self.repo, session)?;
        Ok(self.repo.list_areas(site_id)?)
    }

    /// Registers a user profile and its role grant.
    ///
    /// Site admins may only add site admins or standard users to their own site.
    pub fn register_user(
        &self,
        session: &Session,
        name: &str,
        email: &str,
        role: AppRole,
        site_id: Option<SiteId>,
    ) -> ServiceResult<User> {
        let user = self.repo.atomically(|repo| -> ServiceResult<User> {
            let actor = resolve_actor(repo, session)?;
            actor.require(Capability::ManageUsers, "register users")?;
            let site_id = scoped_user_site(&actor, role, site_id)?;
            if let Some(site_id) = site_id {
                ensure_site_exists(repo, site_id)?;
            }

            let user = User::new(name, email, role, site_id);
            repo.create_user(&user)?;
            repo.grant_role(&RoleGrant::new(user.id, role))?;
            Ok(user)
        })?;
        info!(
            "event=user_register module=service status=ok user_id={} role={}",
            user.id, user.role
        );
        Ok(user)
    }

    /// Users visible to the calling administrator.
    pub fn list_users(
        &self,
        session: &Session,
        site_id: Option<SiteId>,
    ) -> ServiceResult<Vec<User>> {
        let actor = resolve_actor(&self.repo, session)?;
        actor.require(Capability::ManageUsers, "list users")?;
        let scope = actor.admin_site_scope(site_id, "list users outside own site")?;
        Ok(self.repo.list_users(scope)?)
    }

    pub fn register_client(
        &self,
        session: &Session,
        registration: &ClientRegistration,
    ) -> ServiceResult<CurrentClient> {
        let actor = resolve_actor(&self.repo, session)?;
        actor.require(Capability::ManageUsers, "register clients")?;
        actor.admin_site_scope(
            Some(registration.site_id),
            "register clients outside own site",
        )?;
        ensure_site_exists(&self.repo, registration.site_id)?;

        let client = CurrentClient::new(
            registration.site_id,
            registration.name.as_str(),
            &registration.tax_id,
        )
        .with_area(registration.area_id)
        .with_service_kind(registration.service_kind.clone())
        .with_status(registration.status.clone());
        self.repo.create_client(&client)?;
        info!(
            "event=client_register module=service status=ok client_id={} site_id={}",
            client.id, client.site_id
        );
        Ok(client)
    }

    /// Current clients visible to the calling administrator.
    pub fn list_clients(
        &self,
        session: &Session,
        site_id: Option<SiteId>,
    ) -> ServiceResult<Vec<CurrentClient>> {
        let actor = resolve_actor(&self.repo, session)?;
        let scope = actor.admin_site_scope(site_id, "list clients")?;
        Ok(self.repo.list_clients(scope)?)
    }
}

/// Site a new user lands in, given who is creating them.
fn scoped_user_site(
    actor: &Actor,
    role: AppRole,
    requested: Option<SiteId>,
) -> ServiceResult<Option<SiteId>> {
    match actor.role {
        AppRole::CentralAdmin => Ok(requested),
        _ if role == AppRole::CentralAdmin => Err(ServiceError::Forbidden {
            action: "create central administrators",
            role: actor.role,
        }),
        _ => actor.admin_site_scope(requested, "register users outside own site"),
    }
}

fn ensure_site_exists<R: SiteRepository>(repo: &R, site_id: SiteId) -> ServiceResult<()> {
    if repo.get_site(site_id)?.is_none() {
        return Err(ServiceError::NotFound {
            entity: "site",
            id: site_id,
        });
    }
    Ok(())
}
