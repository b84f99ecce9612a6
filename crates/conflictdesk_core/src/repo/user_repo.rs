//! User profiles, role grants and the role lookup functions.
//!
//! # Responsibility
//! - Persist `usuarios` rows and `user_roles` grants.
//! - Answer "what role does this user have" (`user_role`) and
//!   "does this user hold role X" (`has_role`).
//!
//! # Invariants
//! - When a user has rows in `user_roles`, those grants are authoritative:
//!   `user_role` returns the highest-precedence one and `has_role` checks
//!   membership. Without grants both fall back to the profile's `rol`.
//! - Granting an already-held role is a no-op.

use super::{
    opt_uuid_text, placeholders, read_enum, read_optional_uuid, read_uuid, RepoError, RepoResult,
    SqliteStore,
};
use crate::model::user::{AppRole, RoleGrant, User};
use crate::model::{SiteId, UserId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Row};

const USER_SELECT_SQL: &str =
    "SELECT id, sede_id, nombre_usuario, correo_electronico, rol FROM usuarios";

pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Users sorted by name, optionally restricted to one site.
    fn list_users(&self, site_id: Option<SiteId>) -> RepoResult<Vec<User>>;
    /// Users whose profile role (`usuarios.rol`) is one of `roles`, sorted by name.
    ///
    /// Grants in `user_roles` are not consulted, so a user promoted only
    /// through `grant_role` is not listed here.
    fn list_users_with_roles(&self, roles: &[AppRole]) -> RepoResult<Vec<User>>;
    fn count_users(&self) -> RepoResult<u64>;
    fn grant_role(&self, grant: &RoleGrant) -> RepoResult<()>;
    /// Effective role of a user, `None` for unknown users.
    fn user_role(&self, user_id: UserId) -> RepoResult<Option<AppRole>>;
    fn has_role(&self, user_id: UserId, role: AppRole) -> RepoResult<bool>;
}

impl UserRepository for SqliteStore<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;
        self.conn.execute(
            "INSERT INTO usuarios (id, sede_id, nombre_usuario, correo_electronico, rol)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                opt_uuid_text(user.site_id),
                user.name.as_str(),
                user.email.as_str(),
                user.role.as_str(),
            ],
        )?;
        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn list_users(&self, site_id: Option<SiteId>) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE (?1 IS NULL OR sede_id = ?1)
             ORDER BY nombre_usuario ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([opt_uuid_text(site_id)])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn list_users_with_roles(&self, roles: &[AppRole]) -> RepoResult<Vec<User>> {
        if roles.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{USER_SELECT_SQL}
             WHERE rol IN ({})
             ORDER BY nombre_usuario ASC, id ASC;",
            placeholders(roles.len())
        );
        let bind_values: Vec<Value> = roles
            .iter()
            .map(|role| Value::Text(role.as_str().to_string()))
            .collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn count_users(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM usuarios;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative user count `{count}`")))
    }

    fn grant_role(&self, grant: &RoleGrant) -> RepoResult<()> {
        if self.get_user(grant.user_id)?.is_none() {
            return Err(RepoError::NotFound {
                entity: "user",
                id: grant.user_id,
            });
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO user_roles (id, user_id, role) VALUES (?1, ?2, ?3);",
            params![
                grant.id.to_string(),
                grant.user_id.to_string(),
                grant.role.as_str(),
            ],
        )?;
        Ok(())
    }

    fn user_role(&self, user_id: UserId) -> RepoResult<Option<AppRole>> {
        let granted = granted_roles(self, user_id)?
            .into_iter()
            .min_by_key(|role| role.precedence());
        if granted.is_some() {
            return Ok(granted);
        }
        Ok(self.get_user(user_id)?.map(|user| user.role))
    }

    fn has_role(&self, user_id: UserId, role: AppRole) -> RepoResult<bool> {
        let granted = granted_roles(self, user_id)?;
        if !granted.is_empty() {
            return Ok(granted.contains(&role));
        }
        Ok(self
            .get_user(user_id)?
            .is_some_and(|user| user.role == role))
    }
}

fn granted_roles(store: &SqliteStore<'_>, user_id: UserId) -> RepoResult<Vec<AppRole>> {
    let mut stmt = store
        .conn
        .prepare("SELECT role FROM user_roles WHERE user_id = ?1;")?;
    let mut rows = stmt.query([user_id.to_string()])?;
    let mut roles = Vec::new();
    while let Some(row) = rows.next()? {
        roles.push(read_enum(row, "role", "user_roles", AppRole::parse)?);
    }
    Ok(roles)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let user = User {
        id: read_uuid(row, "id", "usuarios")?,
        site_id: read_optional_uuid(row, "sede_id", "usuarios")?,
        name: row.get("nombre_usuario")?,
        email: row.get("correo_electronico")?,
        role: read_enum(row, "rol", "usuarios", AppRole::parse)?,
    };
    user.validate()?;
    Ok(user)
}
