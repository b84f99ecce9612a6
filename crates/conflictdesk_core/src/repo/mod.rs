//! Repository layer abstractions and the SQLite implementation.
//!
//! # Responsibility
//! - Define one data-access contract per aggregate.
//! - Keep SQL details behind `SqliteStore`, which implements every contract.
//! - Offer `UnitOfWork` so services can group writes atomically.
//!
//! # Invariants
//! - Write paths call the model's `validate()` before SQL mutations.
//! - Read paths reject invalid persisted values instead of masking them.
//! - Updates bump `updated_at` and report `NotFound` when no row matched.

pub mod audit_repo;
pub mod client_repo;
pub mod consultation_repo;
pub mod notification_repo;
pub mod response_repo;
pub mod site_repo;
pub mod user_repo;

use crate::db::DbError;
use crate::model::ModelValidationError;
use log::warn;
use rusqlite::{Connection, Row};
use thiserror::Error;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Runs a group of repository calls as one atomic unit.
pub trait UnitOfWork {
    /// Executes `work` in a transaction: committed on `Ok`, rolled back on `Err`.
    ///
    /// Calls must not be nested.
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>;
}

/// SQLite-backed store implementing every repository contract.
#[derive(Clone, Copy)]
pub struct SqliteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a connection returned by `db::open_db*` (migrations applied).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UnitOfWork for SqliteStore<'_> {
    fn atomically<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<RepoError>,
    {
        // Statements issued by `work` share this connection, so they join the
        // open transaction; dropping `tx` without commit rolls back.
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|err| E::from(RepoError::from(err)))?;
        match work(self) {
            Ok(value) => {
                tx.commit().map_err(|err| E::from(RepoError::from(err)))?;
                Ok(value)
            }
            Err(err) => {
                warn!("event=unit_of_work module=repo status=rolled_back");
                Err(err)
            }
        }
    }
}

pub(crate) fn read_uuid(row: &Row<'_>, column: &str, table: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

pub(crate) fn read_optional_uuid(
    row: &Row<'_>,
    column: &str,
    table: &str,
) -> RepoResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Uuid::parse_str(&text).map(Some).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
        }),
        None => Ok(None),
    }
}

/// Reads a text column and maps it through an enum parser.
pub(crate) fn read_enum<T>(
    row: &Row<'_>,
    column: &str,
    table: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> RepoResult<T> {
    let text: String = row.get(column)?;
    parse(&text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid value `{text}` in {table}.{column}"))
    })
}

pub(crate) fn read_flag(row: &Row<'_>, column: &str, table: &str) -> RepoResult<Option<bool>> {
    match row.get::<_, Option<i64>>(column)? {
        None => Ok(None),
        Some(0) => Ok(Some(false)),
        Some(1) => Ok(Some(true)),
        Some(other) => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {table}.{column}"
        ))),
    }
}

/// SQL placeholder list `?, ?, ...` for `count` bound values.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

pub(crate) fn opt_uuid_text(value: Option<Uuid>) -> Option<String> {
    value.map(|id| id.to_string())
}
