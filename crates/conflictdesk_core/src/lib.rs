//! Core domain logic for ConflictDesk.
//! This crate is the single source of truth for business invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::consultation::{Consultation, ConsultationStatus, NewConsultation};
pub use model::response::{Response, ResponseDraft, ResponseOutcome};
pub use model::user::{AppRole, User};
pub use repo::{RepoError, RepoResult, SqliteStore, UnitOfWork};
pub use service::access_service::AccessService;
pub use service::directory_service::{ClientRegistration, DirectoryService};
pub use service::intake_service::{IntakeOutcome, IntakeService};
pub use service::notification_service::NotificationService;
pub use service::review_service::{ReviewOutcome, ReviewService};
pub use service::{ServiceError, ServiceResult, Session};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
