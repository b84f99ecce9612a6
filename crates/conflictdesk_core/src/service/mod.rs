//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce role-based permissions before any write.
//! - Group multi-step writes into one `UnitOfWork`.
//!
//! # Invariants
//! - Services stay storage-agnostic: they only see repository traits.
//! - Every operation resolves the caller from the store; nothing is cached.

pub mod access_service;
pub mod directory_service;
pub mod intake_service;
pub mod notification_service;
pub mod review_service;

use crate::model::consultation::ConsultationStatus;
use crate::model::user::AppRole;
use crate::model::{ConsultationId, ModelValidationError, UserId};
use crate::repo::RepoError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Authenticated caller identity supplied by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ModelValidationError),
    #[error("unknown user: {0}")]
    UnknownUser(UserId),
    #[error("role `{role}` may not {action}")]
    Forbidden { action: &'static str, role: AppRole },
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("consultation {id} is `{status}`; cannot {action}")]
    InvalidState {
        id: ConsultationId,
        status: ConsultationStatus,
        action: &'static str,
    },
    #[error("directory already has users; bootstrap is only allowed on an empty store")]
    AlreadyInitialized,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl ServiceError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::UnknownUser(_) => "unknown_user",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::InvalidState { .. } => "invalid_state",
            Self::AlreadyInitialized => "already_initialized",
            Self::Repo(_) => "storage_failed",
        }
    }
}
