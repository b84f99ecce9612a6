//! Consultation intake: submission, automatic screening and history.
//!
//! # Responsibility
//! - Create a consultation, screen it against current clients, record the
//!   result, audit it and alert administrators when a conflict is found.
//! - Serve the requester's own consultation history.
//!
//! # Invariants
//! - Submission runs as one unit of work; a failure leaves no partial rows.
//! - Conflict ⇒ status `InProgress` and exactly one `NewConsultation`
//!   notification per site/central administrator.
//! - No conflict ⇒ status `Finalized`, `has_conflict = false`, no notifications.
//! - Log lines carry ids and counts only, never client names or tax IDs.

use super::access_service::resolve_actor;
use super::{ServiceError, ServiceResult, Session};
use crate::model::audit::{AuditEntry, AUDIT_EVENT_CONSULTATION_CREATED};
use crate::model::client::CurrentClient;
use crate::model::consultation::{Consultation, NewConsultation};
use crate::model::notification::{Notification, NotificationKind};
use crate::model::user::AppRole;
use crate::model::{now_epoch_ms, UserId};
use crate::repo::audit_repo::AuditRepository;
use crate::repo::client_repo::ClientRepository;
use crate::repo::consultation_repo::{ConsultationListQuery, ConsultationRepository};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::{RepoError, UnitOfWork};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

/// Result of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeOutcome {
    /// Consultation after screening.
    pub consultation: Consultation,
    /// Current clients that triggered the conflict flag.
    pub matches: Vec<CurrentClient>,
    /// Administrators who received a notification.
    pub notified_admins: Vec<UserId>,
}

impl IntakeOutcome {
    pub fn has_conflict(&self) -> bool {
        !self.matches.is_empty()
    }
}

pub struct IntakeService<R> {
    repo: R,
}

impl<R> IntakeService<R>
where
    R: UnitOfWork
        + UserRepository
        + ConsultationRepository
        + ClientRepository
        + AuditRepository
        + NotificationRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Submits a conflict check on behalf of the session user.
    ///
    /// # Errors
    /// - `UnknownUser` when the session does not map to a profile.
    /// - `Validation` for blank names or malformed tax IDs.
    /// - `Repo` on storage failure; nothing is persisted in that case.
    pub fn submit_consultation(
        &self,
        session: &Session,
        input: &NewConsultation,
    ) -> ServiceResult<IntakeOutcome> {
        let started_at = Instant::now();
        let result = self
            .repo
            .atomically(|repo| submit_in_unit(repo, session, input));

        match &result {
            Ok(outcome) => info!(
                "event=consultation_submit module=service status=ok consultation_id={} conflict={} matches={} notified={} duration_ms={}",
                outcome.consultation.id,
                outcome.has_conflict(),
                outcome.matches.len(),
                outcome.notified_admins.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=consultation_submit module=service status=error user_id={} error_code={} error={}",
                session.user_id,
                err.code(),
                err
            ),
        }
        result
    }

    /// Consultations requested by the session user, newest first.
    pub fn my_consultations(&self, session: &Session) -> ServiceResult<Vec<Consultation>> {
        let actor = resolve_actor(&self.repo, session)?;
        let consultations = self
            .repo
            .list_consultations(&ConsultationListQuery::by_requester(actor.user.id))?;
        Ok(consultations)
    }
}

fn submit_in_unit<R>(
    repo: &R,
    session: &Session,
    input: &NewConsultation,
) -> ServiceResult<IntakeOutcome>
where
    R: UserRepository
        + ConsultationRepository
        + ClientRepository
        + AuditRepository
        + NotificationRepository,
{
    let requester = resolve_actor(repo, session)?;

    let mut consultation = Consultation::pending(requester.user.id, input, now_epoch_ms());
    consultation.validate()?;
    repo.create_consultation(&consultation)?;

    let matches = repo.find_conflicting_clients(&consultation.tax_id, &consultation.client_name)?;
    let has_conflict = !matches.is_empty();
    consultation.apply_screening(has_conflict);
    repo.update_consultation_status(
        consultation.id,
        consultation.status,
        consultation.has_conflict,
    )?;

    repo.append_audit(
        &AuditEntry::new(AUDIT_EVENT_CONSULTATION_CREATED)
            .for_consultation(consultation.id)
            .by(requester.user.id)
            .with_detail(json!({
                "client": consultation.client_name,
                "tax_id": consultation.tax_id,
                "initial_conflict": has_conflict,
                "matches": matches.len(),
            })),
    )?;

    let notified_admins = if has_conflict {
        notify_admins(repo, &consultation)?
    } else {
        Vec::new()
    };

    Ok(IntakeOutcome {
        consultation,
        matches,
        notified_admins,
    })
}

fn notify_admins<R>(repo: &R, consultation: &Consultation) -> ServiceResult<Vec<UserId>>
where
    R: UserRepository + NotificationRepository,
{
    let admins = repo.list_users_with_roles(&AppRole::ADMINS)?;
    let notifications: Vec<Notification> = admins
        .iter()
        .map(|admin| {
            Notification::about_consultation(
                admin.id,
                consultation.id,
                NotificationKind::NewConsultation,
                &consultation.client_name,
            )
        })
        .collect();
    let written = repo.create_notifications(&notifications)?;
    if written != notifications.len() {
        return Err(ServiceError::Repo(RepoError::InvalidData(format!(
            "expected {} notification rows, wrote {written}",
            notifications.len()
        ))));
    }
    Ok(admins.into_iter().map(|admin| admin.id).collect())
}
