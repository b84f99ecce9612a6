//! Administrator review of open consultations.
//!
//! # Responsibility
//! - Build the review queue visible to each administrator.
//! - Record a formal response and move the consultation to its next state.
//! - Notify central administrators on escalation and the requester on closure.
//!
//! # Invariants
//! - Only open consultations accept responses.
//! - Site admins only see and answer non-escalated checks from their own site.
//! - A response, its status change, audit entry and notifications commit together.

use super::access_service::{resolve_actor, Actor};
use super::{ServiceError, ServiceResult, Session};
use crate::model::access::Capability;
use crate::model::audit::{AuditEntry, AUDIT_EVENT_CONSULTATION_RESPONDED};
use crate::model::consultation::{Consultation, ConsultationStatus};
use crate::model::notification::{Notification, NotificationKind};
use crate::model::response::{Response, ResponseDraft};
use crate::model::user::AppRole;
use crate::model::{now_epoch_ms, ConsultationId, UserId};
use crate::repo::audit_repo::AuditRepository;
use crate::repo::consultation_repo::{ConsultationListQuery, ConsultationRepository};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::response_repo::ResponseRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::UnitOfWork;
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use std::time::Instant;

const SITE_ADMIN_QUEUE: [ConsultationStatus; 2] =
    [ConsultationStatus::Pending, ConsultationStatus::InProgress];

/// Result of one recorded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewOutcome {
    pub response: Response,
    /// Consultation after the status change.
    pub consultation: Consultation,
    /// Users who received a notification.
    pub notified: Vec<UserId>,
}

pub struct ReviewService<R> {
    repo: R,
}

impl<R> ReviewService<R>
where
    R: UnitOfWork
        + UserRepository
        + ConsultationRepository
        + ResponseRepository
        + AuditRepository
        + NotificationRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Open consultations the caller may answer, newest first.
    pub fn review_queue(&self, session: &Session) -> ServiceResult<Vec<Consultation>> {
        let actor = resolve_actor(&self.repo, session)?;
        actor.require(Capability::RespondConsultations, "view the review queue")?;

        let query = match actor.role {
            AppRole::CentralAdmin => ConsultationListQuery {
                statuses: ConsultationStatus::OPEN.to_vec(),
                ..ConsultationListQuery::default()
            },
            _ => ConsultationListQuery {
                requester_site_id: actor.admin_site_scope(None, "view the review queue")?,
                statuses: SITE_ADMIN_QUEUE.to_vec(),
                ..ConsultationListQuery::default()
            },
        };
        Ok(self.repo.list_consultations(&query)?)
    }

    /// Records the caller's verdict on an open consultation.
    ///
    /// # Errors
    /// - `Forbidden` when the caller is not allowed to answer this consultation.
    /// - `NotFound` when the consultation does not exist.
    /// - `InvalidState` when the consultation is already finalized.
    pub fn respond(
        &self,
        session: &Session,
        consultation_id: ConsultationId,
        draft: &ResponseDraft,
    ) -> ServiceResult<ReviewOutcome> {
        let started_at = Instant::now();
        let result = self
            .repo
            .atomically(|repo| respond_in_unit(repo, session, consultation_id, draft));

        match &result {
            Ok(outcome) => info!(
                "event=consultation_respond module=service status=ok consultation_id={} outcome={} new_status={} notified={} duration_ms={}",
                consultation_id,
                outcome.response.outcome.as_str(),
                outcome.consultation.status,
                outcome.notified.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=consultation_respond module=service status=error consultation_id={} user_id={} error_code={} error={}",
                consultation_id,
                session.user_id,
                err.code(),
                err
            ),
        }
        result
    }

    /// Responses recorded for a consultation, oldest first.
    ///
    /// Visible to the requester and to administrators.
    pub fn responses(
        &self,
        session: &Session,
        consultation_id: ConsultationId,
    ) -> ServiceResult<Vec<Response>> {
        let actor = resolve_actor(&self.repo, session)?;
        let consultation = load_consultation(&self.repo, consultation_id)?;
        if consultation.requester_id != actor.user.id && !actor.role.is_admin() {
            return Err(ServiceError::Forbidden {
                action: "read responses",
                role: actor.role,
            });
        }
        Ok(self.repo.list_responses(consultation_id)?)
    }
}

fn respond_in_unit<R>(
    repo: &R,
    session: &Session,
    consultation_id: ConsultationId,
    draft: &ResponseDraft,
) -> ServiceResult<ReviewOutcome>
where
    R: UserRepository
        + ConsultationRepository
        + ResponseRepository
        + AuditRepository
        + NotificationRepository,
{
    let actor = resolve_actor(repo, session)?;
    actor.require(Capability::RespondConsultations, "respond to consultations")?;

    let mut consultation = load_consultation(repo, consultation_id)?;
    if !consultation.status.is_open() {
        return Err(ServiceError::InvalidState {
            id: consultation.id,
            status: consultation.status,
            action: "respond",
        });
    }
    ensure_in_review_scope(repo, &actor, &consultation)?;

    let previous_status = consultation.status;
    let response = Response::new(consultation.id, actor.user.id, draft, now_epoch_ms());
    repo.create_response(&response)?;

    consultation.status = draft.outcome.resulting_status();
    consultation.has_conflict = Some(draft.outcome.confirms_conflict());
    repo.update_consultation_status(
        consultation.id,
        consultation.status,
        consultation.has_conflict,
    )?;

    repo.append_audit(
        &AuditEntry::new(AUDIT_EVENT_CONSULTATION_RESPONDED)
            .for_consultation(consultation.id)
            .by(actor.user.id)
            .with_detail(json!({
                "outcome": draft.outcome.as_str(),
                "previous_status": previous_status.as_str(),
                "status": consultation.status.as_str(),
            })),
    )?;

    let recipients = match consultation.status {
        ConsultationStatus::Escalated => repo
            .list_users_with_roles(&[AppRole::CentralAdmin])?
            .into_iter()
            .map(|user| user.id)
            .collect(),
        ConsultationStatus::Finalized => vec![consultation.requester_id],
        _ => Vec::new(),
    };
    let kind = if consultation.status == ConsultationStatus::Escalated {
        NotificationKind::Escalation
    } else {
        NotificationKind::Finalization
    };
    let notifications: Vec<Notification> = recipients
        .iter()
        .map(|recipient| {
            Notification::about_consultation(
                *recipient,
                consultation.id,
                kind,
                &consultation.client_name,
            )
        })
        .collect();
    repo.create_notifications(&notifications)?;

    Ok(ReviewOutcome {
        response,
        consultation,
        notified: recipients,
    })
}

fn load_consultation<R: ConsultationRepository>(
    repo: &R,
    consultation_id: ConsultationId,
) -> ServiceResult<Consultation> {
    repo.get_consultation(consultation_id)?
        .ok_or(ServiceError::NotFound {
            entity: "consultation",
            id: consultation_id,
        })
}

/// Site admins may only answer non-escalated checks raised in their site.
fn ensure_in_review_scope<R: UserRepository>(
    repo: &R,
    actor: &Actor,
    consultation: &Consultation,
) -> ServiceResult<()> {
    if actor.role == AppRole::CentralAdmin {
        return Ok(());
    }
    let forbidden = ServiceError::Forbidden {
        action: "respond to this consultation",
        role: actor.role,
    };
    if consultation.status == ConsultationStatus::Escalated {
        return Err(forbidden);
    }
    let requester_site = repo
        .get_user(consultation.requester_id)?
        .and_then(|requester| requester.site_id);
    match (actor.user.site_id, requester_site) {
        (Some(own), Some(site)) if own == site => Ok(()),
        _ => Err(forbidden),
    }
}
