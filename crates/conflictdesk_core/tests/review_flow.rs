mod common;

use common::{count_rows, seed, Seed, CLIENT_TAX_ID};
use conflictdesk_core::model::audit::AUDIT_EVENT_CONSULTATION_RESPONDED;
use conflictdesk_core::model::notification::NotificationKind;
use conflictdesk_core::model::ConsultationId;
use conflictdesk_core::repo::audit_repo::AuditRepository;
use conflictdesk_core::repo::notification_repo::NotificationRepository;
use conflictdesk_core::{
    open_db_in_memory, ConsultationStatus, IntakeService, NewConsultation, ResponseDraft,
    ResponseOutcome, ReviewService, ServiceError, SqliteStore,
};
use uuid::Uuid;

fn flagged_consultation(store: SqliteStore<'_>, seed: &Seed) -> ConsultationId {
    let outcome = IntakeService::new(store)
        .submit_consultation(
            &seed.requester,
            &NewConsultation::new("Pesquera del Sur", CLIENT_TAX_ID),
        )
        .unwrap();
    assert!(outcome.has_conflict());
    outcome.consultation.id
}

fn draft(outcome: ResponseOutcome) -> ResponseDraft {
    ResponseDraft {
        outcome,
        comment: Some("Revisado con el área".to_string()),
    }
}

#[test]
fn review_queue_is_scoped_by_role_and_site() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let id = flagged_consultation(store, &seed);
    let review = ReviewService::new(store);

    let lima_queue = review.review_queue(&seed.lima_admin).unwrap();
    assert_eq!(lima_queue.iter().map(|c| c.id).collect::<Vec<_>>(), vec![id]);
    assert!(review.review_queue(&seed.cusco_admin).unwrap().is_empty());
    assert_eq!(review.review_queue(&seed.central).unwrap().len(), 1);

    let err = review.review_queue(&seed.requester).unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));
}

#[test]
fn site_admin_clears_consultation_and_requester_is_notified() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let id = flagged_consultation(store, &seed);

    let outcome = ReviewService::new(store)
        .respond(&seed.lima_admin, id, &draft(ResponseOutcome::NoConflict))
        .unwrap();

    assert_eq!(outcome.consultation.status, ConsultationStatus::Finalized);
    assert_eq!(outcome.consultation.has_conflict, Some(false));
    assert_eq!(outcome.notified, vec![seed.requester.user_id]);
    assert_eq!(outcome.response.responder_id, seed.lima_admin.user_id);

    let inbox = store
        .list_notifications(seed.requester.user_id, true)
        .unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Finalization);
    assert_eq!(inbox[0].consultation_id, Some(id));

    let trail = store.list_audit(id).unwrap();
    let responded = trail
        .iter()
        .find(|entry| entry.event == AUDIT_EVENT_CONSULTATION_RESPONDED)
        .expect("response audited");
    let detail = responded.detail.as_ref().unwrap();
    assert_eq!(detail["outcome"], serde_json::json!("sin_conflicto"));
    assert_eq!(detail["previous_status"], serde_json::json!("en_proceso"));
    assert_eq!(detail["status"], serde_json::json!("finalizado"));
}

#[test]
fn escalation_hands_consultation_to_central_admins() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let id = flagged_consultation(store, &seed);
    let review = ReviewService::new(store);

    let escalated = review
        .respond(&seed.lima_admin, id, &draft(ResponseOutcome::RequiresEscalation))
        .unwrap();
    assert_eq!(escalated.consultation.status, ConsultationStatus::Escalated);
    assert_eq!(escalated.notified, vec![seed.central.user_id]);

    let central_inbox = store.list_notifications(seed.central.user_id, false).unwrap();
    assert!(central_inbox
        .iter()
        .any(|n| n.kind == NotificationKind::Escalation && n.consultation_id == Some(id)));

    assert!(review.review_queue(&seed.lima_admin).unwrap().is_empty());
    let denied = review
        .respond(&seed.lima_admin, id, &draft(ResponseOutcome::Conflict))
        .unwrap_err();
    assert!(matches!(denied, ServiceError::Forbidden { .. }));

    let closed = review
        .respond(&seed.central, id, &draft(ResponseOutcome::Conflict))
        .unwrap();
    assert_eq!(closed.consultation.status, ConsultationStatus::Finalized);
    assert_eq!(closed.consultation.has_conflict, Some(true));
    assert_eq!(review.responses(&seed.central, id).unwrap().len(), 2);
}

#[test]
fn finalized_consultation_rejects_further_responses() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let cleared = IntakeService::new(store)
        .submit_consultation(
            &seed.requester,
            &NewConsultation::new("Minera Andina", "20555666777"),
        )
        .unwrap();
    let responses_before = count_rows(&conn, "respuestas");

    let err = ReviewService::new(store)
        .respond(
            &seed.central,
            cleared.consultation.id,
            &draft(ResponseOutcome::Conflict),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::InvalidState {
            status: ConsultationStatus::Finalized,
            ..
        }
    ));
    assert_eq!(count_rows(&conn, "respuestas"), responses_before);
}

#[test]
fn admins_cannot_answer_outside_their_scope() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let id = flagged_consultation(store, &seed);
    let review = ReviewService::new(store);

    let foreign_site = review
        .respond(&seed.cusco_admin, id, &draft(ResponseOutcome::NoConflict))
        .unwrap_err();
    assert!(matches!(foreign_site, ServiceError::Forbidden { .. }));

    let standard_user = review
        .respond(&seed.colleague, id, &draft(ResponseOutcome::NoConflict))
        .unwrap_err();
    assert!(matches!(standard_user, ServiceError::Forbidden { .. }));

    let missing = review
        .respond(&seed.central, Uuid::new_v4(), &draft(ResponseOutcome::NoConflict))
        .unwrap_err();
    assert!(matches!(missing, ServiceError::NotFound { .. }));
    assert_eq!(count_rows(&conn, "respuestas"), 0);
}

#[test]
fn responses_are_visible_to_requester_and_admins_only() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let id = flagged_consultation(store, &seed);
    let review = ReviewService::new(store);
    review
        .respond(&seed.lima_admin, id, &draft(ResponseOutcome::Conflict))
        .unwrap();

    let own = review.responses(&seed.requester, id).unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].outcome, ResponseOutcome::Conflict);
    assert_eq!(own[0].comment.as_deref(), Some("Revisado con el área"));
    assert_eq!(review.responses(&seed.cusco_admin, id).unwrap().len(), 1);

    let err = review.responses(&seed.colleague, id).unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));
}
