mod common;

use common::{seed, CLIENT_TAX_ID};
use conflictdesk_core::model::notification::NotificationKind;
use conflictdesk_core::model::user::RoleGrant;
use conflictdesk_core::repo::user_repo::UserRepository;
use conflictdesk_core::{
    open_db_in_memory, AppRole, IntakeService, NewConsultation, NotificationService, ServiceError,
    Session, SqliteStore,
};
use uuid::Uuid;

#[test]
fn admin_inbox_tracks_read_state() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    IntakeService::new(store)
        .submit_consultation(
            &seed.requester,
            &NewConsultation::new("Pesquera del Sur", CLIENT_TAX_ID),
        )
        .unwrap();
    let inbox = NotificationService::new(store);

    let unread = inbox.inbox(&seed.lima_admin, true).unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].kind, NotificationKind::NewConsultation);
    assert_eq!(unread[0].title, "Nueva consulta: Pesquera del Sur");

    inbox.mark_read(&seed.lima_admin, unread[0].id).unwrap();
    assert!(inbox.inbox(&seed.lima_admin, true).unwrap().is_empty());
    let all = inbox.inbox(&seed.lima_admin, false).unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].read);

    assert_eq!(inbox.inbox(&seed.cusco_admin, true).unwrap().len(), 1);
    assert!(inbox.inbox(&seed.requester, false).unwrap().is_empty());
}

#[test]
fn cannot_mark_someone_elses_notification() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    IntakeService::new(store)
        .submit_consultation(
            &seed.requester,
            &NewConsultation::new("Pesquera del Sur", CLIENT_TAX_ID),
        )
        .unwrap();
    let inbox = NotificationService::new(store);
    let central_note = inbox.inbox(&seed.central, false).unwrap()[0].id;

    let err = inbox.mark_read(&seed.lima_admin, central_note).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "notification",
            ..
        }
    ));
    assert!(!inbox.inbox(&seed.central, false).unwrap()[0].read);

    let unknown = inbox
        .inbox(&Session::new(Uuid::new_v4()), false)
        .unwrap_err();
    assert!(matches!(unknown, ServiceError::UnknownUser(_)));
}

#[test]
fn conflict_alerts_follow_profile_role_not_grants() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    store
        .grant_role(&RoleGrant::new(seed.colleague.user_id, AppRole::SiteAdmin))
        .unwrap();

    IntakeService::new(store)
        .submit_consultation(
            &seed.requester,
            &NewConsultation::new("Pesquera del Sur", CLIENT_TAX_ID),
        )
        .unwrap();
    let inbox = NotificationService::new(store);

    assert!(inbox.inbox(&seed.colleague, false).unwrap().is_empty());
    assert_eq!(inbox.inbox(&seed.lima_admin, false).unwrap().len(), 1);
}
