mod common;

use common::{count_rows, seed};
use conflictdesk_core::model::access::Capability;
use conflictdesk_core::model::site::{Area, Site};
use conflictdesk_core::model::user::RoleGrant;
use conflictdesk_core::repo::client_repo::ClientRepository;
use conflictdesk_core::repo::user_repo::UserRepository;
use conflictdesk_core::{
    open_db_in_memory, AccessService, AppRole, ClientRegistration, DirectoryService,
    ServiceError, Session, SqliteStore, User,
};
use uuid::Uuid;

#[test]
fn bootstrap_only_runs_on_an_empty_directory() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let directory = DirectoryService::new(store);

    let admin = directory
        .bootstrap_central_admin("Primera Admin", "Admin@Firm.pe")
        .unwrap();
    assert_eq!(admin.email, "admin@firm.pe");
    assert_eq!(
        AccessService::new(store).role_of(admin.id).unwrap(),
        Some(AppRole::CentralAdmin)
    );

    let err = directory
        .bootstrap_central_admin("Segunda Admin", "otra@firm.pe")
        .unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyInitialized));
    assert_eq!(count_rows(&conn, "usuarios"), 1);
}

#[test]
fn role_lookup_prefers_highest_grant_then_profile() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let access = AccessService::new(store);

    assert_eq!(
        access.role_of(seed.requester.user_id).unwrap(),
        Some(AppRole::StandardUser)
    );
    store
        .grant_role(&RoleGrant::new(seed.requester.user_id, AppRole::SiteAdmin))
        .unwrap();
    assert_eq!(
        access.role_of(seed.requester.user_id).unwrap(),
        Some(AppRole::SiteAdmin)
    );
    assert!(access
        .has_role(seed.requester.user_id, AppRole::SiteAdmin)
        .unwrap());
    assert!(!access
        .has_role(seed.requester.user_id, AppRole::CentralAdmin)
        .unwrap());

    let ungranted = User::new("Sin Grant", "sin.grant@firm.pe", AppRole::SiteAdmin, None);
    store.create_user(&ungranted).unwrap();
    assert_eq!(access.role_of(ungranted.id).unwrap(), Some(AppRole::SiteAdmin));

    assert_eq!(access.role_of(Uuid::new_v4()).unwrap(), None);
    assert!(!access.has_role(Uuid::new_v4(), AppRole::StandardUser).unwrap());
}

#[test]
fn dashboard_lists_capabilities_for_the_role() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let access = AccessService::new(store);

    let user_view = access.dashboard(&seed.requester).unwrap();
    assert_eq!(user_view.role, AppRole::StandardUser);
    assert_eq!(
        user_view.capabilities,
        vec![
            Capability::SubmitConsultation,
            Capability::ViewOwnConsultations
        ]
    );

    let central_view = access.dashboard(&seed.central).unwrap();
    assert!(central_view.capabilities.contains(&Capability::ManageSites));
    assert!(!central_view
        .capabilities
        .contains(&Capability::SubmitConsultation));

    let err = access
        .require(&seed.lima_admin, Capability::ManageSites)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden {
            role: AppRole::SiteAdmin,
            ..
        }
    ));

    let unknown = access.dashboard(&Session::new(Uuid::new_v4())).unwrap_err();
    assert!(matches!(unknown, ServiceError::UnknownUser(_)));
}

#[test]
fn only_central_admins_create_sites() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let directory = DirectoryService::new(store);
    let site = Site::new("Arequipa", "arequipa@firm.pe", Some("Av. Ejército 101".to_string()));

    for session in [&seed.lima_admin, &seed.requester] {
        let err = directory.create_site(session, &site).unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));
    }
    directory.create_site(&seed.central, &site).unwrap();

    let names: Vec<String> = directory
        .list_sites(&seed.requester)
        .unwrap()
        .into_iter()
        .map(|site| site.name)
        .collect();
    assert_eq!(names, vec!["Arequipa", "Cusco", "Lima"]);
}

#[test]
fn site_admins_manage_users_in_their_own_site() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let directory = DirectoryService::new(store);

    let pinned = directory
        .register_user(
            &seed.lima_admin,
            "Nuevo Abogado",
            "nuevo@firm.pe",
            AppRole::StandardUser,
            None,
        )
        .unwrap();
    assert_eq!(pinned.site_id, Some(seed.lima));

    let foreign = directory
        .register_user(
            &seed.lima_admin,
            "Otro",
            "otro@firm.pe",
            AppRole::StandardUser,
            Some(seed.cusco),
        )
        .unwrap_err();
    assert!(matches!(foreign, ServiceError::Forbidden { .. }));

    let promote = directory
        .register_user(
            &seed.lima_admin,
            "Jefe",
            "jefe@firm.pe",
            AppRole::CentralAdmin,
            Some(seed.lima),
        )
        .unwrap_err();
    assert!(matches!(promote, ServiceError::Forbidden { .. }));

    let by_user = directory
        .register_user(&seed.requester, "X", "x@firm.pe", AppRole::StandardUser, None)
        .unwrap_err();
    assert!(matches!(by_user, ServiceError::Forbidden { .. }));

    let lima_users = directory.list_users(&seed.lima_admin, None).unwrap();
    assert!(lima_users.iter().all(|user| user.site_id == Some(seed.lima)));
    assert_eq!(lima_users.len(), 4);
}

#[test]
fn duplicate_email_leaves_no_partial_user() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let users_before = count_rows(&conn, "usuarios");
    let grants_before = count_rows(&conn, "user_roles");

    let err = DirectoryService::new(store)
        .register_user(
            &seed.central,
            "Rosa Duplicada",
            "ROSA@firm.pe",
            AppRole::StandardUser,
            Some(seed.lima),
        )
        .unwrap_err();

    assert!(matches!(err, ServiceError::Repo(_)));
    assert_eq!(count_rows(&conn, "usuarios"), users_before);
    assert_eq!(count_rows(&conn, "user_roles"), grants_before);
}

#[test]
fn register_user_requires_existing_site() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);

    let err = DirectoryService::new(store)
        .register_user(
            &seed.central,
            "Perdido",
            "perdido@firm.pe",
            AppRole::StandardUser,
            Some(Uuid::new_v4()),
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "site", .. }));
}

#[test]
fn clients_and_areas_follow_site_scope() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::new(&conn);
    let seed = seed(store);
    let directory = DirectoryService::new(store);

    let cusco_area = directory
        .create_area(
            &seed.cusco_admin,
            &Area::new(seed.cusco, "Corporativo", Some("Luis Paz".to_string()), None),
        )
        .unwrap();
    let foreign_area = directory
        .create_area(&seed.lima_admin, &Area::new(seed.cusco, "Penal", None, None))
        .unwrap_err();
    assert!(matches!(foreign_area, ServiceError::Forbidden { .. }));
    assert_eq!(
        directory.list_areas(&seed.requester, seed.cusco).unwrap(),
        vec![cusco_area.clone()]
    );

    let client = directory
        .register_client(
            &seed.cusco_admin,
            &ClientRegistration {
                site_id: seed.cusco,
                area_id: Some(cusco_area.id),
                name: "Textil Andina".to_string(),
                tax_id: "20 444 555 666".to_string(),
                service_kind: Some("Corporativo".to_string()),
                status: Some("activo".to_string()),
            },
        )
        .unwrap();
    assert_eq!(client.tax_id, "20444555666");
    assert_eq!(store.get_client(client.id).unwrap(), Some(client.clone()));
    assert_eq!(store.get_client(Uuid::new_v4()).unwrap(), None);

    let mismatched_area = directory
        .register_client(
            &seed.central,
            &ClientRegistration {
                site_id: seed.lima,
                area_id: Some(cusco_area.id),
                name: "Cruzado".to_string(),
                tax_id: "20111111111".to_string(),
                ..ClientRegistration::default()
            },
        )
        .unwrap_err();
    assert!(matches!(mismatched_area, ServiceError::Repo(_)));

    let cusco_clients = directory.list_clients(&seed.cusco_admin, None).unwrap();
    assert_eq!(cusco_clients, vec![client]);
    assert_eq!(directory.list_clients(&seed.central, None).unwrap().len(), 2);

    let err = directory.list_clients(&seed.requester, None).unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { .. }));
}
