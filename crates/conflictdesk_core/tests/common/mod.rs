#![allow(dead_code)]

use conflictdesk_core::model::site::Site;
use conflictdesk_core::model::SiteId;
use conflictdesk_core::{AppRole, ClientRegistration, DirectoryService, Session, SqliteStore};
use rusqlite::Connection;

/// Directory shared by the service tests.
///
/// Two sites, one central admin, one site admin per site and two requesters
/// in Lima. One current client is registered in Lima.
pub struct Seed {
    pub central: Session,
    pub lima: SiteId,
    pub cusco: SiteId,
    pub lima_admin: Session,
    pub cusco_admin: Session,
    pub requester: Session,
    pub colleague: Session,
}

pub const CLIENT_NAME: &str = "Pesquera Del Sur S.A.C.";
pub const CLIENT_TAX_ID: &str = "20100200300";

pub fn seed(store: SqliteStore<'_>) -> Seed {
    let directory = DirectoryService::new(store);
    let central = directory
        .bootstrap_central_admin("Central Admin", "central@firm.pe")
        .unwrap();
    let central = Session::new(central.id);

    let lima = directory
        .create_site(&central, &Site::new("Lima", "lima@firm.pe", None))
        .unwrap()
        .id;
    let cusco = directory
        .create_site(&central, &Site::new("Cusco", "cusco@firm.pe", None))
        .unwrap()
        .id;

    let user = |name: &str, email: &str, role: AppRole, site: SiteId| {
        let created = directory
            .register_user(&central, name, email, role, Some(site))
            .unwrap();
        Session::new(created.id)
    };
    let lima_admin = user("Lima Admin", "admin.lima@firm.pe", AppRole::SiteAdmin, lima);
    let cusco_admin = user("Cusco Admin", "admin.cusco@firm.pe", AppRole::SiteAdmin, cusco);
    let requester = user("Rosa Quispe", "rosa@firm.pe", AppRole::StandardUser, lima);
    let colleague = user("Mario Rojas", "mario@firm.pe", AppRole::StandardUser, lima);

    directory
        .register_client(
            &central,
            &ClientRegistration {
                site_id: lima,
                name: CLIENT_NAME.to_string(),
                tax_id: "20-100-200-300".to_string(),
                ..ClientRegistration::default()
            },
        )
        .unwrap();

    Seed {
        central,
        lima,
        cusco,
        lima_admin,
        cusco_admin,
        requester,
        colleague,
    }
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
