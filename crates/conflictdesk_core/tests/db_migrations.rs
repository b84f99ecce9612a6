use conflictdesk_core::db::migrations::latest_version;
use conflictdesk_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

const TABLES: [&str; 9] = [
    "sedes",
    "areas",
    "usuarios",
    "user_roles",
    "clientes_actuales",
    "consultas",
    "respuestas",
    "notificaciones",
    "auditoria",
];

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in TABLES {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conflictdesk.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO sedes (id, nombre_sede, correo_contacto) VALUES ('s1', 'Lima', 'lima@firm.pe');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let sites: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM sedes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(sites, 1);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn enumerated_columns_reject_unknown_values() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO usuarios (id, nombre_usuario, correo_electronico, rol)
         VALUES ('u1', 'Ana', 'ana@firm.pe', 'superuser');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn fold_case_lowercases_unicode_text() {
    let conn = open_db_in_memory().unwrap();
    let folded: String = conn
        .query_row("SELECT fold_case('ÁLVAREZ & Núñez');", [], |row| row.get(0))
        .unwrap();
    assert_eq!(folded, "álvarez & núñez");

    let null: Option<String> = conn
        .query_row("SELECT fold_case(NULL);", [], |row| row.get(0))
        .unwrap();
    assert_eq!(null, None);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
