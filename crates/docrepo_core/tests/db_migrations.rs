use docrepo_core::db::{open_db, open_db_uri, DbError};
use docrepo_core::{DocumentStore, RepoError, StoreConfig};
use rusqlite::Connection;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(1);
const SCHEMA_VERSION: u32 = 2;

#[test]
fn open_db_applies_all_migrations() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("docs.db"), BUSY_TIMEOUT).unwrap();

    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    assert_table_exists(&conn, "documents");
    assert_table_exists(&conn, "identities");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docs.db");

    let conn_first = open_db(&path, BUSY_TIMEOUT).unwrap();
    assert_eq!(schema_version(&conn_first), SCHEMA_VERSION);
    drop(conn_first);

    let conn_second = open_db(&path, BUSY_TIMEOUT).unwrap();
    assert_eq!(schema_version(&conn_second), SCHEMA_VERSION);
    assert_table_exists(&conn_second, "documents");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path, BUSY_TIMEOUT).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }

    let store_err = DocumentStore::open(StoreConfig::file(&path)).err().unwrap();
    assert!(matches!(
        store_err,
        RepoError::Db(DbError::UnsupportedSchemaVersion { .. })
    ));
}

#[test]
fn match_functions_are_registered_on_every_connection() {
    let conn = open_db_uri(
        "file:/docrepo-functions-test?vfs=memdb",
        BUSY_TIMEOUT,
    )
    .unwrap();

    let matched: bool = conn
        .query_row(
            "SELECT doc_equals(?1, 'name', '\"ANN\"', NULL);",
            [r#"{"name": "ann"}"#],
            |row| row.get(0),
        )
        .unwrap();
    assert!(matched);

    let searched: bool = conn
        .query_row(
            "SELECT doc_search(?1, 'name', 'smi*');",
            [r#"{"name": "Ann Smith"}"#],
            |row| row.get(0),
        )
        .unwrap();
    assert!(searched);

    let near: bool = conn
        .query_row(
            "SELECT doc_within_radius(?1, 'lat', 'lon', 48.8566, 2.3522, 1.0);",
            [r#"{"lat": 48.8566, "lon": 2.3522}"#],
            |row| row.get(0),
        )
        .unwrap();
    assert!(near);
}

#[test]
fn zero_default_page_size_is_rejected() {
    let err = DocumentStore::open(StoreConfig::in_memory().with_default_page_size(0))
        .err()
        .unwrap();
    assert!(matches!(err, RepoError::InvalidArgument(_)));
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
