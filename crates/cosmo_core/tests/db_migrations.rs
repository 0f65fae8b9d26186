use cosmo_core::db::migrations::latest_version;
use cosmo_core::db::{open_db, open_db_in_memory, open_db_with, DbError};
use cosmo_core::{ConnectionSettings, Entity, Repository, UnitOfWork};
use rusqlite::Connection;
use std::path::Path;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "planet");
    assert_table_exists(&conn, "star");
    for table in ["planet", "star"] {
        for column in ["created_by", "created_date", "updated_by", "updated_date"] {
            assert!(
                column_names(&conn, table).iter().any(|name| name == column),
                "{table}.{column} is missing"
            );
        }
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cosmo.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "planet");
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
fn version_one_database_is_upgraded_with_audit_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    create_version_one_database(&path);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let (created_by, created_date): (Option<String>, i64) = conn
        .query_row(
            "SELECT created_by, created_date FROM planet WHERE name = 'Venus';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(created_by, None);
    assert_eq!(created_date, 0);
}

#[test]
fn upgraded_rows_without_creator_can_be_updated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    create_version_one_database(&path);

    let uow = UnitOfWork::new(open_db(&path).unwrap()).unwrap();
    let mut venus = uow
        .planets()
        .get_single_or_default(|planet| planet.name.as_deref() == Some("Venus"))
        .unwrap()
        .unwrap();
    assert_eq!(venus.audit.created_by, None);

    venus.diameter = 12103;
    venus.audit.touch_now("admin");
    uow.planets().update(venus.clone()).unwrap();
    assert_eq!(uow.commit().unwrap(), 1);

    let stored = uow.planets().get(venus.id().unwrap()).unwrap().unwrap();
    assert_eq!(stored, venus);
    uow.close().unwrap();

    let conn = Connection::open(&path).unwrap();
    let (created_by, updated_by): (Option<String>, Option<String>) = conn
        .query_row(
            "SELECT created_by, updated_by FROM planet WHERE name = 'Venus';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(created_by, None);
    assert_eq!(updated_by.as_deref(), Some("admin"));
}

#[test]
fn open_db_with_in_memory_settings_is_migrated() {
    let conn = open_db_with(&ConnectionSettings::in_memory()).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
}

fn create_version_one_database(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE planet (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            has_oxygen INTEGER NOT NULL DEFAULT 0,
            diameter INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE star (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            temperature_in_grade_celsius INTEGER NOT NULL DEFAULT 0,
            weight INTEGER NOT NULL DEFAULT 0,
            generates_energy INTEGER NOT NULL DEFAULT 0
        );
        INSERT INTO planet (name, has_oxygen, diameter) VALUES ('Venus', 0, 12104);
        PRAGMA user_version = 1;",
    )
    .unwrap();
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
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
