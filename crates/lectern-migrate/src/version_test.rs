use super::*;
use crate::connection::AppDb;

#[test]
fn read_fresh_database_is_initial() {
    let db = AppDb::open_memory().unwrap();
    assert_eq!(read_version(db.conn()).unwrap(), SchemaVersion::INITIAL);
}

#[test]
fn read_meta_table_without_row_is_initial() {
    let db = AppDb::open_memory().unwrap();
    db.conn().execute_batch(ENSURE_META_TABLE).unwrap();
    db.conn()
        .execute_batch("INSERT INTO app_meta VALUES ('theme', 'light')")
        .unwrap();
    assert_eq!(read_version(db.conn()).unwrap(), SchemaVersion::INITIAL);
}

#[test]
fn write_then_read_round_trips() {
    let db = AppDb::open_memory().unwrap();
    db.transaction(|tx| write_version(tx, SchemaVersion::new(1)))
        .unwrap();
    db.transaction(|tx| write_version(tx, SchemaVersion::new(4)))
        .unwrap();
    assert_eq!(read_version(db.conn()).unwrap(), SchemaVersion::new(4));

    let rows: i64 = db
        .conn()
        .query_row("SELECT COUNT(*) FROM app_meta", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1, "version is a single upserted row");
}

#[test]
fn write_rejects_regression_and_repeat() {
    let db = AppDb::open_memory().unwrap();
    db.transaction(|tx| write_version(tx, SchemaVersion::new(3)))
        .unwrap();

    let err = db
        .transaction(|tx| write_version(tx, SchemaVersion::new(2)))
        .unwrap_err();
    assert!(matches!(err, MigrateError::VersionRegression { .. }));

    let err = db
        .transaction(|tx| write_version(tx, SchemaVersion::new(3)))
        .unwrap_err();
    assert!(matches!(err, MigrateError::VersionRegression { .. }));

    assert_eq!(read_version(db.conn()).unwrap(), SchemaVersion::new(3));
}

#[test]
fn write_is_undone_with_its_transaction() {
    let db = AppDb::open_memory().unwrap();
    let result = db.transaction(|tx| {
        write_version(tx, SchemaVersion::new(1))?;
        tx.execute_batch("ALTER TABLE missing ADD COLUMN x INTEGER")
    });
    assert!(result.is_err());
    assert_eq!(read_version(db.conn()).unwrap(), SchemaVersion::INITIAL);
}

#[test]
fn read_rejects_non_numeric_value() {
    let db = AppDb::open_memory().unwrap();
    db.conn().execute_batch(ENSURE_META_TABLE).unwrap();
    db.conn()
        .execute_batch("INSERT INTO app_meta VALUES ('schema_version', 'two')")
        .unwrap();
    let err = read_version(db.conn()).unwrap_err();
    assert!(matches!(err, MigrateError::CorruptSchemaVersion { ref value } if value == "two"));
}
