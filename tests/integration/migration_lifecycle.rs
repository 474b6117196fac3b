//! Integration tests for the migration lifecycle
//!
//! Runs the application migrations against a store, checks the state
//! table, rollbacks, schema dumps and snapshot round trips.

use shelfwise::migration::{
    query_applied_migrations, startup_migrations, Migration, MigrationError, MigrationRegistry,
    Migrator, SchemaManager, DEFAULT_STATE_TABLE,
};
use shelfwise::models::Book;
use shelfwise::schema::SchemaFormat;
use shelfwise::{ActiveModelTrait, MemoryStore, ShelfExecutor};

fn migrator() -> Migrator {
    Migrator::new(shelfwise::migrations::registry().unwrap())
}

#[test]
fn test_up_records_every_version_once() {
    let store = MemoryStore::new();
    assert_eq!(migrator().up(&store, None).unwrap(), 9);
    assert_eq!(migrator().up(&store, None).unwrap(), 0);

    let applied = query_applied_migrations(&store, DEFAULT_STATE_TABLE).unwrap();
    let versions: Vec<i64> = applied.iter().map(|r| r.version).collect();
    assert_eq!(versions, migrator().registry().versions());
    assert!(applied.iter().all(|r| r.checksum.len() == 64));
}

#[test]
fn test_stepwise_up_matches_full_up() {
    let stepwise = MemoryStore::new();
    while migrator().up(&stepwise, Some(1)).unwrap() > 0 {}

    let full = MemoryStore::new();
    migrator().up(&full, None).unwrap();

    assert_eq!(stepwise.schema().unwrap(), full.schema().unwrap());
}

#[test]
fn test_dump_is_idempotent() {
    let store = MemoryStore::new();
    let migrator = migrator();
    migrator.up(&store, None).unwrap();

    for format in [SchemaFormat::Sql, SchemaFormat::Json] {
        let first = migrator.dump_schema(&store, format).unwrap();
        let second = migrator.dump_schema(&store, format).unwrap();
        assert_eq!(first, second);
    }

    let sql = migrator.dump_schema(&store, SchemaFormat::Sql).unwrap();
    assert!(sql.contains("cars_people"));
    assert!(sql.contains("unique_emails"));
    assert!(!sql.contains(DEFAULT_STATE_TABLE));
}

#[test]
fn test_snapshot_round_trip_keeps_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shelfwise.json");

    let store = MemoryStore::new();
    startup_migrations(&store, shelfwise::migrations::registry().unwrap()).unwrap();
    Book::new("Middlemarch").save_strict(&store).unwrap();
    store.save(&path).unwrap();

    let reopened = MemoryStore::open(&path).unwrap();
    assert_eq!(reopened.database().unwrap(), store.database().unwrap());
    assert!(migrator().status(&reopened).unwrap().is_up_to_date());

    // Uniqueness still sees the stored book
    assert!(!Book::new("Middlemarch").save(&reopened).unwrap());
}

#[test]
fn test_rollback_recreates_dropped_tables_empty() {
    let store = MemoryStore::new();
    let migrator = migrator();
    migrator.up(&store, None).unwrap();
    Book::new("Middlemarch").save_strict(&store).unwrap();

    // addresses, users, books
    assert_eq!(migrator.down(&store, Some(3)).unwrap(), 3);
    assert!(!store.schema().unwrap().has_table("books"));

    migrator.up(&store, None).unwrap();
    assert!(Book::all(&store).unwrap().is_empty());
}

struct AddIsbnIndex;

impl Migration for AddIsbnIndex {
    fn name(&self) -> &str {
        "add_isbn_index"
    }

    fn version(&self) -> i64 {
        20230501000000
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.add_index("books", &["isbn"]).unique();
    }
}

#[test]
fn test_failed_migration_leaves_store_untouched() {
    let store = MemoryStore::new();
    migrator().up(&store, None).unwrap();
    for name in ["Emma", "Dune"] {
        let mut book = Book::new(name);
        book.isbn = Some("0000".to_string());
        book.save_strict(&store).unwrap();
    }
    let before = store.database().unwrap();

    let mut registry = shelfwise::migrations::registry().unwrap();
    registry.register(Box::new(AddIsbnIndex)).unwrap();
    let err = Migrator::new(registry).up(&store, None).unwrap_err();
    assert!(matches!(err, MigrationError::ExecutionFailed { version: 20230501000000, .. }));
    assert_eq!(store.database().unwrap(), before);
}

#[test]
fn test_duplicate_version_is_rejected() {
    let err = MigrationRegistry::new()
        .with(AddIsbnIndex)
        .unwrap()
        .with(AddIsbnIndex)
        .unwrap_err();
    assert!(matches!(err, MigrationError::AlreadyRegistered { version: 20230501000000, .. }));
}
