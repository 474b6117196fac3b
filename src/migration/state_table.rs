//! Migration state table management

use crate::executor::{ShelfError, ShelfExecutor};
use crate::migration::{MigrationError, MigrationRecord};
use crate::query::Filter;
use crate::schema::{ColumnDef, ColumnType, IndexDef, SchemaOp, TableDef};

/// Default name of the state table
pub const DEFAULT_STATE_TABLE: &str = "schema_migrations";

/// Definition of the migration state tracking table
///
/// This table stores metadata about applied migrations:
/// - Version (timestamp, unique)
/// - Name (human-readable)
/// - Checksum (SHA-256 of the migration's operations)
/// - Applied timestamp
/// - Execution time
#[must_use]
pub fn state_table_definition(name: &str) -> TableDef {
    let mut table = TableDef::new(name);
    let mut version = ColumnDef::new("version", ColumnType::BigInteger);
    version.not_null();
    let mut migration_name = ColumnDef::new("name", ColumnType::String);
    migration_name.not_null();
    let mut checksum = ColumnDef::new("checksum", ColumnType::String);
    checksum.not_null();
    let mut applied_at = ColumnDef::new("applied_at", ColumnType::DateTime);
    applied_at.not_null();
    table.columns = vec![
        version,
        migration_name,
        checksum,
        applied_at,
        ColumnDef::new("execution_time_ms", ColumnType::BigInteger),
    ];
    let mut unique_version = IndexDef::new(name, &["version"]);
    unique_version.unique();
    table.indexes.push(unique_version);
    table
}

/// Create the state table if it does not exist yet
///
/// # Errors
///
/// Returns `MigrationError::Storage` if the table cannot be created.
pub fn initialize_state_table(executor: &dyn ShelfExecutor, name: &str) -> Result<(), MigrationError> {
    if executor.schema()?.has_table(name) {
        return Ok(());
    }
    log::debug!("Creating migration state table {name}");
    executor.apply_schema_op(&SchemaOp::CreateTable {
        table: state_table_definition(name),
    })?;
    Ok(())
}

/// Applied migrations, ascending by version; empty if the table does not exist
///
/// # Errors
///
/// Returns `MigrationError` if the table cannot be read or a row is malformed.
pub fn query_applied_migrations(
    executor: &dyn ShelfExecutor,
    name: &str,
) -> Result<Vec<MigrationRecord>, MigrationError> {
    let rows = match executor.select(name, &Filter::all()) {
        Ok(rows) => rows,
        Err(ShelfError::UnknownTable(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut records = rows
        .iter()
        .map(MigrationRecord::from_row)
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by_key(|r| r.version);
    Ok(records)
}

/// Record a migration in the state table
///
/// # Errors
///
/// Returns `ShelfError` if the insert fails (for example a duplicate version).
pub fn record_migration(
    executor: &dyn ShelfExecutor,
    name: &str,
    record: &MigrationRecord,
) -> Result<(), ShelfError> {
    executor.insert(name, record.to_row()).map(|_| ())
}

/// Remove a migration record from the state table
///
/// # Errors
///
/// Returns `ShelfError` if the delete fails.
pub fn remove_migration_record(
    executor: &dyn ShelfExecutor,
    name: &str,
    version: i64,
) -> Result<(), ShelfError> {
    executor.delete(name, &Filter::eq("version", version)).map(|_| ())
}
