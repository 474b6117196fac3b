//! `ShelfExecutor` - the storage interface consumed by migrations and records.
//!
//! Provides the `ShelfExecutor` trait that abstracts schema changes and row
//! operations over a tabular store, together with the `ShelfError` type every
//! storage-facing operation returns.
//!
//! Both [`MemoryStore`](crate::store::MemoryStore) and
//! [`Transaction`](crate::transaction::Transaction) implement this trait, so the
//! migration engine and the record layer work unchanged inside or outside a
//! transaction.

use crate::query::Filter;
use crate::schema::{Schema, SchemaError, SchemaOp};
use crate::store::Row;
use crate::transaction::Transaction;
use thiserror::Error;

/// A storage-level constraint that rejected a write.
///
/// These are distinct from record validation failures: they are raised by the
/// store itself when a write bypasses (or races past) application validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    /// A unique index already holds the same key
    #[error("duplicate key value violates unique index \"{index}\" on {table} ({})", .columns.join(", "))]
    Unique {
        table: String,
        index: String,
        columns: Vec<String>,
    },
    /// A NOT NULL column received a null value
    #[error("null value in column \"{column}\" of relation \"{table}\" violates not-null constraint")]
    NotNull { table: String, column: String },
    /// A foreign key points at a missing row, or a referenced row is still in use
    #[error("foreign key on {table}.{column} referencing \"{referenced_table}\" is violated")]
    ForeignKey {
        table: String,
        column: String,
        referenced_table: String,
    },
    /// A decimal value does not fit the column's precision
    #[error("numeric field overflow in {table}.{column}")]
    NumericOverflow { table: String, column: String },
}

/// `ShelfExecutor` error type
#[derive(Debug, Error)]
pub enum ShelfError {
    /// Table does not exist in the current schema
    #[error("Unknown table: {0}")]
    UnknownTable(String),
    /// Column does not exist on the table
    #[error("Unknown column {column} on table {table}")]
    UnknownColumn { table: String, column: String },
    /// A schema change could not be applied
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    /// A storage constraint rejected the write
    #[error("Constraint violation: {0}")]
    Constraint(#[from] ConstraintViolation),
    /// A value does not match the column type
    #[error("Type mismatch for {table}.{column}: expected {expected}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
    },
    /// Transaction already committed or rolled back
    #[error("Transaction has already been committed or rolled back")]
    TransactionClosed,
    /// The parent was written after the transaction began; commit refused
    #[error("Transaction (depth {depth}) conflicts with writes made to its parent after it began")]
    Conflict { depth: u32 },
    /// Snapshot file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Snapshot contents could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(String),
    /// Other execution errors
    #[error("Execution error: {0}")]
    Other(String),
}

impl ShelfError {
    /// The constraint violation behind this error, if any
    #[must_use]
    pub fn constraint(&self) -> Option<&ConstraintViolation> {
        match self {
            ShelfError::Constraint(violation) => Some(violation),
            _ => None,
        }
    }

    /// Whether this error is a unique index violation
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.constraint(), Some(ConstraintViolation::Unique { .. }))
    }
}

/// Trait for executing storage operations
///
/// This trait abstracts storage execution, allowing different implementations
/// (the store itself, an open transaction) to be used interchangeably.
///
/// # Examples
///
/// ```no_run
/// use shelfwise::{MemoryStore, ShelfExecutor, ShelfError};
/// use shelfwise::query::Filter;
///
/// # fn main() -> Result<(), ShelfError> {
/// let store = MemoryStore::new();
/// let rows = store.select("books", &Filter::eq("name", "Dune"))?;
/// println!("{} matching books", rows.len());
/// # Ok(())
/// # }
/// ```
pub trait ShelfExecutor {
    /// Snapshot of the current schema
    ///
    /// # Errors
    ///
    /// Returns `ShelfError` if the store cannot be read.
    fn schema(&self) -> Result<Schema, ShelfError>;

    /// Apply one schema change, migrating existing rows with it
    ///
    /// The change is all-or-nothing: on error neither the schema nor the data
    /// is modified.
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Schema` for invalid changes and
    /// `ShelfError::Constraint` when existing data violates a new constraint.
    fn apply_schema_op(&self, op: &SchemaOp) -> Result<(), ShelfError>;

    /// Insert a row and return its id
    ///
    /// Tables without an `id` column return `0`.
    ///
    /// # Errors
    ///
    /// Returns `ShelfError` if the table/columns are unknown or a constraint fails.
    fn insert(&self, table: &str, row: Row) -> Result<i64, ShelfError>;

    /// Overwrite the given columns of the row with this id
    ///
    /// Returns the number of rows affected (`0` or `1`).
    ///
    /// # Errors
    ///
    /// Returns `ShelfError` if the table/columns are unknown or a constraint fails.
    fn update(&self, table: &str, id: i64, row: Row) -> Result<u64, ShelfError>;

    /// Delete every row matching the filter
    ///
    /// Returns the number of rows deleted from `table` (cascaded rows are not counted).
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Constraint` if a restricting foreign key still
    /// references a matched row.
    fn delete(&self, table: &str, filter: &Filter) -> Result<u64, ShelfError>;

    /// Select every row matching the filter, ordered by id
    ///
    /// # Errors
    ///
    /// Returns `ShelfError` if the table or a filtered column is unknown.
    fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ShelfError>;

    /// Start a transaction over this executor
    ///
    /// On a store this opens a top-level transaction; on a transaction it
    /// opens a nested one (a savepoint) whose commit publishes into its parent.
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::TransactionClosed` if this executor is a closed transaction.
    fn begin(&self) -> Result<Transaction<'_>, ShelfError>;
}
