//! Transaction Module
//!
//! Snapshot transactions over a [`MemoryStore`](crate::store::MemoryStore).
//!
//! This module provides:
//! - `Transaction` type that implements `ShelfExecutor`
//! - Nested transaction support (a transaction over a transaction)
//! - Commit/rollback operations, with rollback on drop
//!
//! A transaction works on a private copy of its parent's state. Commit
//! publishes the copy back in one step; rollback (or dropping the transaction)
//! discards it. Every successful write bumps the parent's generation; commit
//! fails with `ShelfError::Conflict` if the parent's generation moved since
//! `begin`, so writes made to the parent meanwhile are never overwritten.

use crate::executor::{ShelfError, ShelfExecutor};
use crate::query::Filter;
use crate::schema::{Schema, SchemaOp};
use crate::store::{Database, Row};
use std::cell::{Cell, RefCell};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Something a transaction can copy state from and publish state into
pub(crate) trait StateCell {
    /// The current state and the generation it was read at
    fn snapshot(&self) -> Result<(Database, u64), ShelfError>;
    /// Replace the state, unless it was written after `generation`
    fn publish(&self, state: Database, generation: u64) -> Result<(), ShelfError>;
    fn depth(&self) -> u32;
}

/// A store transaction
///
/// All operations within a transaction are either committed together or
/// rolled back together.
///
/// # Examples
///
/// ```no_run
/// use shelfwise::{MemoryStore, ShelfExecutor, ShelfError, Row};
///
/// # fn main() -> Result<(), ShelfError> {
/// let store = MemoryStore::new();
///
/// // Start a transaction
/// let transaction = store.begin()?;
///
/// // Perform operations within the transaction
/// transaction.insert("cars", Row::new().with("name", "Beetle"))?;
///
/// // Commit the transaction
/// transaction.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'a> {
    parent: &'a dyn StateCell,
    base_generation: u64,
    working: RefCell<Database>,
    generation: Cell<u64>,
    depth: u32,
    closed: Cell<bool>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(parent: &'a dyn StateCell) -> Result<Self, ShelfError> {
        let depth = parent.depth() + 1;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::begin_transaction_span(depth).entered();

        let (working, base_generation) = parent.snapshot()?;
        log::trace!("BEGIN (depth {depth})");
        Ok(Self {
            parent,
            base_generation,
            working: RefCell::new(working),
            generation: Cell::new(0),
            depth,
            closed: Cell::new(false),
        })
    }

    /// Start a nested transaction
    ///
    /// Committing the nested transaction publishes into this one; rolling it
    /// back leaves this one untouched.
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::TransactionClosed` if this transaction is closed.
    pub fn begin_nested(&self) -> Result<Transaction<'_>, ShelfError> {
        self.ensure_open()?;
        Transaction::new(self)
    }

    /// Commit the transaction
    ///
    /// All changes made within the transaction are published to the parent.
    /// After committing, the transaction is closed.
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Conflict` if the parent was written after this
    /// transaction began (the transaction is then rolled back), or another
    /// error if it has already been closed.
    pub fn commit(self) -> Result<(), ShelfError> {
        self.ensure_open()?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::commit_transaction_span(self.depth).entered();

        let state = self.working.take();
        if let Err(e) = self.parent.publish(state, self.base_generation) {
            log::warn!("COMMIT (depth {}) refused: {e}", self.depth);
            self.closed.set(true);
            return Err(e);
        }
        self.closed.set(true);
        log::trace!("COMMIT (depth {})", self.depth);
        Ok(())
    }

    /// Roll back the transaction
    ///
    /// All changes made within the transaction are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction has already been closed.
    pub fn rollback(self) -> Result<(), ShelfError> {
        self.ensure_open()?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::rollback_transaction_span(self.depth).entered();

        self.closed.set(true);
        log::trace!("ROLLBACK (depth {})", self.depth);
        Ok(())
    }

    /// Nesting depth; `1` for a transaction opened directly on a store
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Check if the transaction is closed
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn ensure_open(&self) -> Result<(), ShelfError> {
        if self.closed.get() {
            return Err(ShelfError::TransactionClosed);
        }
        Ok(())
    }

    fn wrote<T>(&self, result: Result<T, ShelfError>) -> Result<T, ShelfError> {
        if result.is_ok() {
            self.generation.set(self.generation.get() + 1);
        }
        result
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.closed.get() {
            log::debug!("Transaction (depth {}) dropped without commit; rolled back", self.depth);
        }
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("depth", &self.depth)
            .field("closed", &self.closed.get())
            .finish_non_exhaustive()
    }
}

impl StateCell for Transaction<'_> {
    fn snapshot(&self) -> Result<(Database, u64), ShelfError> {
        self.ensure_open()?;
        Ok((self.working.borrow().clone(), self.generation.get()))
    }

    fn publish(&self, state: Database, generation: u64) -> Result<(), ShelfError> {
        self.ensure_open()?;
        if self.generation.get() != generation {
            return Err(ShelfError::Conflict { depth: self.depth + 1 });
        }
        *self.working.borrow_mut() = state;
        self.generation.set(generation + 1);
        Ok(())
    }

    fn depth(&self) -> u32 {
        self.depth
    }
}

impl ShelfExecutor for Transaction<'_> {
    fn schema(&self) -> Result<Schema, ShelfError> {
        self.ensure_open()?;
        Ok(self.working.borrow().schema().clone())
    }

    fn apply_schema_op(&self, op: &SchemaOp) -> Result<(), ShelfError> {
        self.ensure_open()?;
        let result = self.working.borrow_mut().apply_schema_op(op);
        self.wrote(result)
    }

    fn insert(&self, table: &str, row: Row) -> Result<i64, ShelfError> {
        self.ensure_open()?;
        let result = self.working.borrow_mut().insert(table, row);
        let id = self.wrote(result)?;
        log::debug!("INSERT INTO {table} -> id {id} (depth {})", self.depth);
        Ok(id)
    }

    fn update(&self, table: &str, id: i64, row: Row) -> Result<u64, ShelfError> {
        self.ensure_open()?;
        let result = self.working.borrow_mut().update(table, id, row);
        let affected = self.wrote(result)?;
        log::debug!("UPDATE {table} WHERE id = {id} -> {affected} row(s) (depth {})", self.depth);
        Ok(affected)
    }

    fn delete(&self, table: &str, filter: &Filter) -> Result<u64, ShelfError> {
        self.ensure_open()?;
        let result = self.working.borrow_mut().delete(table, filter);
        let affected = self.wrote(result)?;
        log::debug!("DELETE FROM {table} -> {affected} row(s) (depth {})", self.depth);
        Ok(affected)
    }

    fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ShelfError> {
        self.ensure_open()?;
        self.working.borrow().select(table, filter)
    }

    fn begin(&self) -> Result<Transaction<'_>, ShelfError> {
        self.begin_nested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, ColumnType, TableDef};
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        let mut table = TableDef::new("cars");
        table.columns.push(ColumnDef::primary_id());
        table.columns.push(ColumnDef::new("name", ColumnType::String));
        store
            .apply_schema_op(&SchemaOp::CreateTable { table })
            .unwrap();
        store
    }

    fn count(executor: &dyn ShelfExecutor) -> usize {
        executor.select("cars", &Filter::all()).unwrap().len()
    }

    #[test]
    fn test_commit_publishes_changes() {
        let store = store();
        let tx = store.begin().unwrap();
        tx.insert("cars", Row::new().with("name", "Beetle")).unwrap();
        assert_eq!(count(&tx), 1);
        assert_eq!(count(&store), 0);
        tx.commit().unwrap();
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_rollback_and_drop_discard_changes() {
        let store = store();
        let tx = store.begin().unwrap();
        tx.insert("cars", Row::new().with("name", "Beetle")).unwrap();
        tx.rollback().unwrap();
        assert_eq!(count(&store), 0);

        {
            let tx = store.begin().unwrap();
            tx.insert("cars", Row::new().with("name", "Golf")).unwrap();
        }
        assert_eq!(count(&store), 0);
    }

    #[test]
    fn test_schema_changes_are_transactional() {
        let store = store();
        let tx = store.begin().unwrap();
        tx.apply_schema_op(&SchemaOp::DropTable {
            table: "cars".to_string(),
            definition: None,
        })
        .unwrap();
        drop(tx);
        assert!(store.schema().unwrap().has_table("cars"));
    }

    #[test]
    fn test_nested_rollback_keeps_outer_changes() {
        let store = store();
        let outer = store.begin().unwrap();
        outer.insert("cars", Row::new().with("name", "Beetle")).unwrap();
        {
            let inner = outer.begin_nested().unwrap();
            assert_eq!(inner.depth(), 2);
            inner.insert("cars", Row::new().with("name", "Golf")).unwrap();
            inner.rollback().unwrap();
        }
        let inner = outer.begin().unwrap();
        inner.insert("cars", Row::new().with("name", "Polo")).unwrap();
        inner.commit().unwrap();
        outer.commit().unwrap();

        let names: Vec<_> = store
            .select("cars", &Filter::all())
            .unwrap()
            .iter()
            .map(|r| r.get_string("name").unwrap().unwrap())
            .collect();
        assert_eq!(names, vec!["Beetle", "Polo"]);
    }

    #[test]
    fn test_commit_refuses_after_parent_write() {
        let store = store();
        let tx = store.begin().unwrap();
        tx.insert("cars", Row::new().with("name", "Golf")).unwrap();
        store.insert("cars", Row::new().with("name", "Beetle")).unwrap();

        assert!(matches!(tx.commit(), Err(ShelfError::Conflict { depth: 1 })));
        let names: Vec<_> = store
            .select("cars", &Filter::all())
            .unwrap()
            .iter()
            .map(|r| r.get_string("name").unwrap().unwrap())
            .collect();
        assert_eq!(names, vec!["Beetle"]);
    }

    #[test]
    fn test_failed_parent_write_does_not_conflict() {
        let store = store();
        let tx = store.begin().unwrap();
        tx.insert("cars", Row::new().with("name", "Golf")).unwrap();
        assert!(store.insert("cars", Row::new().with("colour", "red")).is_err());
        tx.commit().unwrap();
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_nested_commit_refuses_after_outer_write() {
        let store = store();
        let outer = store.begin().unwrap();
        let inner = outer.begin_nested().unwrap();
        inner.insert("cars", Row::new().with("name", "Golf")).unwrap();
        outer.insert("cars", Row::new().with("name", "Beetle")).unwrap();
        assert!(matches!(inner.commit(), Err(ShelfError::Conflict { depth: 2 })));

        outer.commit().unwrap();
        assert_eq!(count(&store), 1);
    }

    #[test]
    fn test_closed_transaction_rejects_use() {
        let store = store();
        let tx = store.begin().unwrap();
        tx.closed.set(true);
        assert!(matches!(
            tx.insert("cars", Row::new()),
            Err(ShelfError::TransactionClosed)
        ));
        assert!(matches!(tx.begin_nested(), Err(ShelfError::TransactionClosed)));
    }
}
