//! `MemoryStore` - the shared store behind every executor call.

use crate::executor::{ShelfError, ShelfExecutor};
use crate::query::Filter;
use crate::schema::{Schema, SchemaOp};
use crate::store::{snapshot, Database, Row};
use crate::transaction::{StateCell, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// In-memory store guarded by a mutex
///
/// Every executor call locks the store for its duration, so each call is
/// atomic on its own. Use [`begin`](ShelfExecutor::begin) to group calls; a
/// transaction's commit is refused if the store was written after it began.
///
/// # Examples
///
/// ```no_run
/// use shelfwise::{MemoryStore, ShelfExecutor, ShelfError};
/// use shelfwise::query::Filter;
///
/// # fn main() -> Result<(), ShelfError> {
/// let store = MemoryStore::open("db/shelfwise.json")?;
/// let tx = store.begin()?;
/// tx.delete("addresses", &Filter::eq("person_id", 1i64))?;
/// tx.delete("people", &Filter::id(1))?;
/// tx.commit()?;
/// store.save("db/shelfwise.json")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Generational>,
}

/// The database plus a counter bumped by every successful write
#[derive(Debug, Default)]
struct Generational {
    db: Database,
    generation: u64,
}

impl Generational {
    fn write<T>(&mut self, op: impl FnOnce(&mut Database) -> Result<T, ShelfError>) -> Result<T, ShelfError> {
        let out = op(&mut self.db)?;
        self.generation += 1;
        Ok(out)
    }
}

impl MemoryStore {
    /// An empty store with no tables
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing database
    #[must_use]
    pub fn from_database(db: Database) -> Self {
        Self {
            state: Mutex::new(Generational { db, generation: 0 }),
        }
    }

    /// Load a store from a snapshot file, or start empty if the file does not exist
    ///
    /// # Errors
    ///
    /// Returns `ShelfError` if the file exists but cannot be read or decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ShelfError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No snapshot at {}; starting with an empty store", path.display());
            return Ok(Self::new());
        }
        Self::load(path)
    }

    /// Load a store from a snapshot file
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Io` if the file cannot be read and
    /// `ShelfError::Snapshot` if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ShelfError> {
        let db = snapshot::read(path.as_ref())?;
        log::debug!(
            "Loaded snapshot {} ({} tables)",
            path.as_ref().display(),
            db.schema().tables.len()
        );
        Ok(Self::from_database(db))
    }

    /// Persist the current state as a snapshot file
    ///
    /// # Errors
    ///
    /// Returns `ShelfError` if the snapshot cannot be encoded or written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ShelfError> {
        let guard = self.lock()?;
        snapshot::write(&guard.db, path.as_ref())?;
        log::debug!("Saved snapshot {}", path.as_ref().display());
        Ok(())
    }

    /// A copy of the full current state
    ///
    /// # Errors
    ///
    /// Returns `ShelfError::Other` if the lock is poisoned.
    pub fn database(&self) -> Result<Database, ShelfError> {
        Ok(self.lock()?.db.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Generational>, ShelfError> {
        self.state
            .lock()
            .map_err(|e| ShelfError::Other(format!("Store lock poisoned: {e}")))
    }
}

impl StateCell for MemoryStore {
    fn snapshot(&self) -> Result<(Database, u64), ShelfError> {
        let guard = self.lock()?;
        Ok((guard.db.clone(), guard.generation))
    }

    fn publish(&self, state: Database, generation: u64) -> Result<(), ShelfError> {
        let mut guard = self.lock()?;
        if guard.generation != generation {
            return Err(ShelfError::Conflict { depth: 1 });
        }
        guard.write(|db| {
            *db = state;
            Ok(())
        })
    }

    fn depth(&self) -> u32 {
        0
    }
}

impl ShelfExecutor for MemoryStore {
    fn schema(&self) -> Result<Schema, ShelfError> {
        Ok(self.lock()?.db.schema().clone())
    }

    fn apply_schema_op(&self, op: &SchemaOp) -> Result<(), ShelfError> {
        self.lock()?.write(|db| db.apply_schema_op(op))
    }

    fn insert(&self, table: &str, row: Row) -> Result<i64, ShelfError> {
        let id = self.lock()?.write(|db| db.insert(table, row))?;
        log::debug!("INSERT INTO {table} -> id {id}");
        Ok(id)
    }

    fn update(&self, table: &str, id: i64, row: Row) -> Result<u64, ShelfError> {
        let affected = self.lock()?.write(|db| db.update(table, id, row))?;
        log::debug!("UPDATE {table} WHERE id = {id} -> {affected} row(s)");
        Ok(affected)
    }

    fn delete(&self, table: &str, filter: &Filter) -> Result<u64, ShelfError> {
        let affected = self.lock()?.write(|db| db.delete(table, filter))?;
        log::debug!("DELETE FROM {table} -> {affected} row(s)");
        Ok(affected)
    }

    fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ShelfError> {
        self.lock()?.db.select(table, filter)
    }

    fn begin(&self) -> Result<Transaction<'_>, ShelfError> {
        Transaction::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, ColumnType, TableDef};

    fn store_with_cars() -> MemoryStore {
        let store = MemoryStore::new();
        let mut table = TableDef::new("cars");
        table.columns.push(ColumnDef::primary_id());
        table.columns.push(ColumnDef::new("name", ColumnType::String));
        store
            .apply_schema_op(&SchemaOp::CreateTable { table })
            .unwrap();
        store
    }

    #[test]
    fn test_executor_round_trip() {
        let store = store_with_cars();
        let id = store.insert("cars", Row::new().with("name", "Beetle")).unwrap();
        assert_eq!(store.update("cars", id, Row::new().with("name", "Golf")).unwrap(), 1);
        let rows = store.select("cars", &Filter::id(id)).unwrap();
        assert_eq!(rows[0].get_string("name"), Ok(Some("Golf".to_string())));
        assert_eq!(store.delete("cars", &Filter::all()).unwrap(), 1);
        assert!(store.select("cars", &Filter::all()).unwrap().is_empty());
    }

    #[test]
    fn test_store_can_be_shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryStore>();

        let store = store_with_cars();
        std::thread::scope(|s| {
            for name in ["Beetle", "Golf"] {
                let store = &store;
                s.spawn(move || store.insert("cars", Row::new().with("name", name)).unwrap());
            }
        });
        assert_eq!(store.select("cars", &Filter::all()).unwrap().len(), 2);
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.schema().unwrap().tables.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = store_with_cars();
        store.insert("cars", Row::new().with("name", "Beetle")).unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.database().unwrap(), store.database().unwrap());
    }
}
