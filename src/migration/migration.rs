//! Migration trait definition

use super::schema_manager::SchemaManager;
use crate::schema::SchemaOp;

/// Trait that all migrations must implement
///
/// A migration describes its forward change once, in `change()`. Rolling
/// back replays the inverse of each recorded operation in reverse order, so
/// there is no separate `down()`; operations whose inverse cannot be derived
/// (such as removing a column without its type) make the migration
/// irreversible.
pub trait Migration: Send + Sync {
    /// Get the migration name (human-readable identifier)
    fn name(&self) -> &str;

    /// Get the migration version (timestamp: YYYYMMDDHHMMSS)
    fn version(&self) -> i64;

    /// Describe the forward change
    fn change(&self, manager: &mut SchemaManager);

    /// [`change`](Self::change) recorded into a fresh manager
    fn script(&self) -> SchemaManager {
        let mut manager = SchemaManager::new();
        self.change(&mut manager);
        manager
    }

    /// The recorded operations of [`change`](Self::change), in order
    fn operations(&self) -> Vec<SchemaOp> {
        self.script().into_operations()
    }

    /// Identifier in file-name form: `m{version}_{name}`
    fn identifier(&self) -> String {
        format!("m{}_{}", self.version(), self.name())
    }
}
