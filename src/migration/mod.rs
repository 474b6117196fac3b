//! Migration system for Shelfwise
//!
//! This module provides the infrastructure for schema migrations, including:
//! - Migration trait definition
//! - SchemaManager for recording schema operations
//! - Migration state tracking in the `schema_migrations` table
//! - Migration execution, rollback and checksum validation
//!
//! A migration only describes its change once. Rolling it back replays the
//! inverse of every recorded operation, so operations that destroy
//! information (dropping a table, removing an untyped column) make the
//! migration irreversible.
//!
//! # Example
//!
//! ```rust,no_run
//! use shelfwise::migration::{Migration, SchemaManager};
//!
//! pub struct CreateBooks;
//!
//! impl Migration for CreateBooks {
//!     fn name(&self) -> &str {
//!         "create_books"
//!     }
//!
//!     fn version(&self) -> i64 {
//!         20230403081343
//!     }
//!
//!     fn change(&self, manager: &mut SchemaManager) {
//!         manager.create_table("books", |t| {
//!             t.string("name").not_null();
//!             t.string("isbn").unique_index("index_books_on_isbn");
//!             t.decimal("price", 5, 2);
//!             t.timestamps();
//!         });
//!     }
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod file;
pub mod migration;
pub mod migrator;
pub mod record;
pub mod registry;
pub mod schema_manager;
pub mod startup;
pub mod state_table;
pub mod status;

pub use checksum::{calculate_checksum, validate_checksum};
pub use error::MigrationError;
pub use file::{discover_migrations, parse_identifier, MigrationFile};
pub use migration::Migration;
pub use migrator::Migrator;
pub use record::MigrationRecord;
pub use registry::MigrationRegistry;
pub use schema_manager::{Announcement, ChangeTable, SchemaManager, TableBuilder};
pub use startup::startup_migrations;
pub use state_table::{
    initialize_state_table, query_applied_migrations, record_migration, remove_migration_record,
    DEFAULT_STATE_TABLE,
};
pub use status::{MigrationStatus, PendingMigration};
