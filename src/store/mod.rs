//! In-memory tabular store
//!
//! - [`Row`]: one stored row with typed accessors
//! - [`Database`]: schema plus table data, enforcing every storage constraint
//! - [`MemoryStore`]: the shared, lockable store implementing
//!   [`ShelfExecutor`](crate::executor::ShelfExecutor)
//! - [`snapshot`]: JSON persistence used by the migration CLI

pub mod database;
pub mod memory;
pub mod row;
pub mod snapshot;

pub use database::Database;
pub use memory::MemoryStore;
pub use row::{Row, RowError};
