//! # Shelfwise
//!
//! A bookstore/employee record engine: an ordered migration history builds a
//! relational schema in an in-memory store, and typed records are validated
//! against declarative rules before they are persisted.
//!
//! - [`schema`]: table definitions, schema change operations and dumps
//! - [`store`]: the in-memory store enforcing unique, not-null and foreign key constraints
//! - [`migration`]: reversible migrations, the `schema_migrations` state table and the [`Migrator`](migration::Migrator)
//! - [`validation`] and [`active_model`]: rules, messages and CRUD for typed records
//! - [`models`] and [`migrations`]: the application's records and migration history

pub mod active_model;
pub mod config;
pub mod executor;
pub mod migration;
pub mod migrations;
pub mod models;
pub mod query;
pub mod schema;
pub mod store;
pub mod transaction;
pub mod validation;
pub mod value;

#[cfg(feature = "tracing")]
mod tracing_helpers;

pub use active_model::{ActiveModelBehavior, ActiveModelError, ActiveModelTrait};
pub use config::ShelfConfig;
pub use executor::{ConstraintViolation, ShelfError, ShelfExecutor};
pub use store::{MemoryStore, Row, RowError};
pub use transaction::Transaction;
pub use validation::{ValidationErrors, ValidationFailure};
