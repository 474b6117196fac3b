//! `ActiveModel` operations for typed records.
//!
//! This module provides the traits every record type implements to be
//! validated, persisted, loaded and destroyed through a
//! [`ShelfExecutor`](crate::ShelfExecutor).
//!
//! # Architecture
//!
//! - **Traits**: `ActiveModelTrait` (row mapping, validation, CRUD) and
//!   `ActiveModelBehavior` (lifecycle hooks)
//! - **Error**: `ActiveModelError`, keeping validation failures apart from
//!   storage failures
//!
//! # Examples
//!
//! ```no_run
//! use shelfwise::models::User;
//! use shelfwise::{ActiveModelTrait, MemoryStore};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), shelfwise::ActiveModelError> {
//! let store = MemoryStore::new();
//! let user = User::create(&store, json!({ "name": "Ada", "occupation": "engineer" }))?;
//! User::destroy(&store, user.id.unwrap_or_default())?;
//! # Ok(())
//! # }
//! ```

// Core traits
pub mod traits;
#[doc(inline)]
pub use traits::{ActiveModelBehavior, ActiveModelTrait};

// Error types
pub mod error;
#[doc(inline)]
pub use error::ActiveModelError;
