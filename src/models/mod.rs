//! Record types for the bookstore/employee schema
//!
//! Each struct mirrors one table built by [`crate::migrations`]. Nullable
//! columns are `Option`s; `id` and the timestamps are `None` until the record
//! is first saved.

pub mod address;
pub mod book;
pub mod car;
pub mod employee;
pub mod person;
pub mod user;

pub use address::Address;
pub use book::Book;
pub use car::Car;
pub use employee::Employee;
pub use person::{AddressAttributes, Person};
pub use user::User;

use crate::store::Row;
use chrono::{DateTime, Utc};

/// Row holding `id` when the record has one
fn identified(id: Option<i64>) -> Row {
    let mut row = Row::new();
    if let Some(id) = id {
        row.set("id", id);
    }
    row
}

fn with_timestamps(row: Row, created_at: Option<DateTime<Utc>>, updated_at: Option<DateTime<Utc>>) -> Row {
    row.with("created_at", created_at).with("updated_at", updated_at)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::migration::Migrator;
    use crate::store::MemoryStore;

    /// A store migrated to the latest schema
    pub(crate) fn migrated_store() -> MemoryStore {
        let store = MemoryStore::new();
        Migrator::new(crate::migrations::registry().unwrap())
            .up(&store, None)
            .unwrap();
        store
    }
}
