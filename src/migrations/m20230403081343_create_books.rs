//! Migration: Create Books
//! Version: 20230403081343
//! Description: Books, optionally shelved in a library

use crate::migration::{Migration, SchemaManager};

pub struct CreateBooks;

impl Migration for CreateBooks {
    fn name(&self) -> &str {
        "create_books"
    }

    fn version(&self) -> i64 {
        20230403081343
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.create_table("books", |t| {
            t.string("name");
            t.string("isbn");
            t.decimal("price", 5, 2);
            t.references("library", "libraries").foreign_key();
            t.timestamps();
        });
    }
}
