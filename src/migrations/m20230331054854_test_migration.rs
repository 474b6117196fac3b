//! Migration: Test Migration
//! Version: 20230331054854
//! Description: Creates cars and people, with a plain index on people.name and a unique index on people.email

use crate::migration::{Migration, SchemaManager};

pub struct TestMigration;

impl Migration for TestMigration {
    fn name(&self) -> &str {
        "test_migration"
    }

    fn version(&self) -> i64 {
        20230331054854
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.create_table("cars", |t| {
            t.string("name");
        });

        manager.create_table("people", |t| {
            t.string("name").index();
            t.string("email").unique_index("unique_emails");
        });
    }
}
