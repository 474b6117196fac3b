//! Migration: Create Users
//! Version: 20230403090000

use crate::migration::{Migration, SchemaManager};

pub struct CreateUsers;

impl Migration for CreateUsers {
    fn name(&self) -> &str {
        "create_users"
    }

    fn version(&self) -> i64 {
        20230403090000
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.create_table("users", |t| {
            t.string("name");
            t.string("occupation");
            t.timestamps();
        });
    }
}
