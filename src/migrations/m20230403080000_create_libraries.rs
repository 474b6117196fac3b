//! Migration: Create Libraries
//! Version: 20230403080000
//! Description: Libraries referenced by books.library_id

use crate::migration::{Migration, SchemaManager};

pub struct CreateLibraries;

impl Migration for CreateLibraries {
    fn name(&self) -> &str {
        "create_libraries"
    }

    fn version(&self) -> i64 {
        20230403080000
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.create_table("libraries", |t| {
            t.string("name");
            t.timestamps();
        });
    }
}
