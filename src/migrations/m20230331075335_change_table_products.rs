//! Migration: Change Table Products
//! Version: 20230331075335
//! Description: Drops description and name, adds an indexed part_number, renames upcode to upc_code
//!
//! `remove` does not record the removed column types, so this migration
//! cannot be rolled back.

use crate::migration::{Migration, SchemaManager};

pub struct ChangeTableProducts;

impl Migration for ChangeTableProducts {
    fn name(&self) -> &str {
        "change_table_products"
    }

    fn version(&self) -> i64 {
        20230331075335
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.change_table("products", |t| {
            t.remove(&["description", "name"]);
            t.string("part_number");
            t.index(&["part_number"]);
            t.rename("upcode", "upc_code");
        });
    }
}
