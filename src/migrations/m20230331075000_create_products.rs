//! Migration: Create Products
//! Version: 20230331075000
//! Description: Products table, reshaped by change_table_products

use crate::migration::{Migration, SchemaManager};

pub struct CreateProducts;

impl Migration for CreateProducts {
    fn name(&self) -> &str {
        "create_products"
    }

    fn version(&self) -> i64 {
        20230331075000
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.create_table("products", |t| {
            t.string("name");
            t.text("description");
            t.string("upcode");
            t.timestamps();
        });
    }
}
