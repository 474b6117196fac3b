//! Migration: Create Addresses
//! Version: 20230427084023
//! Description: Addresses, each owned by exactly one person

use crate::migration::{Migration, SchemaManager};

pub struct CreateAddresses;

impl Migration for CreateAddresses {
    fn name(&self) -> &str {
        "create_addresses"
    }

    fn version(&self) -> i64 {
        20230427084023
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.create_table("addresses", |t| {
            t.string("name");
            t.references("person", "people").not_null().foreign_key();
            t.timestamps();
        });
    }
}
