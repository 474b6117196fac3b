//! Migration: Create Join Table People Cars
//! Version: 20230331063809
//! Description: Link table between people and cars, named cars_people

use crate::migration::{Migration, SchemaManager};

pub struct CreateJoinTablePeopleCars;

impl Migration for CreateJoinTablePeopleCars {
    fn name(&self) -> &str {
        "create_join_table_people_cars"
    }

    fn version(&self) -> i64 {
        20230331063809
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.create_join_table("people", "cars", |t| {
            // One link per pair
            t.index(&["person_id", "car_id"]).unique();
        });
    }
}
