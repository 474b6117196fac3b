//! Migration: Create Employees
//! Version: 20230401063627
//! Description: Employees table with an index on name

use crate::migration::{Migration, SchemaManager};

pub struct CreateEmployees;

impl Migration for CreateEmployees {
    fn name(&self) -> &str {
        "create_employees"
    }

    fn version(&self) -> i64 {
        20230401063627
    }

    fn change(&self, manager: &mut SchemaManager) {
        manager.create_table("employees", |t| {
            t.string("name");
            t.string("designation");
            t.timestamps();
        });

        manager.say("Created Employees Table");

        manager.suppress_messages(|m| {
            m.add_index("employees", &["name"]);
        });
        manager.say_subitem("add_an_index");

        manager.say_with_time("waiting", |_| {});
    }
}
