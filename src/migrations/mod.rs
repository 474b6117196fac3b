//! Application migrations
//!
//! Each file is named `m{version}_{name}.rs` and defines one migration whose
//! `version()` and `name()` match the file name. [`registry`] lists them all.

mod m20230331054854_test_migration;
mod m20230331063809_create_join_table_people_cars;
mod m20230331075000_create_products;
mod m20230331075335_change_table_products;
mod m20230401063627_create_employees;
mod m20230403080000_create_libraries;
mod m20230403081343_create_books;
mod m20230403090000_create_users;
mod m20230427084023_create_addresses;

pub use m20230331054854_test_migration::TestMigration;
pub use m20230331063809_create_join_table_people_cars::CreateJoinTablePeopleCars;
pub use m20230331075000_create_products::CreateProducts;
pub use m20230331075335_change_table_products::ChangeTableProducts;
pub use m20230401063627_create_employees::CreateEmployees;
pub use m20230403080000_create_libraries::CreateLibraries;
pub use m20230403081343_create_books::CreateBooks;
pub use m20230403090000_create_users::CreateUsers;
pub use m20230427084023_create_addresses::CreateAddresses;

use crate::migration::{MigrationError, MigrationRegistry};

/// Every application migration
///
/// # Errors
///
/// Returns `MigrationError` if two migrations share a version.
pub fn registry() -> Result<MigrationRegistry, MigrationError> {
    MigrationRegistry::new()
        .with(TestMigration)?
        .with(CreateJoinTablePeopleCars)?
        .with(CreateProducts)?
        .with(ChangeTableProducts)?
        .with(CreateEmployees)?
        .with(CreateLibraries)?
        .with(CreateBooks)?
        .with(CreateUsers)?
        .with(CreateAddresses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{discover_migrations, Migrator};
    use crate::store::MemoryStore;
    use crate::ShelfExecutor;
    use std::path::Path;

    #[test]
    fn test_file_names_match_registered_migrations() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/migrations");
        let files = discover_migrations(&dir).unwrap();
        let registry = registry().unwrap();

        assert_eq!(files.len(), registry.len());
        for (file, migration) in files.iter().zip(registry.iter()) {
            assert_eq!(file.version, migration.version());
            assert_eq!(file.name, migration.name());
        }
    }

    #[test]
    fn test_employees_announces_progress() {
        use crate::migration::Migration;

        let script = CreateEmployees.script();
        assert_eq!(script.operations().len(), 2);
        assert!(script.is_quiet(1));
        assert_eq!(script.announcements().len(), 4);

        let store = MemoryStore::new();
        let migrator = Migrator::new(MigrationRegistry::new().with(CreateEmployees).unwrap());
        assert_eq!(migrator.up(&store, None).unwrap(), 1);
        let schema = store.schema().unwrap();
        let employees = schema.table("employees").unwrap();
        assert!(employees.index("index_employees_on_name").is_some());
    }

    #[test]
    fn test_final_schema() {
        let store = MemoryStore::new();
        Migrator::new(registry().unwrap()).up(&store, None).unwrap();
        let schema = store.schema().unwrap();

        let people = schema.table("people").unwrap();
        assert!(people.index("unique_emails").is_some_and(|i| i.unique));
        assert!(people.index("index_people_on_name").is_some_and(|i| !i.unique));

        let link = schema.table("cars_people").unwrap();
        assert!(!link.has_id());
        let columns: Vec<&str> = link.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["person_id", "car_id"]);

        let products = schema.table("products").unwrap();
        for gone in ["name", "description", "upcode"] {
            assert!(!products.has_column(gone), "{gone} should be gone");
        }
        assert!(products.has_column("upc_code"));
        assert!(products.index("index_products_on_part_number").is_some());

        let addresses = schema.table("addresses").unwrap();
        assert!(addresses.column("person_id").is_some_and(|c| !c.nullable));
        assert!(addresses.foreign_key("person_id").is_some());

        let books = schema.table("books").unwrap();
        assert!(books.column("library_id").is_some_and(|c| c.nullable));
        assert!(schema.has_table("employees"));
        assert!(schema.has_table("users"));
    }

    #[test]
    fn test_rollback_stops_at_change_table_products() {
        let store = MemoryStore::new();
        let migrator = Migrator::new(registry().unwrap());
        migrator.up(&store, None).unwrap();

        // Addresses, users, books, libraries and employees all reverse cleanly
        assert_eq!(migrator.down(&store, Some(5)).unwrap(), 5);
        let err = migrator.down(&store, None).unwrap_err();
        assert!(err.is_irreversible());
        assert!(store.schema().unwrap().has_table("products"));
    }
}
