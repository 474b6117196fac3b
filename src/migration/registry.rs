//! Migration registry
//!
//! Migrations are compiled into the binary, so the registry is an explicit
//! value built at startup (see [`crate::migrations::registry`]) rather than a
//! scan of the file system.

use crate::migration::{Migration, MigrationError};
use std::collections::BTreeMap;

/// Registered migrations, indexed (and therefore ordered) by version
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<i64, Box<dyn Migration>>,
}

impl MigrationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::AlreadyRegistered` if a migration with the same
    /// version is already registered, and `MigrationError::InvalidVersion` if
    /// the version is not a `YYYYMMDDHHMMSS` timestamp.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> Result<(), MigrationError> {
        let version = migration.version();
        crate::migration::file::validate_version(&version.to_string())?;

        if let Some(existing) = self.migrations.get(&version) {
            return Err(MigrationError::AlreadyRegistered {
                version,
                name: existing.name().to_string(),
            });
        }

        log::trace!("Registered migration {}", migration.identifier());
        self.migrations.insert(version, migration);
        Ok(())
    }

    /// Builder form of [`register`](Self::register)
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn with(mut self, migration: impl Migration + 'static) -> Result<Self, MigrationError> {
        self.register(Box::new(migration))?;
        Ok(self)
    }

    /// Get a migration by version
    pub fn get(&self, version: i64) -> Option<&dyn Migration> {
        self.migrations.get(&version).map(|m| &**m)
    }

    /// Check if a migration is registered
    pub fn is_registered(&self, version: i64) -> bool {
        self.migrations.contains_key(&version)
    }

    /// All registered versions, ascending
    pub fn versions(&self) -> Vec<i64> {
        self.migrations.keys().copied().collect()
    }

    /// Registered migrations in ascending version order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.values().map(|m| &**m)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl std::fmt::Debug for MigrationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.migrations.values().map(|m| m.identifier()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::SchemaManager;

    struct Named(i64, &'static str);

    impl Migration for Named {
        fn name(&self) -> &str {
            self.1
        }

        fn version(&self) -> i64 {
            self.0
        }

        fn change(&self, manager: &mut SchemaManager) {
            manager.create_table(self.1, |_| {});
        }
    }

    #[test]
    fn test_iterates_in_version_order() {
        let registry = MigrationRegistry::new()
            .with(Named(20230403081343, "books"))
            .unwrap()
            .with(Named(20230331054854, "cars"))
            .unwrap();
        let names: Vec<_> = registry.iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["cars", "books"]);
        assert_eq!(registry.versions(), vec![20230331054854, 20230403081343]);
        assert_eq!(registry.get(20230331054854).map(|m| m.name()), Some("cars"));
    }

    #[test]
    fn test_rejects_duplicate_versions() {
        let mut registry = MigrationRegistry::new();
        registry.register(Box::new(Named(20230331054854, "cars"))).unwrap();
        let err = registry
            .register(Box::new(Named(20230331054854, "people")))
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::AlreadyRegistered { version: 20230331054854, ref name } if name == "cars"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rejects_non_timestamp_versions() {
        let mut registry = MigrationRegistry::new();
        let err = registry.register(Box::new(Named(42, "tiny"))).unwrap_err();
        assert!(matches!(err, MigrationError::InvalidVersion(_)));
    }
}
