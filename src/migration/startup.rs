//! In-process migration execution helpers

use crate::executor::ShelfExecutor;
use crate::migration::{MigrationError, MigrationRegistry, Migrator};

/// Run migrations on application startup
///
/// Validates the checksums of already-applied migrations, then applies every
/// pending one. Call it during initialization and refuse to start if it fails.
///
/// # Returns
///
/// Returns the number of migrations applied.
///
/// # Errors
///
/// Returns `MigrationError` if validation fails or a migration cannot be applied.
///
/// # Example
///
/// ```rust,no_run
/// use shelfwise::MemoryStore;
/// use shelfwise::migration::{startup_migrations, MigrationRegistry};
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStore::open("db/shelfwise.json")?;
///     startup_migrations(&store, shelfwise::migrations::registry()?)?;
///     store.save("db/shelfwise.json")?;
///     Ok(())
/// }
/// ```
pub fn startup_migrations(
    executor: &dyn ShelfExecutor,
    registry: MigrationRegistry,
) -> Result<usize, MigrationError> {
    let migrator = Migrator::new(registry);
    migrator.validate_checksums(executor)?;

    let applied = migrator.up(executor, None)?;
    if applied > 0 {
        log::info!("Applied {applied} migration(s) on startup");
    } else {
        log::debug!("No pending migrations to apply");
    }
    Ok(applied)
}
