//! Migrator - Core migration execution engine

use crate::executor::{ShelfError, ShelfExecutor};
use crate::migration::checksum::{calculate_checksum, validate_checksum};
use crate::migration::state_table::{
    initialize_state_table, query_applied_migrations, record_migration, remove_migration_record,
    DEFAULT_STATE_TABLE,
};
use crate::migration::{
    Announcement, Migration, MigrationError, MigrationRecord, MigrationRegistry, MigrationStatus,
    PendingMigration, SchemaManager,
};
use crate::schema::{dump_schema, SchemaFormat, SchemaOp};
use crate::transaction::Transaction;
use chrono::Utc;
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Core migration execution engine
///
/// The `Migrator` compares the registered migrations with the state table,
/// validates checksums, and applies or reverts migrations. Each migration
/// runs as one unit inside its own transaction: its schema operations and
/// its state table record are committed together or not at all.
#[derive(Debug)]
pub struct Migrator {
    registry: MigrationRegistry,
    state_table: String,
}

impl Migrator {
    /// Create a new Migrator over the given migrations
    #[must_use]
    pub fn new(registry: MigrationRegistry) -> Self {
        Self {
            registry,
            state_table: DEFAULT_STATE_TABLE.to_string(),
        }
    }

    /// Use a different state table name
    #[must_use]
    pub fn with_state_table(mut self, name: impl Into<String>) -> Self {
        self.state_table = name.into();
        self
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn state_table(&self) -> &str {
        &self.state_table
    }

    /// Get migration status (applied vs pending)
    ///
    /// Compares registered migrations with the state table to determine
    /// which migrations have been applied and which are pending.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::ChecksumMismatch` if an applied migration's
    /// operations changed since it was applied, and
    /// `MigrationError::MissingMigration` if an applied version is no longer
    /// registered.
    pub fn status(&self, executor: &dyn ShelfExecutor) -> Result<MigrationStatus, MigrationError> {
        let applied = query_applied_migrations(executor, &self.state_table)?;

        for record in &applied {
            let migration = self.registry.get(record.version).ok_or_else(|| {
                MigrationError::MissingMigration {
                    version: record.version,
                    name: record.name.clone(),
                }
            })?;
            let current = calculate_checksum(&migration.operations())?;
            validate_checksum(record.version, &record.name, &record.checksum, &current)?;
        }

        let mut pending = Vec::new();
        for migration in self.registry.iter() {
            if applied.iter().any(|r| r.version == migration.version()) {
                continue;
            }
            pending.push(PendingMigration {
                version: migration.version(),
                name: migration.name().to_string(),
                checksum: calculate_checksum(&migration.operations())?,
            });
        }

        Ok(MigrationStatus::new(applied, pending))
    }

    /// Validate checksums of all applied migrations
    ///
    /// # Errors
    ///
    /// Returns the first mismatch or missing migration found.
    pub fn validate_checksums(&self, executor: &dyn ShelfExecutor) -> Result<(), MigrationError> {
        // Status already validates checksums, so if we get here, all are valid
        self.status(executor).map(|_| ())
    }

    /// Apply pending migrations in ascending version order
    ///
    /// Already-applied migrations are skipped, so running `up` twice is a
    /// no-op the second time. If a migration fails, its transaction is rolled
    /// back and migrations applied earlier in the same call stay applied.
    ///
    /// # Arguments
    ///
    /// * `executor` - The store to migrate
    /// * `steps` - Number of migrations to apply (None = all pending)
    ///
    /// # Returns
    ///
    /// Returns the number of migrations applied.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::ExecutionFailed` for a failed unit, or the
    /// validation errors of [`status`](Self::status).
    pub fn up(&self, executor: &dyn ShelfExecutor, steps: Option<usize>) -> Result<usize, MigrationError> {
        let status = self.status(executor)?;
        if status.pending.is_empty() {
            log::info!("No pending migrations");
            return Ok(0);
        }
        initialize_state_table(executor, &self.state_table)?;

        let count = steps.unwrap_or(status.pending_count).min(status.pending_count);
        for pending in status.pending.iter().take(count) {
            let migration = self.registered(pending.version, &pending.name)?;
            let script = migration.script();

            #[cfg(feature = "tracing")]
            let _span = tracing_helpers::migration_span("up", pending.version, &pending.name).entered();

            log::info!("== {} {}: migrating", pending.version, pending.name);
            let start = Instant::now();
            self.run_unit(executor, migration, script.operations(), Some(&script), |tx| {
                let record = MigrationRecord::new(
                    pending.version,
                    pending.name.clone(),
                    pending.checksum.clone(),
                    Utc::now(),
                    Some(start.elapsed().as_millis() as i64),
                );
                record_migration(tx, &self.state_table, &record)
            })?;
            log::info!(
                "== {} {}: migrated ({:.4}s)",
                pending.version,
                pending.name,
                start.elapsed().as_secs_f64()
            );
        }

        Ok(count)
    }

    /// Roll back the newest applied migrations
    ///
    /// Each rolled-back migration replays the inverse of its operations in
    /// reverse order. The inverses of every targeted migration are computed
    /// before anything runs, so an irreversible migration anywhere in the
    /// range fails the call with the store untouched.
    ///
    /// # Arguments
    ///
    /// * `executor` - The store to migrate
    /// * `steps` - Number of migrations to rollback (default: 1)
    ///
    /// # Returns
    ///
    /// Returns the number of migrations rolled back.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Irreversible` if a targeted migration cannot be
    /// undone, or `MigrationError::ExecutionFailed` if a reversal fails.
    pub fn down(&self, executor: &dyn ShelfExecutor, steps: Option<usize>) -> Result<usize, MigrationError> {
        let status = self.status(executor)?;
        if status.applied.is_empty() {
            log::info!("No applied migrations to roll back");
            return Ok(0);
        }

        let steps = steps.unwrap_or(1);
        let mut plan = Vec::new();
        for record in status.applied.iter().rev().take(steps) {
            let migration = self.registered(record.version, &record.name)?;
            let inverse = migration
                .operations()
                .iter()
                .rev()
                .map(|op| {
                    op.reverse().ok_or_else(|| MigrationError::Irreversible {
                        version: record.version,
                        name: record.name.clone(),
                        operation: op.to_string(),
                    })
                })
                .collect::<Result<Vec<SchemaOp>, _>>()?;
            plan.push((migration, inverse));
        }

        let count = plan.len();
        for (migration, inverse) in plan {
            let (version, name) = (migration.version(), migration.name());

            #[cfg(feature = "tracing")]
            let _span = tracing_helpers::migration_span("down", version, name).entered();

            log::info!("== {version} {name}: reverting");
            let start = Instant::now();
            self.run_unit(executor, migration, &inverse, None, |tx| {
                remove_migration_record(tx, &self.state_table, version)
            })?;
            log::info!("== {version} {name}: reverted ({:.4}s)", start.elapsed().as_secs_f64());
        }

        Ok(count)
    }

    /// Render the current schema, stamped with the latest applied version
    ///
    /// The state table itself is left out of the dump.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError` if the schema or state table cannot be read.
    pub fn dump_schema(&self, executor: &dyn ShelfExecutor, format: SchemaFormat) -> Result<String, MigrationError> {
        let schema = executor.schema()?;
        let version = query_applied_migrations(executor, &self.state_table)?
            .last()
            .map(|r| r.version);
        Ok(dump_schema(&schema, version, format, &[self.state_table.as_str()])?)
    }

    fn registered(&self, version: i64, name: &str) -> Result<&dyn Migration, MigrationError> {
        self.registry
            .get(version)
            .ok_or_else(|| MigrationError::MissingMigration {
                version,
                name: name.to_string(),
            })
    }

    /// Apply `operations` and then `finish` inside one transaction
    fn run_unit(
        &self,
        executor: &dyn ShelfExecutor,
        migration: &dyn Migration,
        operations: &[SchemaOp],
        script: Option<&SchemaManager>,
        finish: impl FnOnce(&Transaction<'_>) -> Result<(), ShelfError>,
    ) -> Result<(), MigrationError> {
        let failed = |source: ShelfError| MigrationError::ExecutionFailed {
            version: migration.version(),
            name: migration.name().to_string(),
            source,
        };

        let tx = executor.begin()?;
        let mut timers = Vec::new();
        let outcome = operations
            .iter()
            .enumerate()
            .try_for_each(|(i, op)| {
                if let Some(script) = script {
                    announce(script, i, &mut timers);
                }
                run_operation(&tx, op, script.is_some_and(|s| s.is_quiet(i)))
            })
            .and_then(|()| {
                if let Some(script) = script {
                    announce(script, operations.len(), &mut timers);
                }
                finish(&tx)
            });

        match outcome {
            Ok(()) => tx.commit().map_err(failed),
            Err(source) => {
                tx.rollback().map_err(&failed)?;
                log::warn!(
                    "== {} {}: failed, rolled back: {source}",
                    migration.version(),
                    migration.name()
                );
                Err(failed(source))
            }
        }
    }
}

fn run_operation(executor: &dyn ShelfExecutor, op: &SchemaOp, quiet: bool) -> Result<(), ShelfError> {
    if quiet {
        log::debug!("-- {op}");
        return executor.apply_schema_op(op);
    }
    log::info!("-- {op}");
    let start = Instant::now();
    executor.apply_schema_op(op)?;
    log::info!("   -> {:.4}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Print the announcements due before operation `position`
fn announce(script: &SchemaManager, position: usize, timers: &mut Vec<Instant>) {
    for (_, announcement) in script.announcements().iter().filter(|(at, _)| *at == position) {
        match announcement {
            Announcement::Say { text, subitem: false } => log::info!("-- {text}"),
            Announcement::Say { text, subitem: true } => log::info!("   -> {text}"),
            Announcement::Timed(text) => {
                log::info!("-- {text}");
                timers.push(Instant::now());
            }
            Announcement::Done => {
                if let Some(start) = timers.pop() {
                    log::info!("   -> {:.4}s", start.elapsed().as_secs_f64());
                }
            }
        }
    }
}
