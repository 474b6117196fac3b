//! Handlers for each CLI subcommand

use anyhow::{bail, Context, Result};
use colored::Colorize;
use shelfwise::migration::{MigrationError, MigrationRegistry, Migrator};
use shelfwise::schema::SchemaFormat;
use shelfwise::{MemoryStore, ShelfConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The store snapshot and the migrator the commands act on
pub struct Workspace {
    pub store: MemoryStore,
    pub database_path: PathBuf,
    pub migrator: Migrator,
}

impl Workspace {
    /// Open the snapshot named by `config` with the application migrations
    ///
    /// # Errors
    ///
    /// Fails if the snapshot exists but cannot be read.
    pub fn open(config: &ShelfConfig) -> Result<Self> {
        Self::with_registry(config, shelfwise::migrations::registry()?)
    }

    /// Open the snapshot named by `config` with an explicit set of migrations
    ///
    /// # Errors
    ///
    /// Fails if the snapshot exists but cannot be read.
    pub fn with_registry(config: &ShelfConfig, registry: MigrationRegistry) -> Result<Self> {
        let store = MemoryStore::open(&config.database_path)
            .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
        Ok(Self {
            store,
            database_path: config.database_path.clone(),
            migrator: Migrator::new(registry).with_state_table(config.migrations_table.clone()),
        })
    }

    /// Write the store back to its snapshot
    ///
    /// # Errors
    ///
    /// Fails if the snapshot cannot be written.
    pub fn save(&self) -> Result<()> {
        self.store
            .save(&self.database_path)
            .with_context(|| format!("Failed to write {}", self.database_path.display()))
    }
}

pub fn status(ws: &Workspace, out: &mut dyn Write) -> Result<()> {
    let status = ws.migrator.status(&ws.store)?;

    writeln!(out, "\n📊 Migration Status\n")?;

    if status.applied.is_empty() {
        writeln!(out, "✅ Applied Migrations: None")?;
    } else {
        writeln!(out, "✅ Applied Migrations ({}):", status.applied_count)?;
        for record in &status.applied {
            let time_str = match record.execution_time_ms {
                Some(ms) => format!("{ms}ms"),
                None => "N/A".to_string(),
            };
            writeln!(
                out,
                "  {} m{}_{} ({}, {})",
                "✓".green(),
                record.version,
                record.name,
                record.applied_at.format("%Y-%m-%d %H:%M:%S"),
                time_str
            )?;
        }
    }

    writeln!(out)?;

    if status.pending.is_empty() {
        writeln!(out, "⏳ Pending Migrations: None")?;
    } else {
        writeln!(out, "⏳ Pending Migrations ({}):", status.pending_count)?;
        for pending in &status.pending {
            writeln!(out, "  {} m{}_{} (pending)", "⏳".yellow(), pending.version, pending.name)?;
        }
    }

    writeln!(
        out,
        "\n📈 Summary: {} applied, {} pending",
        status.applied_count, status.pending_count
    )?;
    Ok(())
}

/// Apply pending migrations, saving the snapshot afterwards
///
/// Migrations that completed before a failure stay applied and are saved.
pub fn up(ws: &Workspace, steps: Option<usize>, dry_run: bool, out: &mut dyn Write) -> Result<usize> {
    if dry_run {
        let status = ws.migrator.status(&ws.store)?;
        if status.pending.is_empty() {
            writeln!(out, "No pending migrations to apply")?;
            return Ok(0);
        }
        let to_apply = steps.unwrap_or(status.pending.len()).min(status.pending.len());
        writeln!(out, "Would apply {to_apply} migration(s):")?;
        for (i, pending) in status.pending.iter().take(to_apply).enumerate() {
            writeln!(out, "  {}. m{}_{}", i + 1, pending.version, pending.name)?;
        }
        return Ok(0);
    }

    writeln!(out, "Applying migrations...")?;
    let result = ws.migrator.up(&ws.store, steps);
    ws.save()?;
    let applied = result?;

    if applied > 0 {
        writeln!(out, "{} Successfully applied {applied} migration(s)", "✅".green())?;
    } else {
        writeln!(out, "{} No migrations to apply", "✅".green())?;
    }
    Ok(applied)
}

/// Roll back the newest migrations, saving the snapshot afterwards
pub fn down(ws: &Workspace, steps: usize, dry_run: bool, out: &mut dyn Write) -> Result<usize> {
    if dry_run {
        let status = ws.migrator.status(&ws.store)?;
        if status.applied.is_empty() {
            writeln!(out, "No applied migrations to rollback")?;
            return Ok(0);
        }
        let to_rollback = steps.min(status.applied.len());
        writeln!(out, "Would rollback {to_rollback} migration(s):")?;
        for (i, record) in status.applied.iter().rev().take(to_rollback).enumerate() {
            writeln!(out, "  {}. m{}_{}", i + 1, record.version, record.name)?;
        }
        return Ok(0);
    }

    writeln!(out, "Rolling back migrations...")?;
    let result = ws.migrator.down(&ws.store, Some(steps));
    ws.save()?;
    let rolled_back = result?;

    if rolled_back > 0 {
        writeln!(out, "{} Successfully rolled back {rolled_back} migration(s)", "✅".green())?;
    } else {
        writeln!(out, "{} No migrations to rollback", "✅".green())?;
    }
    Ok(rolled_back)
}

pub fn validate(ws: &Workspace, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Validating checksums...")?;
    ws.migrator.validate_checksums(&ws.store)?;
    writeln!(out, "{} All checksums valid", "✅".green())?;
    Ok(())
}

pub fn info(ws: &Workspace, version: Option<i64>, out: &mut dyn Write) -> Result<()> {
    let status = ws.migrator.status(&ws.store)?;

    let Some(version) = version else {
        writeln!(out, "\n📋 Migration System Information\n")?;
        writeln!(out, "State Table: {}", ws.migrator.state_table())?;
        writeln!(out, "Total Migrations: {}", status.total)?;
        writeln!(out, "Applied: {}", status.applied_count)?;
        writeln!(out, "Pending: {}", status.pending_count)?;
        if let Some(latest) = status.latest_applied_version() {
            writeln!(out, "Latest Applied Version: {latest}")?;
        }
        if let Some(next) = status.next_pending_version() {
            writeln!(out, "Next Pending Version: {next}")?;
        }
        return Ok(());
    };

    if let Some(record) = status.applied.iter().find(|r| r.version == version) {
        writeln!(out, "\n📋 Migration Information\n")?;
        writeln!(out, "Version: {}", record.version)?;
        writeln!(out, "Name: {}", record.name)?;
        writeln!(out, "Checksum: {}", record.checksum)?;
        writeln!(out, "Applied At: {}", record.applied_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        if let Some(ms) = record.execution_time_ms {
            writeln!(out, "Execution Time: {ms}ms")?;
        }
    } else if let Some(pending) = status.pending.iter().find(|p| p.version == version) {
        writeln!(out, "\n📋 Migration Information (Pending)\n")?;
        writeln!(out, "Version: {}", pending.version)?;
        writeln!(out, "Name: {}", pending.name)?;
        writeln!(out, "Checksum: {}", pending.checksum)?;
        writeln!(out, "Status: Pending")?;
    } else {
        return Err(MigrationError::InvalidVersion(format!("{version} is not a known migration")).into());
    }

    if let Some(migration) = ws.migrator.registry().get(version) {
        writeln!(out, "Operations:")?;
        for op in migration.operations() {
            let marker = if op.is_reversible() { " " } else { "!" };
            writeln!(out, "  {marker} {op}")?;
        }
    }
    Ok(())
}

/// Write the current schema to `output`, or to `out` when `output` is `-`
pub fn dump(ws: &Workspace, format: SchemaFormat, output: &Path, out: &mut dyn Write) -> Result<()> {
    let schema = ws.migrator.dump_schema(&ws.store, format)?;
    if output == Path::new("-") {
        out.write_all(schema.as_bytes())?;
        return Ok(());
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if output.is_dir() {
        bail!("{} is a directory", output.display());
    }
    fs::write(output, schema).with_context(|| format!("Failed to write {}", output.display()))?;
    writeln!(out, "{} Wrote schema to {}", "✅".green(), output.display())?;
    Ok(())
}
