//! Migration identifier and file name parsing

use crate::migration::MigrationError;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static IDENTIFIER: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^m(\d{14})_([a-z0-9_]+)$"));

/// Represents a discovered migration source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Path to the migration file
    pub path: PathBuf,

    /// Migration version (timestamp: YYYYMMDDHHMMSS)
    pub version: i64,

    /// Human-readable migration name
    pub name: String,
}

impl MigrationFile {
    /// Parse migration file name to extract version and name
    ///
    /// Expected format: `m{YYYYMMDDHHMMSS}_{name}.rs`
    ///
    /// # Example
    /// - `m20230403081343_create_books.rs` → version: 20230403081343, name: "create_books"
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::InvalidFormat` if the name does not match the
    /// pattern and `MigrationError::InvalidVersion` if the digits are not a
    /// valid timestamp.
    pub fn parse_filename(filename: &str) -> Result<(i64, String), MigrationError> {
        let identifier = filename.strip_suffix(".rs").ok_or_else(|| {
            MigrationError::InvalidFormat(format!(
                "Migration file name '{filename}' does not match expected pattern: m{{YYYYMMDDHHMMSS}}_{{name}}.rs"
            ))
        })?;
        parse_identifier(identifier)
    }
}

/// Parse a migration identifier `m{YYYYMMDDHHMMSS}_{name}`
///
/// # Errors
///
/// Returns `MigrationError::InvalidFormat` if the identifier does not match
/// the pattern and `MigrationError::InvalidVersion` if the digits are not a
/// valid timestamp.
pub fn parse_identifier(identifier: &str) -> Result<(i64, String), MigrationError> {
    let pattern = IDENTIFIER
        .as_ref()
        .map_err(|e| MigrationError::InvalidFormat(format!("Invalid regex: {e}")))?;
    let captures = pattern.captures(identifier).ok_or_else(|| {
        MigrationError::InvalidFormat(format!(
            "Migration identifier '{identifier}' does not match expected pattern: m{{YYYYMMDDHHMMSS}}_{{name}}"
        ))
    })?;
    let digits = &captures[1];
    let version = validate_version(digits)?;
    Ok((version, captures[2].to_string()))
}

/// Check that `digits` is a real `YYYYMMDDHHMMSS` timestamp
///
/// # Errors
///
/// Returns `MigrationError::InvalidVersion` otherwise.
pub fn validate_version(digits: &str) -> Result<i64, MigrationError> {
    NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S")
        .map_err(|e| MigrationError::InvalidVersion(format!("{digits}: {e}")))?;
    digits
        .parse::<i64>()
        .map_err(|e| MigrationError::InvalidVersion(format!("{digits}: {e}")))
}

/// Discover all migration source files in a directory
///
/// Scans the directory for files matching `m{YYYYMMDDHHMMSS}_{name}.rs` and
/// returns them sorted by version (ascending). Other `.rs` files (such as a
/// `mod.rs`) are skipped.
///
/// # Errors
///
/// Returns `MigrationError::InvalidFormat` if the directory cannot be read or
/// a matching file carries an invalid timestamp.
pub fn discover_migrations(migrations_dir: &Path) -> Result<Vec<MigrationFile>, MigrationError> {
    let entries = fs::read_dir(migrations_dir).map_err(|e| {
        MigrationError::InvalidFormat(format!(
            "Failed to read migrations directory {}: {e}",
            migrations_dir.display()
        ))
    })?;

    let mut migrations = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| MigrationError::InvalidFormat(format!("Failed to read directory entry: {e}")))?
            .path();
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !filename.starts_with('m') || !filename.ends_with(".rs") || filename == "mod.rs" {
            continue;
        }
        let (version, name) = MigrationFile::parse_filename(filename)?;
        migrations.push(MigrationFile {
            path,
            version,
            name,
        });
    }

    migrations.sort_by_key(|m| m.version);
    Ok(migrations)
}
