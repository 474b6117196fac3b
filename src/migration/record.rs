//! `MigrationRecord` - Represents entries in the migration state table

use crate::store::{Row, RowError};
use chrono::{DateTime, Utc};

/// Represents a migration record in the state table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Migration version (timestamp: YYYYMMDDHHMMSS)
    pub version: i64,

    /// Human-readable migration name
    pub name: String,

    /// `SHA-256` checksum of the migration's operations
    pub checksum: String,

    /// When the migration was applied
    pub applied_at: DateTime<Utc>,

    /// Execution time in milliseconds (`None` if not recorded)
    pub execution_time_ms: Option<i64>,
}

impl MigrationRecord {
    /// Create a new `MigrationRecord`
    #[must_use]
    pub fn new(
        version: i64,
        name: String,
        checksum: String,
        applied_at: DateTime<Utc>,
        execution_time_ms: Option<i64>,
    ) -> Self {
        Self {
            version,
            name,
            checksum,
            applied_at,
            execution_time_ms,
        }
    }

    /// Row form for the state table
    #[must_use]
    pub fn to_row(&self) -> Row {
        Row::new()
            .with("version", self.version)
            .with("name", self.name.as_str())
            .with("checksum", self.checksum.as_str())
            .with("applied_at", self.applied_at)
            .with("execution_time_ms", self.execution_time_ms)
    }

    /// Create a `MigrationRecord` from a state table row
    ///
    /// # Errors
    ///
    /// Returns `RowError` if a required column is missing, NULL, or of the wrong type.
    pub fn from_row(row: &Row) -> Result<Self, RowError> {
        let required = |column: &str| RowError::Missing(column.to_string());
        Ok(Self {
            version: row.get_i64("version")?.ok_or_else(|| required("version"))?,
            name: row.get_string("name")?.ok_or_else(|| required("name"))?,
            checksum: row.get_string("checksum")?.ok_or_else(|| required("checksum"))?,
            applied_at: row.get_datetime("applied_at")?.ok_or_else(|| required("applied_at"))?,
            execution_time_ms: row.get_i64("execution_time_ms")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_row_conversion() {
        let applied_at = Utc.with_ymd_and_hms(2023, 4, 3, 8, 13, 43).unwrap();
        let record = MigrationRecord::new(
            20230403081343,
            "create_books".to_string(),
            "ab".repeat(32),
            applied_at,
            Some(3),
        );
        assert_eq!(MigrationRecord::from_row(&record.to_row()).unwrap(), record);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let row = Row::new().with("version", 1i64);
        assert_eq!(
            MigrationRecord::from_row(&row),
            Err(RowError::Missing("name".to_string()))
        );
    }
}
