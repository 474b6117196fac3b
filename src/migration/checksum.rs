//! Checksum calculation for migrations

use crate::migration::MigrationError;
use crate::schema::SchemaOp;
use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of a migration's operation list
///
/// The operations are hashed in their canonical JSON form, so any change to
/// what a migration does (a renamed column, a new index, a changed type)
/// changes its checksum, while formatting of the source does not.
///
/// # Errors
///
/// Returns `MigrationError::Serialization` if the operations cannot be encoded.
pub fn calculate_checksum(operations: &[SchemaOp]) -> Result<String, MigrationError> {
    let canonical = serde_json::to_vec(operations)?;

    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    let hash = hasher.finalize();

    Ok(format!("{hash:x}"))
}

/// Validate checksum against stored value
///
/// # Errors
///
/// Returns `MigrationError::ChecksumMismatch` if they differ.
pub fn validate_checksum(
    version: i64,
    name: &str,
    stored_checksum: &str,
    current_checksum: &str,
) -> Result<(), MigrationError> {
    if stored_checksum == current_checksum {
        Ok(())
    } else {
        Err(MigrationError::ChecksumMismatch {
            version,
            name: name.to_string(),
            stored: stored_checksum.to_string(),
            current: current_checksum.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::SchemaManager;

    fn ops(column: &str) -> Vec<SchemaOp> {
        let mut manager = SchemaManager::new();
        manager.create_table("cars", |t| {
            t.string(column);
        });
        manager.into_operations()
    }

    #[test]
    fn test_checksum_is_stable_hex() {
        let first = calculate_checksum(&ops("name")).unwrap();
        let second = calculate_checksum(&ops("name")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_checksum_tracks_definition_changes() {
        let original = calculate_checksum(&ops("name")).unwrap();
        let edited = calculate_checksum(&ops("title")).unwrap();
        assert_ne!(original, edited);
        assert!(validate_checksum(1, "create_cars", &original, &edited).is_err());
        assert!(validate_checksum(1, "create_cars", &original, &original).is_ok());
    }
}
