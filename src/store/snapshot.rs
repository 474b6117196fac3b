//! JSON snapshots of a [`Database`]
//!
//! Values are encoded by column type (see [`crate::value::json`]), so a
//! snapshot only decodes against the schema stored alongside it.

use crate::executor::ShelfError;
use crate::schema::Schema;
use crate::store::database::{Database, TableData};
use crate::store::Row;
use crate::value::{from_json, to_json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    format_version: u32,
    schema: Schema,
    tables: BTreeMap<String, TableSnapshot>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TableSnapshot {
    next_key: i64,
    rows: Vec<BTreeMap<String, JsonValue>>,
}

/// Encode the whole database as pretty-printed JSON
///
/// # Errors
///
/// Returns `ShelfError::Snapshot` if serialization fails.
pub fn encode(db: &Database) -> Result<String, ShelfError> {
    let tables = db
        .tables
        .iter()
        .map(|(name, data)| {
            let rows = data
                .rows
                .values()
                .map(|row| {
                    row.iter()
                        .map(|(column, value)| (column.to_string(), to_json(value)))
                        .collect()
                })
                .collect();
            (
                name.clone(),
                TableSnapshot {
                    next_key: data.next_key,
                    rows,
                },
            )
        })
        .collect();
    let file = SnapshotFile {
        format_version: FORMAT_VERSION,
        schema: db.schema.clone(),
        tables,
    };
    serde_json::to_string_pretty(&file).map_err(|e| ShelfError::Snapshot(e.to_string()))
}

/// Decode a database previously written by [`encode`]
///
/// # Errors
///
/// Returns `ShelfError::Snapshot` for malformed JSON, an unsupported format
/// version, or values that do not match their column type.
pub fn decode(text: &str) -> Result<Database, ShelfError> {
    let mut file: SnapshotFile =
        serde_json::from_str(text).map_err(|e| ShelfError::Snapshot(e.to_string()))?;
    if file.format_version != FORMAT_VERSION {
        return Err(ShelfError::Snapshot(format!(
            "unsupported snapshot format version {}",
            file.format_version
        )));
    }

    let mut tables = BTreeMap::new();
    for (name, def) in &file.schema.tables {
        let snapshot = file.tables.remove(name).unwrap_or_default();
        let mut data = TableData {
            rows: BTreeMap::new(),
            next_key: snapshot.next_key,
        };
        for (position, encoded) in snapshot.rows.into_iter().enumerate() {
            let mut row = Row::new();
            for (column, json) in encoded {
                let column_def = def.column(&column).ok_or_else(|| {
                    ShelfError::Snapshot(format!("column {name}.{column} is not in the schema"))
                })?;
                let value = from_json(&json, column_def.column_type)
                    .map_err(|e| ShelfError::Snapshot(format!("{name}.{column}: {e}")))?;
                row.set(column, value);
            }
            let key = row.id().unwrap_or(position as i64 + 1);
            data.next_key = data.next_key.max(key);
            data.rows.insert(key, row);
        }
        tables.insert(name.clone(), data);
    }
    if let Some(orphan) = file.tables.keys().next() {
        return Err(ShelfError::Snapshot(format!(
            "rows for table \"{orphan}\" which is not in the schema"
        )));
    }

    Ok(Database {
        schema: file.schema,
        tables,
    })
}

/// Write a snapshot file, creating parent directories as needed
///
/// # Errors
///
/// Returns `ShelfError::Io` or `ShelfError::Snapshot`.
pub fn write(db: &Database, path: &Path) -> Result<(), ShelfError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, encode(db)?)?;
    Ok(())
}

/// Read a snapshot file
///
/// # Errors
///
/// Returns `ShelfError::Io` or `ShelfError::Snapshot`.
pub fn read(path: &Path) -> Result<Database, ShelfError> {
    let text = fs::read_to_string(path)?;
    decode(&text)
}
