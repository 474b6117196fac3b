//! Schema change operations and their inverses.

use super::types::{ColumnDef, ForeignKeyDef, IndexDef, TableDef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single structural change to the schema
///
/// Operations that destroy structure (`DropTable`, `RemoveColumn`,
/// `RemoveIndex`, `RemoveForeignKey`) carry an optional copy of what they
/// remove. Only when that copy is present can the operation be reversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum SchemaOp {
    CreateTable {
        table: TableDef,
    },
    DropTable {
        table: String,
        definition: Option<TableDef>,
    },
    RenameTable {
        from: String,
        to: String,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
    RemoveColumn {
        table: String,
        column: String,
        definition: Option<ColumnDef>,
    },
    RenameColumn {
        table: String,
        from: String,
        to: String,
    },
    AddIndex {
        table: String,
        index: IndexDef,
    },
    RemoveIndex {
        table: String,
        name: String,
        definition: Option<IndexDef>,
    },
    AddForeignKey {
        table: String,
        foreign_key: ForeignKeyDef,
    },
    RemoveForeignKey {
        table: String,
        column: String,
        definition: Option<ForeignKeyDef>,
    },
}

impl SchemaOp {
    /// The inverse operation, or `None` when the removed structure was not recorded
    #[must_use]
    pub fn reverse(&self) -> Option<SchemaOp> {
        let reversed = match self {
            SchemaOp::CreateTable { table } => SchemaOp::DropTable {
                table: table.name.clone(),
                definition: Some(table.clone()),
            },
            SchemaOp::DropTable { definition, .. } => SchemaOp::CreateTable {
                table: definition.clone()?,
            },
            SchemaOp::RenameTable { from, to } => SchemaOp::RenameTable {
                from: to.clone(),
                to: from.clone(),
            },
            SchemaOp::AddColumn { table, column } => SchemaOp::RemoveColumn {
                table: table.clone(),
                column: column.name.clone(),
                definition: Some(column.clone()),
            },
            SchemaOp::RemoveColumn {
                table, definition, ..
            } => SchemaOp::AddColumn {
                table: table.clone(),
                column: definition.clone()?,
            },
            SchemaOp::RenameColumn { table, from, to } => SchemaOp::RenameColumn {
                table: table.clone(),
                from: to.clone(),
                to: from.clone(),
            },
            SchemaOp::AddIndex { table, index } => SchemaOp::RemoveIndex {
                table: table.clone(),
                name: index.name.clone(),
                definition: Some(index.clone()),
            },
            SchemaOp::RemoveIndex {
                table, definition, ..
            } => SchemaOp::AddIndex {
                table: table.clone(),
                index: definition.clone()?,
            },
            SchemaOp::AddForeignKey { table, foreign_key } => SchemaOp::RemoveForeignKey {
                table: table.clone(),
                column: foreign_key.column.clone(),
                definition: Some(foreign_key.clone()),
            },
            SchemaOp::RemoveForeignKey {
                table, definition, ..
            } => SchemaOp::AddForeignKey {
                table: table.clone(),
                foreign_key: definition.clone()?,
            },
        };
        Some(reversed)
    }

    /// Whether [`reverse`](Self::reverse) can produce an inverse
    #[must_use]
    pub fn is_reversible(&self) -> bool {
        self.reverse().is_some()
    }

    /// Name of the table this operation targets
    #[must_use]
    pub fn table(&self) -> &str {
        match self {
            SchemaOp::CreateTable { table } => &table.name,
            SchemaOp::RenameTable { from, .. } => from,
            SchemaOp::DropTable { table, .. }
            | SchemaOp::AddColumn { table, .. }
            | SchemaOp::RemoveColumn { table, .. }
            | SchemaOp::RenameColumn { table, .. }
            | SchemaOp::AddIndex { table, .. }
            | SchemaOp::RemoveIndex { table, .. }
            | SchemaOp::AddForeignKey { table, .. }
            | SchemaOp::RemoveForeignKey { table, .. } => table,
        }
    }
}

/// Migration log form, e.g. `add_index("products", ["part_number"])`
impl fmt::Display for SchemaOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaOp::CreateTable { table } => write!(f, "create_table({:?})", table.name),
            SchemaOp::DropTable { table, .. } => write!(f, "drop_table({table:?})"),
            SchemaOp::RenameTable { from, to } => write!(f, "rename_table({from:?}, {to:?})"),
            SchemaOp::AddColumn { table, column } => write!(
                f,
                "add_column({table:?}, {:?}, {})",
                column.name, column.column_type
            ),
            SchemaOp::RemoveColumn { table, column, .. } => {
                write!(f, "remove_column({table:?}, {column:?})")
            }
            SchemaOp::RenameColumn { table, from, to } => {
                write!(f, "rename_column({table:?}, {from:?}, {to:?})")
            }
            SchemaOp::AddIndex { table, index } => {
                write!(f, "add_index({table:?}, {:?})", index.columns)
            }
            SchemaOp::RemoveIndex { table, name, .. } => {
                write!(f, "remove_index({table:?}, name: {name:?})")
            }
            SchemaOp::AddForeignKey { table, foreign_key } => write!(
                f,
                "add_foreign_key({table:?}, {:?})",
                foreign_key.to_table
            ),
            SchemaOp::RemoveForeignKey { table, column, .. } => {
                write!(f, "remove_foreign_key({table:?}, column: {column:?})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn test_remove_column_without_definition_is_irreversible() {
        let op = SchemaOp::RemoveColumn {
            table: "products".to_string(),
            column: "name".to_string(),
            definition: None,
        };
        assert!(op.reverse().is_none());
        assert!(!op.is_reversible());
    }

    #[test]
    fn test_remove_column_with_definition_reverses_to_add() {
        let column = ColumnDef::new("description", ColumnType::Text);
        let op = SchemaOp::RemoveColumn {
            table: "products".to_string(),
            column: "description".to_string(),
            definition: Some(column.clone()),
        };
        assert_eq!(
            op.reverse(),
            Some(SchemaOp::AddColumn {
                table: "products".to_string(),
                column,
            })
        );
    }

    #[test]
    fn test_rename_reverses_itself() {
        let op = SchemaOp::RenameColumn {
            table: "products".to_string(),
            from: "upcode".to_string(),
            to: "upc_code".to_string(),
        };
        let back = op.reverse().and_then(|r| r.reverse());
        assert_eq!(back, Some(op));
    }

    #[test]
    fn test_display_reads_like_a_migration_log() {
        let op = SchemaOp::AddIndex {
            table: "products".to_string(),
            index: IndexDef::new("products", &["part_number"]),
        };
        assert_eq!(op.to_string(), "add_index(\"products\", [\"part_number\"])");
    }
}
