//! Relational schema model
//!
//! This module is the leaf of the crate: it knows nothing about rows, records
//! or migrations. It provides:
//! - Column, index, foreign key and table definitions ([`types`])
//! - Structural change operations and their inverses ([`operation`])
//! - The cumulative [`Schema`] those operations evolve
//! - Deterministic schema dumps ([`dump`])

pub mod dump;
pub mod operation;
pub mod types;

pub use dump::{dump_schema, SchemaFormat};
pub use operation::SchemaOp;
pub use types::{ColumnDef, ColumnType, ForeignKeyDef, IndexDef, OnDelete, TableDef};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reasons a schema change is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("table \"{0}\" already exists")]
    TableExists(String),
    #[error("table \"{0}\" does not exist")]
    TableNotFound(String),
    #[error("column \"{column}\" of relation \"{table}\" already exists")]
    ColumnExists { table: String, column: String },
    #[error("column \"{column}\" of relation \"{table}\" does not exist")]
    ColumnNotFound { table: String, column: String },
    #[error("index \"{0}\" already exists")]
    IndexExists(String),
    #[error("index \"{name}\" on \"{table}\" does not exist")]
    IndexNotFound { table: String, name: String },
    #[error("index on \"{0}\" must name at least one column")]
    EmptyIndex(String),
    #[error("foreign key on {table}.{column} already exists")]
    ForeignKeyExists { table: String, column: String },
    #[error("foreign key on {table}.{column} does not exist")]
    ForeignKeyNotFound { table: String, column: String },
    #[error("cannot drop table \"{table}\" because \"{referenced_by}\" references it")]
    TableReferenced { table: String, referenced_by: String },
}

/// The cumulative relational schema, keyed (and therefore ordered) by table name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: BTreeMap<String, TableDef>,
}

impl Schema {
    /// An empty schema
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Look up a table or fail with [`SchemaError::TableNotFound`]
    pub fn require_table(&self, name: &str) -> Result<&TableDef, SchemaError> {
        self.tables
            .get(name)
            .ok_or_else(|| SchemaError::TableNotFound(name.to_string()))
    }

    /// Tables whose foreign keys point at `table`, with the referencing key
    pub fn referencing(&self, table: &str) -> Vec<(&TableDef, &ForeignKeyDef)> {
        self.tables
            .values()
            .flat_map(|t| {
                t.foreign_keys
                    .iter()
                    .filter(move |fk| fk.to_table == table)
                    .map(move |fk| (t, fk))
            })
            .collect()
    }

    fn index_name_taken(&self, name: &str) -> bool {
        self.tables.values().any(|t| t.index(name).is_some())
    }

    /// Apply one operation
    ///
    /// The operation is validated completely before anything changes, so an
    /// error leaves the schema untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] describing the first problem found.
    pub fn apply(&mut self, op: &SchemaOp) -> Result<(), SchemaError> {
        match op {
            SchemaOp::CreateTable { table } => self.create_table(table),
            SchemaOp::DropTable { table, .. } => self.drop_table(table),
            SchemaOp::RenameTable { from, to } => self.rename_table(from, to),
            SchemaOp::AddColumn { table, column } => {
                let mut def = self.require_table(table)?.clone();
                if def.has_column(&column.name) {
                    return Err(SchemaError::ColumnExists {
                        table: table.clone(),
                        column: column.name.clone(),
                    });
                }
                def.columns.push(column.clone());
                self.tables.insert(table.clone(), def);
                Ok(())
            }
            SchemaOp::RemoveColumn { table, column, .. } => {
                let mut def = self.require_table(table)?.clone();
                require_column(&def, column)?;
                def.columns.retain(|c| &c.name != column);
                // Indexes and keys over a dropped column go with it
                def.indexes.retain(|i| !i.columns.contains(column));
                def.foreign_keys.retain(|fk| &fk.column != column);
                self.tables.insert(table.clone(), def);
                Ok(())
            }
            SchemaOp::RenameColumn { table, from, to } => self.rename_column(table, from, to),
            SchemaOp::AddIndex { table, index } => {
                let mut def = self.require_table(table)?.clone();
                if index.columns.is_empty() {
                    return Err(SchemaError::EmptyIndex(table.clone()));
                }
                for column in &index.columns {
                    require_column(&def, column)?;
                }
                if self.index_name_taken(&index.name) {
                    return Err(SchemaError::IndexExists(index.name.clone()));
                }
                def.indexes.push(index.clone());
                self.tables.insert(table.clone(), def);
                Ok(())
            }
            SchemaOp::RemoveIndex { table, name, .. } => {
                let mut def = self.require_table(table)?.clone();
                if def.index(name).is_none() {
                    return Err(SchemaError::IndexNotFound {
                        table: table.clone(),
                        name: name.clone(),
                    });
                }
                def.indexes.retain(|i| &i.name != name);
                self.tables.insert(table.clone(), def);
                Ok(())
            }
            SchemaOp::AddForeignKey { table, foreign_key } => {
                let mut def = self.require_table(table)?.clone();
                require_column(&def, &foreign_key.column)?;
                if foreign_key.to_table != *table {
                    let target = self.require_table(&foreign_key.to_table)?;
                    require_column(target, &foreign_key.primary_key)?;
                }
                if def.foreign_key(&foreign_key.column).is_some() {
                    return Err(SchemaError::ForeignKeyExists {
                        table: table.clone(),
                        column: foreign_key.column.clone(),
                    });
                }
                def.foreign_keys.push(foreign_key.clone());
                self.tables.insert(table.clone(), def);
                Ok(())
            }
            SchemaOp::RemoveForeignKey { table, column, .. } => {
                let mut def = self.require_table(table)?.clone();
                if def.foreign_key(column).is_none() {
                    return Err(SchemaError::ForeignKeyNotFound {
                        table: table.clone(),
                        column: column.clone(),
                    });
                }
                def.foreign_keys.retain(|fk| &fk.column != column);
                self.tables.insert(table.clone(), def);
                Ok(())
            }
        }
    }

    fn create_table(&mut self, table: &TableDef) -> Result<(), SchemaError> {
        if self.has_table(&table.name) {
            return Err(SchemaError::TableExists(table.name.clone()));
        }
        for (i, column) in table.columns.iter().enumerate() {
            if table.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(SchemaError::ColumnExists {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
            }
        }
        for (i, index) in table.indexes.iter().enumerate() {
            if index.columns.is_empty() {
                return Err(SchemaError::EmptyIndex(table.name.clone()));
            }
            for column in &index.columns {
                require_column(table, column)?;
            }
            if self.index_name_taken(&index.name)
                || table.indexes[..i].iter().any(|other| other.name == index.name)
            {
                return Err(SchemaError::IndexExists(index.name.clone()));
            }
        }
        for fk in &table.foreign_keys {
            require_column(table, &fk.column)?;
            let target = if fk.to_table == table.name {
                table
            } else {
                self.require_table(&fk.to_table)?
            };
            require_column(target, &fk.primary_key)?;
        }
        self.tables.insert(table.name.clone(), table.clone());
        Ok(())
    }

    fn drop_table(&mut self, table: &str) -> Result<(), SchemaError> {
        self.require_table(table)?;
        if let Some((other, _)) = self
            .referencing(table)
            .into_iter()
            .find(|(other, _)| other.name != table)
        {
            return Err(SchemaError::TableReferenced {
                table: table.to_string(),
                referenced_by: other.name.clone(),
            });
        }
        self.tables.remove(table);
        Ok(())
    }

    fn rename_table(&mut self, from: &str, to: &str) -> Result<(), SchemaError> {
        let mut def = self.require_table(from)?.clone();
        if self.has_table(to) {
            return Err(SchemaError::TableExists(to.to_string()));
        }
        def.name = to.to_string();
        for index in &mut def.indexes {
            if index.name == IndexDef::default_name(from, &index.columns) {
                index.name = IndexDef::default_name(to, &index.columns);
            }
        }
        for fk in &mut def.foreign_keys {
            if fk.to_table == from {
                fk.to_table = to.to_string();
            }
        }
        self.tables.remove(from);
        for other in self.tables.values_mut() {
            for fk in &mut other.foreign_keys {
                if fk.to_table == from {
                    fk.to_table = to.to_string();
                }
            }
        }
        self.tables.insert(to.to_string(), def);
        Ok(())
    }

    fn rename_column(&mut self, table: &str, from: &str, to: &str) -> Result<(), SchemaError> {
        let mut def = self.require_table(table)?.clone();
        require_column(&def, from)?;
        if def.has_column(to) {
            return Err(SchemaError::ColumnExists {
                table: table.to_string(),
                column: to.to_string(),
            });
        }
        for column in &mut def.columns {
            if column.name == from {
                column.name = to.to_string();
            }
        }
        for index in &mut def.indexes {
            let conventional = index.name == IndexDef::default_name(table, &index.columns);
            for column in &mut index.columns {
                if column == from {
                    *column = to.to_string();
                }
            }
            if conventional {
                index.name = IndexDef::default_name(table, &index.columns);
            }
        }
        for fk in &mut def.foreign_keys {
            if fk.column == from {
                fk.column = to.to_string();
            }
        }
        self.tables.insert(table.to_string(), def);
        // Keys in other tables that target the renamed column
        for other in self.tables.values_mut() {
            for fk in &mut other.foreign_keys {
                if fk.to_table == table && fk.primary_key == from {
                    fk.primary_key = to.to_string();
                }
            }
        }
        Ok(())
    }
}

fn require_column(table: &TableDef, column: &str) -> Result<(), SchemaError> {
    if table.has_column(column) {
        Ok(())
    } else {
        Err(SchemaError::ColumnNotFound {
            table: table.name.clone(),
            column: column.to_string(),
        })
    }
}
