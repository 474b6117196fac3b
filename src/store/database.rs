//! `Database` - schema plus table data, with constraint enforcement.
//!
//! Every mutating method is all-or-nothing: it either validates completely
//! before writing, or works on a copy that replaces `self` only on success.

use crate::executor::{ConstraintViolation, ShelfError};
use crate::query::Filter;
use crate::schema::{ColumnDef, ForeignKeyDef, OnDelete, Schema, SchemaOp, TableDef};
use crate::store::Row;
use crate::value::types::Nonconforming;
use crate::value::{conform, is_null, null_of};
use sea_query::Value;
use std::collections::BTreeMap;

/// Rows of one table, keyed by id (or by an internal row number for tables without one)
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TableData {
    pub(crate) rows: BTreeMap<i64, Row>,
    pub(crate) next_key: i64,
}

/// The complete state of a store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Database {
    pub(crate) schema: Schema,
    pub(crate) tables: BTreeMap<String, TableData>,
}

impl Database {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of rows currently stored in `table`
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |t| t.rows.len())
    }

    fn table_def(&self, table: &str) -> Result<&TableDef, ShelfError> {
        self.schema
            .table(table)
            .ok_or_else(|| ShelfError::UnknownTable(table.to_string()))
    }

    fn data(&self, table: &str) -> Result<&TableData, ShelfError> {
        self.tables
            .get(table)
            .ok_or_else(|| ShelfError::UnknownTable(table.to_string()))
    }

    /// Apply a schema change and carry the stored rows along with it
    pub fn apply_schema_op(&mut self, op: &SchemaOp) -> Result<(), ShelfError> {
        let mut schema = self.schema.clone();
        schema.apply(op)?;
        let mut tables = self.tables.clone();

        match op {
            SchemaOp::CreateTable { table } => {
                tables.insert(table.name.clone(), TableData::default());
            }
            SchemaOp::DropTable { table, .. } => {
                tables.remove(table);
            }
            SchemaOp::RenameTable { from, to } => {
                if let Some(data) = tables.remove(from) {
                    tables.insert(to.clone(), data);
                }
            }
            SchemaOp::AddColumn { table, column } => {
                let data = tables.entry(table.clone()).or_default();
                if !column.nullable && !data.rows.is_empty() {
                    return Err(ConstraintViolation::NotNull {
                        table: table.clone(),
                        column: column.name.clone(),
                    }
                    .into());
                }
                for row in data.rows.values_mut() {
                    row.set(column.name.clone(), null_of(column.column_type));
                }
            }
            SchemaOp::RemoveColumn { table, column, .. } => {
                if let Some(data) = tables.get_mut(table) {
                    for row in data.rows.values_mut() {
                        row.remove(column);
                    }
                }
            }
            SchemaOp::RenameColumn { table, from, to } => {
                if let Some(data) = tables.get_mut(table) {
                    for row in data.rows.values_mut() {
                        if let Some(value) = row.remove(from) {
                            row.set(to.clone(), value);
                        }
                    }
                }
            }
            SchemaOp::AddIndex { table, index } if index.unique => {
                if let Some(data) = tables.get(table) {
                    let rows: Vec<&Row> = data.rows.values().collect();
                    for (i, row) in rows.iter().enumerate() {
                        let Some(key) = index_key(row, &index.columns) else {
                            continue;
                        };
                        if rows[i + 1..]
                            .iter()
                            .any(|other| index_key(other, &index.columns).as_ref() == Some(&key))
                        {
                            return Err(ConstraintViolation::Unique {
                                table: table.clone(),
                                index: index.name.clone(),
                                columns: index.columns.clone(),
                            }
                            .into());
                        }
                    }
                }
            }
            SchemaOp::AddForeignKey { table, foreign_key } => {
                if let Some(data) = tables.get(table) {
                    for row in data.rows.values() {
                        if !reference_resolves(&tables, foreign_key, row) {
                            return Err(ConstraintViolation::ForeignKey {
                                table: table.clone(),
                                column: foreign_key.column.clone(),
                                referenced_table: foreign_key.to_table.clone(),
                            }
                            .into());
                        }
                    }
                }
            }
            _ => {}
        }

        self.schema = schema;
        self.tables = tables;
        Ok(())
    }

    /// Insert a row, returning its id (`0` for tables without one)
    pub fn insert(&mut self, table: &str, row: Row) -> Result<i64, ShelfError> {
        let def = self.table_def(table)?.clone();
        let data = self.data(table)?;
        let mut row = prepare_row(&def, row, None)?;

        let key = if def.has_id() {
            match row.id() {
                Some(id) if data.rows.contains_key(&id) => {
                    return Err(ConstraintViolation::Unique {
                        table: table.to_string(),
                        index: format!("{table}_pkey"),
                        columns: vec!["id".to_string()],
                    }
                    .into());
                }
                Some(id) => id,
                None => {
                    let id = data.next_key + 1;
                    row.set("id", id);
                    id
                }
            }
        } else {
            data.next_key + 1
        };

        self.check_constraints(&def, &row, None)?;

        let data = self
            .tables
            .get_mut(table)
            .ok_or_else(|| ShelfError::UnknownTable(table.to_string()))?;
        data.next_key = data.next_key.max(key);
        data.rows.insert(key, row);
        Ok(if def.has_id() { key } else { 0 })
    }

    /// Overwrite columns of the row with `id`; returns rows affected
    pub fn update(&mut self, table: &str, id: i64, changes: Row) -> Result<u64, ShelfError> {
        let def = self.table_def(table)?.clone();
        if !def.has_id() {
            return Err(ShelfError::Other(format!(
                "table \"{table}\" has no primary key to update by"
            )));
        }
        let Some(existing) = self.data(table)?.rows.get(&id) else {
            return Ok(0);
        };
        if let Some(new_id) = changes.get_i64("id").ok().flatten() {
            if new_id != id {
                return Err(ShelfError::Other(format!(
                    "primary key of {table} cannot change ({id} -> {new_id})"
                )));
            }
        }
        let mut row = prepare_row(&def, changes, Some(existing))?;
        row.set("id", id);

        self.check_constraints(&def, &row, Some(id))?;

        if let Some(data) = self.tables.get_mut(table) {
            data.rows.insert(id, row);
        }
        Ok(1)
    }

    /// Delete matching rows and apply the referencing foreign keys' delete rules
    pub fn delete(&mut self, table: &str, filter: &Filter) -> Result<u64, ShelfError> {
        let def = self.table_def(table)?;
        check_filter(def, filter)?;
        let keys: Vec<i64> = self
            .data(table)?
            .rows
            .iter()
            .filter(|(_, row)| filter.matches(row))
            .map(|(key, _)| *key)
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }

        let mut next = self.clone();
        next.remove_rows(table, &keys)?;
        *self = next;
        Ok(keys.len() as u64)
    }

    /// Matching rows in key order
    pub fn select(&self, table: &str, filter: &Filter) -> Result<Vec<Row>, ShelfError> {
        let def = self.table_def(table)?;
        check_filter(def, filter)?;
        Ok(self
            .data(table)?
            .rows
            .values()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect())
    }

    fn remove_rows(&mut self, table: &str, keys: &[i64]) -> Result<(), ShelfError> {
        let removed: Vec<Row> = match self.tables.get_mut(table) {
            Some(data) => keys.iter().filter_map(|key| data.rows.remove(key)).collect(),
            None => return Err(ShelfError::UnknownTable(table.to_string())),
        };

        let referencing: Vec<(String, ForeignKeyDef)> = self
            .schema
            .referencing(table)
            .into_iter()
            .map(|(t, fk)| (t.name.clone(), fk.clone()))
            .collect();

        for (child_table, fk) in referencing {
            for parent in &removed {
                let Some(parent_key) = parent.get(&fk.primary_key).filter(|v| !is_null(v)) else {
                    continue;
                };
                let child_keys: Vec<i64> = self
                    .data(&child_table)?
                    .rows
                    .iter()
                    .filter(|(_, row)| row.get(&fk.column) == Some(parent_key))
                    .map(|(key, _)| *key)
                    .collect();
                if child_keys.is_empty() {
                    continue;
                }
                match fk.on_delete {
                    OnDelete::Restrict => {
                        return Err(ConstraintViolation::ForeignKey {
                            table: child_table.clone(),
                            column: fk.column.clone(),
                            referenced_table: table.to_string(),
                        }
                        .into());
                    }
                    OnDelete::Cascade => self.remove_rows(&child_table, &child_keys)?,
                    OnDelete::Nullify => {
                        let column = self
                            .table_def(&child_table)?
                            .column(&fk.column)
                            .cloned()
                            .ok_or_else(|| ShelfError::UnknownColumn {
                                table: child_table.clone(),
                                column: fk.column.clone(),
                            })?;
                        if !column.nullable {
                            return Err(ConstraintViolation::NotNull {
                                table: child_table.clone(),
                                column: fk.column.clone(),
                            }
                            .into());
                        }
                        if let Some(data) = self.tables.get_mut(&child_table) {
                            for key in &child_keys {
                                if let Some(row) = data.rows.get_mut(key) {
                                    row.set(fk.column.clone(), null_of(column.column_type));
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn check_constraints(&self, def: &TableDef, row: &Row, own_key: Option<i64>) -> Result<(), ShelfError> {
        for column in &def.columns {
            if !column.nullable && row.get(&column.name).map_or(true, is_null) {
                return Err(ConstraintViolation::NotNull {
                    table: def.name.clone(),
                    column: column.name.clone(),
                }
                .into());
            }
        }

        let data = self.data(&def.name)?;
        for index in def.unique_indexes() {
            let Some(key) = index_key(row, &index.columns) else {
                continue;
            };
            let taken = data
                .rows
                .iter()
                .filter(|(k, _)| Some(**k) != own_key)
                .any(|(_, other)| index_key(other, &index.columns).as_ref() == Some(&key));
            if taken {
                return Err(ConstraintViolation::Unique {
                    table: def.name.clone(),
                    index: index.name.clone(),
                    columns: index.columns.clone(),
                }
                .into());
            }
        }

        for fk in &def.foreign_keys {
            if !reference_resolves(&self.tables, fk, row) {
                return Err(ConstraintViolation::ForeignKey {
                    table: def.name.clone(),
                    column: fk.column.clone(),
                    referenced_table: fk.to_table.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Conform every provided value to its column and fill the rest from `base` or NULL
fn prepare_row(def: &TableDef, provided: Row, base: Option<&Row>) -> Result<Row, ShelfError> {
    if let Some(unknown) = provided.columns().find(|c| !def.has_column(c)) {
        return Err(ShelfError::UnknownColumn {
            table: def.name.clone(),
            column: unknown.to_string(),
        });
    }
    let mut out = Row::new();
    for column in &def.columns {
        let raw = provided
            .get(&column.name)
            .or_else(|| base.and_then(|b| b.get(&column.name)))
            .cloned()
            .unwrap_or_else(|| null_of(column.column_type));
        out.set(column.name.clone(), conform_for(def, column, raw)?);
    }
    Ok(out)
}

fn conform_for(def: &TableDef, column: &ColumnDef, value: Value) -> Result<Value, ShelfError> {
    conform(value, column).map_err(|reason| match reason {
        Nonconforming::WrongType => ShelfError::TypeMismatch {
            table: def.name.clone(),
            column: column.name.clone(),
            expected: column.column_type.to_string(),
        },
        Nonconforming::Overflow => ConstraintViolation::NumericOverflow {
            table: def.name.clone(),
            column: column.name.clone(),
        }
        .into(),
    })
}

fn check_filter(def: &TableDef, filter: &Filter) -> Result<(), ShelfError> {
    match filter.columns().find(|c| !def.has_column(c)) {
        Some(column) => Err(ShelfError::UnknownColumn {
            table: def.name.clone(),
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}

/// Values of the indexed columns, or `None` if any is NULL (NULLs never collide)
fn index_key(row: &Row, columns: &[String]) -> Option<Vec<Value>> {
    columns
        .iter()
        .map(|c| row.get(c).filter(|v| !is_null(v)).cloned())
        .collect()
}

fn reference_resolves(tables: &BTreeMap<String, TableData>, fk: &ForeignKeyDef, row: &Row) -> bool {
    let Some(value) = row.get(&fk.column).filter(|v| !is_null(v)) else {
        return true;
    };
    tables.get(&fk.to_table).is_some_and(|target| {
        target
            .rows
            .values()
            .any(|candidate| candidate.get(&fk.primary_key) == Some(value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, IndexDef};

    fn people_and_addresses(on_delete: OnDelete) -> Database {
        let mut db = Database::new();
        let mut people = TableDef::new("people");
        people.columns.push(ColumnDef::primary_id());
        people.columns.push(ColumnDef::new("name", ColumnType::String));
        people.columns.push(ColumnDef::new("email", ColumnType::String));
        let mut unique = IndexDef::new("people", &["email"]);
        unique.unique().named("unique_emails");
        people.indexes.push(unique);
        db.apply_schema_op(&SchemaOp::CreateTable { table: people }).unwrap();

        let mut addresses = TableDef::new("addresses");
        addresses.columns.push(ColumnDef::primary_id());
        addresses.columns.push(ColumnDef::new("name", ColumnType::String));
        let mut person_id = ColumnDef::new("person_id", ColumnType::BigInteger);
        person_id.not_null();
        addresses.columns.push(person_id);
        let mut fk = ForeignKeyDef::new("person_id", "people");
        fk.on_delete(on_delete);
        addresses.foreign_keys.push(fk);
        db.apply_schema_op(&SchemaOp::CreateTable { table: addresses }).unwrap();
        db
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        let first = db.insert("people", Row::new().with("name", "Ada")).unwrap();
        let second = db.insert("people", Row::new().with("name", "Grace")).unwrap();
        assert_eq!((first, second), (1, 2));
        let rows = db.select("people", &Filter::all()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get_string("name"), Ok(Some("Grace".to_string())));
        assert_eq!(rows[1].get_string("email"), Ok(None));
    }

    #[test]
    fn test_unique_index_rejects_duplicates_but_not_nulls() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        db.insert("people", Row::new().with("email", "a@b.com")).unwrap();
        let err = db
            .insert("people", Row::new().with("email", "a@b.com"))
            .unwrap_err();
        assert!(matches!(
            err,
            ShelfError::Constraint(ConstraintViolation::Unique { ref index, .. }) if index == "unique_emails"
        ));
        db.insert("people", Row::new()).unwrap();
        db.insert("people", Row::new()).unwrap();
        assert_eq!(db.row_count("people"), 3);
    }

    #[test]
    fn test_update_may_keep_its_own_unique_value() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        let id = db.insert("people", Row::new().with("email", "a@b.com")).unwrap();
        let affected = db
            .update("people", id, Row::new().with("email", "a@b.com").with("name", "Ada"))
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(db.update("people", 99, Row::new()).unwrap(), 0);
    }

    #[test]
    fn test_not_null_and_foreign_key_enforced_on_insert() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        let err = db.insert("addresses", Row::new().with("name", "Home")).unwrap_err();
        assert!(matches!(err, ShelfError::Constraint(ConstraintViolation::NotNull { .. })));

        let err = db
            .insert("addresses", Row::new().with("person_id", 42i64))
            .unwrap_err();
        assert!(matches!(err, ShelfError::Constraint(ConstraintViolation::ForeignKey { .. })));
    }

    #[test]
    fn test_restrict_blocks_delete_and_leaves_state_intact() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        let person = db.insert("people", Row::new().with("name", "X")).unwrap();
        db.insert("addresses", Row::new().with("person_id", person)).unwrap();
        let before = db.clone();

        let err = db.delete("people", &Filter::id(person)).unwrap_err();
        assert!(matches!(err, ShelfError::Constraint(ConstraintViolation::ForeignKey { .. })));
        assert_eq!(db, before);
    }

    #[test]
    fn test_cascade_removes_children() {
        let mut db = people_and_addresses(OnDelete::Cascade);
        let person = db.insert("people", Row::new().with("name", "X")).unwrap();
        db.insert("addresses", Row::new().with("person_id", person)).unwrap();
        db.insert("addresses", Row::new().with("person_id", person)).unwrap();

        assert_eq!(db.delete("people", &Filter::id(person)).unwrap(), 1);
        assert_eq!(db.row_count("addresses"), 0);
    }

    #[test]
    fn test_nullify_on_not_null_column_fails() {
        let mut db = people_and_addresses(OnDelete::Nullify);
        let person = db.insert("people", Row::new()).unwrap();
        db.insert("addresses", Row::new().with("person_id", person)).unwrap();
        let err = db.delete("people", &Filter::id(person)).unwrap_err();
        assert!(matches!(err, ShelfError::Constraint(ConstraintViolation::NotNull { .. })));
        assert_eq!(db.row_count("people"), 1);
    }

    #[test]
    fn test_rename_and_remove_column_carry_data() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        db.insert("people", Row::new().with("name", "Ada")).unwrap();
        db.apply_schema_op(&SchemaOp::RenameColumn {
            table: "people".to_string(),
            from: "name".to_string(),
            to: "full_name".to_string(),
        })
        .unwrap();
        let rows = db.select("people", &Filter::all()).unwrap();
        assert_eq!(rows[0].get_string("full_name"), Ok(Some("Ada".to_string())));

        db.apply_schema_op(&SchemaOp::RemoveColumn {
            table: "people".to_string(),
            column: "full_name".to_string(),
            definition: None,
        })
        .unwrap();
        let rows = db.select("people", &Filter::all()).unwrap();
        assert!(!rows[0].contains("full_name"));
    }

    #[test]
    fn test_not_null_column_cannot_be_added_to_populated_table() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        db.insert("people", Row::new()).unwrap();
        let mut column = ColumnDef::new("occupation", ColumnType::String);
        column.not_null();
        let err = db
            .apply_schema_op(&SchemaOp::AddColumn {
                table: "people".to_string(),
                column,
            })
            .unwrap_err();
        assert!(matches!(err, ShelfError::Constraint(ConstraintViolation::NotNull { .. })));
        assert!(!db.schema().table("people").unwrap().has_column("occupation"));
    }

    #[test]
    fn test_unique_index_over_duplicate_data_fails() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        db.insert("people", Row::new().with("name", "Ada")).unwrap();
        db.insert("people", Row::new().with("name", "Ada")).unwrap();
        let mut index = IndexDef::new("people", &["name"]);
        index.unique();
        let err = db
            .apply_schema_op(&SchemaOp::AddIndex {
                table: "people".to_string(),
                index,
            })
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_unknown_columns_are_rejected() {
        let mut db = people_and_addresses(OnDelete::Restrict);
        let err = db.insert("people", Row::new().with("age", 3i64)).unwrap_err();
        assert!(matches!(err, ShelfError::UnknownColumn { .. }));
        let err = db.select("people", &Filter::eq("age", 3i64)).unwrap_err();
        assert!(matches!(err, ShelfError::UnknownColumn { .. }));
        let err = db.select("ghosts", &Filter::all()).unwrap_err();
        assert!(matches!(err, ShelfError::UnknownTable(_)));
    }
}
