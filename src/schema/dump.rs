//! Schema dumps
//!
//! A dump is a derived artifact: it is regenerated from the cumulative schema
//! after migrations run and is never edited by hand. Output is deterministic
//! (tables and indexes in name order, foreign keys in column order), so two
//! dumps of the same schema are byte-identical.

use super::types::{ColumnDef, ColumnType, OnDelete, TableDef};
use super::Schema;
use sea_query::{
    Alias, ColumnDef as SeaColumnDef, ForeignKey, ForeignKeyAction, Index,
    PostgresQueryBuilder, SchemaStatementBuilder, Table,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Output format of a schema dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaFormat {
    /// PostgreSQL DDL
    #[default]
    Sql,
    /// The schema model as pretty-printed JSON
    Json,
}

impl FromStr for SchemaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sql" => Ok(SchemaFormat::Sql),
            "json" => Ok(SchemaFormat::Json),
            other => Err(format!("unknown schema format '{other}' (expected sql or json)")),
        }
    }
}

#[derive(Serialize)]
struct SchemaDocument {
    version: Option<i64>,
    tables: Vec<TableDef>,
}

/// Render `schema` as of `version`, leaving out the `exclude`d tables
///
/// # Errors
///
/// Returns the `serde_json` error if the JSON rendering fails.
pub fn dump_schema(
    schema: &Schema,
    version: Option<i64>,
    format: SchemaFormat,
    exclude: &[&str],
) -> Result<String, serde_json::Error> {
    let tables = normalized_tables(schema, exclude);
    match format {
        SchemaFormat::Json => {
            let mut out = serde_json::to_string_pretty(&SchemaDocument { version, tables })?;
            out.push('\n');
            Ok(out)
        }
        SchemaFormat::Sql => Ok(render_sql(&tables, version)),
    }
}

fn normalized_tables(schema: &Schema, exclude: &[&str]) -> Vec<TableDef> {
    schema
        .tables
        .values()
        .filter(|t| !exclude.contains(&t.name.as_str()))
        .map(|t| {
            let mut table = t.clone();
            table.indexes.sort_by(|a, b| a.name.cmp(&b.name));
            table.foreign_keys.sort_by(|a, b| a.column.cmp(&b.column));
            table
        })
        .collect()
}

fn render_sql(tables: &[TableDef], version: Option<i64>) -> String {
    let mut lines = vec![
        "-- This file is generated from the applied migrations. Do not edit it by hand.".to_string(),
        match version {
            Some(version) => format!("-- version: {version}"),
            None => "-- version: none".to_string(),
        },
    ];

    for table in tables {
        lines.push(String::new());
        lines.push(format!("{};", create_table_statement(table)));
        for index in &table.indexes {
            let mut stmt = Index::create();
            stmt.name(index.name.as_str()).table(Alias::new(table.name.as_str()));
            for column in &index.columns {
                stmt.col(Alias::new(column.as_str()));
            }
            if index.unique {
                stmt.unique();
            }
            lines.push(format!("{};", stmt.build(PostgresQueryBuilder)));
        }
    }

    let foreign_keys: Vec<_> = tables
        .iter()
        .flat_map(|t| t.foreign_keys.iter().map(move |fk| (t, fk)))
        .collect();
    if !foreign_keys.is_empty() {
        lines.push(String::new());
    }
    for (table, fk) in foreign_keys {
        let stmt = ForeignKey::create()
            .name(fk.constraint_name(&table.name).as_str())
            .from(Alias::new(table.name.as_str()), Alias::new(fk.column.as_str()))
            .to(Alias::new(fk.to_table.as_str()), Alias::new(fk.primary_key.as_str()))
            .on_delete(foreign_key_action(fk.on_delete))
            .to_owned();
        lines.push(format!("{};", stmt.build(PostgresQueryBuilder)));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn create_table_statement(table: &TableDef) -> String {
    let mut stmt = Table::create();
    stmt.table(Alias::new(table.name.as_str()));
    for column in &table.columns {
        stmt.col(sea_column(column));
    }
    stmt.build(PostgresQueryBuilder)
}

fn sea_column(column: &ColumnDef) -> SeaColumnDef {
    let mut def = SeaColumnDef::new(Alias::new(column.name.as_str()));
    match column.column_type {
        ColumnType::String => def.string(),
        ColumnType::Text => def.text(),
        ColumnType::Integer => def.integer(),
        ColumnType::BigInteger => def.big_integer(),
        ColumnType::Decimal { precision, scale } => def.decimal_len(precision, scale),
        ColumnType::DateTime => def.timestamp(),
        ColumnType::Boolean => def.boolean(),
    };
    if !column.nullable {
        def.not_null();
    }
    if column.auto_increment {
        def.auto_increment();
    }
    if column.primary_key {
        def.primary_key();
    }
    def
}

fn foreign_key_action(on_delete: OnDelete) -> ForeignKeyAction {
    match on_delete {
        OnDelete::Restrict => ForeignKeyAction::Restrict,
        OnDelete::Cascade => ForeignKeyAction::Cascade,
        OnDelete::Nullify => ForeignKeyAction::SetNull,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ForeignKeyDef, IndexDef, SchemaOp};

    fn library_schema() -> Schema {
        let mut schema = Schema::new();
        let mut people = TableDef::new("people");
        people.columns.push(ColumnDef::primary_id());
        people.columns.push(ColumnDef::new("name", ColumnType::String));
        people.columns.push(ColumnDef::new("email", ColumnType::String));
        people.indexes.push(IndexDef::new("people", &["name"]));
        let mut unique = IndexDef::new("people", &["email"]);
        unique.unique().named("unique_emails");
        people.indexes.push(unique);
        schema.apply(&SchemaOp::CreateTable { table: people }).unwrap();

        let mut addresses = TableDef::new("addresses");
        addresses.columns.push(ColumnDef::primary_id());
        let mut person_id = ColumnDef::new("person_id", ColumnType::BigInteger);
        person_id.not_null();
        addresses.columns.push(person_id);
        addresses
            .foreign_keys
            .push(ForeignKeyDef::new("person_id", "people"));
        schema.apply(&SchemaOp::CreateTable { table: addresses }).unwrap();
        schema
    }

    #[test]
    fn test_sql_dump_is_deterministic() {
        let schema = library_schema();
        let first = dump_schema(&schema, Some(20230427084023), SchemaFormat::Sql, &[]).unwrap();
        let second = dump_schema(&schema, Some(20230427084023), SchemaFormat::Sql, &[]).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("-- version: 20230427084023"));
        assert!(first.contains("unique_emails"));
        assert!(first.contains("fk_addresses_person_id"));
        // addresses sorts before people
        let addresses = first.find("\"addresses\"").unwrap();
        let people = first.find("CREATE TABLE \"people\"").unwrap();
        assert!(addresses < people);
    }

    #[test]
    fn test_sql_dump_layout() {
        let empty = dump_schema(&Schema::default(), None, SchemaFormat::Sql, &[]).unwrap();
        assert_eq!(
            empty,
            "-- This file is generated from the applied migrations. Do not edit it by hand.\n\
             -- version: none\n"
        );

        let sql = dump_schema(&library_schema(), Some(1), SchemaFormat::Sql, &[]).unwrap();
        assert!(sql.contains("-- version: 1\n\nCREATE TABLE \"addresses\""));
        assert!(sql.ends_with(";\n"));
    }

    #[test]
    fn test_json_dump_excludes_internal_tables() {
        let schema = library_schema();
        let json = dump_schema(&schema, None, SchemaFormat::Json, &["addresses"]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let tables = parsed["tables"].as_array().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0]["name"], "people");
        // indexes come out in name order
        assert_eq!(tables[0]["indexes"][0]["name"], "index_people_on_name");
        assert_eq!(tables[0]["indexes"][1]["name"], "unique_emails");
    }

    #[test]
    fn test_format_parses_case_insensitively() {
        assert_eq!("SQL".parse::<SchemaFormat>(), Ok(SchemaFormat::Sql));
        assert_eq!("json".parse::<SchemaFormat>(), Ok(SchemaFormat::Json));
        assert!("yaml".parse::<SchemaFormat>().is_err());
    }
}
