//! Column, index, foreign key and table definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ColumnType {
    String,
    Text,
    Integer,
    BigInteger,
    Decimal { precision: u32, scale: u32 },
    DateTime,
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::BigInteger => write!(f, "bigint"),
            ColumnType::Decimal { precision, scale } => {
                write!(f, "decimal({precision}, {scale})")
            }
            ColumnType::DateTime => write!(f, "datetime"),
            ColumnType::Boolean => write!(f, "boolean"),
        }
    }
}

/// A column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDef {
    /// Create a nullable column of the given type
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            auto_increment: false,
        }
    }

    /// The implicit `id bigint` auto-increment primary key
    #[must_use]
    pub fn primary_id() -> Self {
        Self {
            name: "id".to_string(),
            column_type: ColumnType::BigInteger,
            nullable: false,
            primary_key: true,
            auto_increment: true,
        }
    }

    /// Mark the column NOT NULL
    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    /// Mark the column nullable
    pub fn null(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }
}

/// An index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDef {
    /// Create a non-unique index with the conventional name for `table`
    pub fn new(table: &str, columns: &[&str]) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| (*c).to_string()).collect();
        Self {
            name: Self::default_name(table, &columns),
            columns,
            unique: false,
        }
    }

    /// Conventional index name: `index_{table}_on_{col}_and_{col}`
    pub fn default_name(table: &str, columns: &[String]) -> String {
        format!("index_{}_on_{}", table, columns.join("_and_"))
    }

    /// Enforce uniqueness over the indexed columns
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Override the index name
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }
}

/// What happens to referencing rows when the referenced row is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    /// Refuse the delete while referencing rows exist
    #[default]
    Restrict,
    /// Delete the referencing rows too
    Cascade,
    /// Set the referencing column to NULL
    Nullify,
}

/// A foreign key definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub column: String,
    pub to_table: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub on_delete: OnDelete,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl ForeignKeyDef {
    /// Reference `to_table.id` from `column`
    pub fn new(column: impl Into<String>, to_table: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            to_table: to_table.into(),
            primary_key: default_primary_key(),
            on_delete: OnDelete::Restrict,
        }
    }

    /// Set the delete behaviour
    pub fn on_delete(&mut self, action: OnDelete) -> &mut Self {
        self.on_delete = action;
        self
    }

    /// Constraint name used in dumps: `fk_{table}_{column}`
    pub fn constraint_name(&self, table: &str) -> String {
        format!("fk_{}_{}", table, self.column)
    }
}

/// A table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl TableDef {
    /// An empty table without columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.name == name)
    }

    pub fn foreign_key(&self, column: &str) -> Option<&ForeignKeyDef> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    /// Whether rows of this table carry an auto-increment `id`
    pub fn has_id(&self) -> bool {
        self.columns
            .iter()
            .any(|c| c.name == "id" && c.primary_key && c.auto_increment)
    }

    /// Unique indexes, in declaration order
    pub fn unique_indexes(&self) -> impl Iterator<Item = &IndexDef> {
        self.indexes.iter().filter(|i| i.unique)
    }
}
