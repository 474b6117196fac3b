//! `Row` - a column-name → value map with typed accessors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_query::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Decoding a row column into a Rust type failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("column \"{0}\" is missing from the row")]
    Missing(String),
    #[error("column \"{column}\" does not hold a {expected}")]
    WrongType { column: String, expected: &'static str },
}

/// One stored row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: BTreeMap<String, Value>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set)
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, column: &str) -> Result<&Value, RowError> {
        self.values
            .get(column)
            .ok_or_else(|| RowError::Missing(column.to_string()))
    }

    /// The row's primary key, if it has one
    pub fn id(&self) -> Option<i64> {
        self.get_i64("id").ok().flatten()
    }

    pub fn get_string(&self, column: &str) -> Result<Option<String>, RowError> {
        match self.require(column)? {
            Value::String(Some(s)) => Ok(Some(s.to_string())),
            Value::String(None) => Ok(None),
            _ => Err(RowError::WrongType {
                column: column.to_string(),
                expected: "string",
            }),
        }
    }

    pub fn get_i64(&self, column: &str) -> Result<Option<i64>, RowError> {
        match self.require(column)? {
            Value::BigInt(n) => Ok(*n),
            Value::Int(n) => Ok(n.map(i64::from)),
            _ => Err(RowError::WrongType {
                column: column.to_string(),
                expected: "integer",
            }),
        }
    }

    pub fn get_decimal(&self, column: &str) -> Result<Option<Decimal>, RowError> {
        match self.require(column)? {
            Value::Decimal(Some(d)) => Ok(Some(Decimal::clone(d))),
            Value::Decimal(None) => Ok(None),
            _ => Err(RowError::WrongType {
                column: column.to_string(),
                expected: "decimal",
            }),
        }
    }

    pub fn get_datetime(&self, column: &str) -> Result<Option<DateTime<Utc>>, RowError> {
        match self.require(column)? {
            Value::ChronoDateTimeUtc(Some(t)) => Ok(Some(DateTime::<Utc>::clone(t))),
            Value::ChronoDateTimeUtc(None) => Ok(None),
            _ => Err(RowError::WrongType {
                column: column.to_string(),
                expected: "timestamp",
            }),
        }
    }

    pub fn get_bool(&self, column: &str) -> Result<Option<bool>, RowError> {
        match self.require(column)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(RowError::WrongType {
                column: column.to_string(),
                expected: "boolean",
            }),
        }
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let row = Row::new()
            .with("id", 3i64)
            .with("name", "Dune")
            .with("library_id", Value::BigInt(None));
        assert_eq!(row.id(), Some(3));
        assert_eq!(row.get_string("name"), Ok(Some("Dune".to_string())));
        assert_eq!(row.get_i64("library_id"), Ok(None));
    }

    #[test]
    fn test_wrong_type_and_missing_column() {
        let row = Row::new().with("name", "Dune");
        assert!(matches!(
            row.get_i64("name"),
            Err(RowError::WrongType { expected: "integer", .. })
        ));
        assert_eq!(
            row.get_string("isbn"),
            Err(RowError::Missing("isbn".to_string()))
        );
    }
}
