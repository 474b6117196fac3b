//! Row filters
//!
//! A [`Filter`] is a conjunction of column equality predicates. It is all the
//! record layer needs: lookups by id, uniqueness probes and child lookups by
//! foreign key.

use crate::store::Row;
use sea_query::Value;

/// Conjunction of `column = value` predicates; the empty filter matches every row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Match every row
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match rows where `column = value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::all().and(column, value)
    }

    /// Match rows by primary key
    #[must_use]
    pub fn id(id: i64) -> Self {
        Self::eq("id", id)
    }

    /// Add another `column = value` predicate
    #[must_use]
    pub fn and(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    /// Columns this filter reads
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(|(c, _)| c.as_str())
    }

    /// Whether `row` satisfies every predicate
    ///
    /// NULL never equals anything, including another NULL.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|(column, expected)| {
            match row.get(column) {
                Some(actual) => {
                    !crate::value::is_null(actual)
                        && !crate::value::is_null(expected)
                        && values_equal(actual, expected)
                }
                None => false,
            }
        })
    }
}

/// Equality that ignores integer width, so `Int(1)` matches a stored `BigInt(1)`
fn values_equal(a: &Value, b: &Value) -> bool {
    match (as_i64(a), as_i64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::BigInt(Some(n)) => Some(*n),
        Value::Int(Some(n)) => Some(i64::from(*n)),
        Value::SmallInt(Some(n)) => Some(i64::from(*n)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: Option<&str>, person_id: i64) -> Row {
        let mut row = Row::new();
        row.set("name", Value::from(name.map(str::to_string)));
        row.set("person_id", Value::BigInt(Some(person_id)));
        row
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&row(Some("Home"), 1)));
    }

    #[test]
    fn test_conjunction() {
        let filter = Filter::eq("name", "Home").and("person_id", 2i64);
        assert!(filter.matches(&row(Some("Home"), 2)));
        assert!(!filter.matches(&row(Some("Home"), 3)));
        assert!(!filter.matches(&row(Some("Work"), 2)));
    }

    #[test]
    fn test_integer_width_is_ignored() {
        assert!(Filter::eq("person_id", 2i32).matches(&row(None, 2)));
    }

    #[test]
    fn test_null_never_matches() {
        let filter = Filter::eq("name", Value::String(None));
        assert!(!filter.matches(&row(None, 1)));
    }
}
