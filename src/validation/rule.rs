//! Declarative validation rules

/// What a [`Validation`] checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Not null, and not empty when a string
    Presence,
    /// Character count bounds, both inclusive
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// No other stored row shares the value (and the `scope` columns)
    Uniqueness { scope: Vec<String> },
    /// The field holds the id of an existing row in `table`
    BelongsTo { table: String },
}

/// One rule bound to one field
///
/// A record declares an ordered list of these; they are all evaluated and
/// every failure is collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub field: String,
    pub rule: Rule,
}

impl Validation {
    pub fn new(field: impl Into<String>, rule: Rule) -> Self {
        Self {
            field: field.into(),
            rule,
        }
    }

    pub fn presence(field: impl Into<String>) -> Self {
        Self::new(field, Rule::Presence)
    }

    pub fn length(field: impl Into<String>, min: Option<usize>, max: Option<usize>) -> Self {
        Self::new(field, Rule::Length { min, max })
    }

    pub fn minimum(field: impl Into<String>, min: usize) -> Self {
        Self::length(field, Some(min), None)
    }

    pub fn maximum(field: impl Into<String>, max: usize) -> Self {
        Self::length(field, None, Some(max))
    }

    /// Unique across the whole table
    pub fn uniqueness(field: impl Into<String>) -> Self {
        Self::new(field, Rule::Uniqueness { scope: Vec::new() })
    }

    /// `{association}_id` must reference a stored row of `table`
    pub fn belongs_to(association: &str, table: impl Into<String>) -> Self {
        Self::new(format!("{association}_id"), Rule::BelongsTo { table: table.into() })
    }

    /// Unique among rows that share the `scope` columns
    pub fn uniqueness_scoped(field: impl Into<String>, scope: &[&str]) -> Self {
        Self::new(
            field,
            Rule::Uniqueness {
                scope: scope.iter().map(|s| s.to_string()).collect(),
            },
        )
    }
}
