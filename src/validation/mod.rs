//! Record validation
//!
//! Rules are declared per record type as an ordered list of [`Validation`]s
//! and evaluated against the record's row form. Evaluation never stops at
//! the first failure: every failing rule is reported.
//!
//! Uniqueness is checked by reading the current contents of the store. That
//! check is only as strong as the store's isolation; the unique index on the
//! column remains the final guard, and a write that slips past validation is
//! rejected by the store as a constraint violation instead.

pub mod errors;
pub mod rule;

pub use errors::{FailureKind, ValidationErrors, ValidationFailure};
pub use rule::{Rule, Validation};

use crate::executor::{ShelfError, ShelfExecutor};
use crate::query::Filter;
use crate::store::Row;
use crate::value::is_null;
use sea_query::Value;

/// Evaluate `validations` against `row`, which is (or will be) stored in `table`
///
/// # Errors
///
/// Returns `ShelfError` only if a uniqueness or association lookup cannot
/// read the store;
/// rule failures are reported in the returned [`ValidationErrors`].
pub fn validate_row(
    executor: &dyn ShelfExecutor,
    table: &str,
    row: &Row,
    validations: &[Validation],
) -> Result<ValidationErrors, ShelfError> {
    let mut errors = ValidationErrors::new();
    for validation in validations {
        let value = row.get(&validation.field);
        if let Some(kind) = check(executor, table, row, validation, value)? {
            errors.add(validation.field.clone(), kind);
        }
    }
    Ok(errors)
}

fn check(
    executor: &dyn ShelfExecutor,
    table: &str,
    row: &Row,
    validation: &Validation,
    value: Option<&Value>,
) -> Result<Option<FailureKind>, ShelfError> {
    let failure = match &validation.rule {
        Rule::Presence => is_blank(value).then_some(FailureKind::Blank),
        Rule::Length { min, max } => {
            let length = text(value).map_or(0, |s| s.chars().count());
            match (min, max) {
                (Some(minimum), _) if length < *minimum => Some(FailureKind::TooShort { minimum: *minimum }),
                (_, Some(maximum)) if length > *maximum => Some(FailureKind::TooLong { maximum: *maximum }),
                _ => None,
            }
        }
        Rule::Uniqueness { scope } => match value {
            Some(value) if !is_null(value) => {
                let mut filter = Filter::eq(validation.field.as_str(), value.clone());
                for column in scope {
                    let scoped = row.get(column).cloned().unwrap_or(Value::String(None));
                    filter = filter.and(column.as_str(), scoped);
                }
                let own_id = row.id();
                let taken = executor
                    .select(table, &filter)?
                    .iter()
                    .any(|other| own_id.is_none() || other.id() != own_id);
                taken.then_some(FailureKind::Taken)
            }
            _ => None,
        },
        Rule::BelongsTo { table: referenced } => match row.get_i64(&validation.field).ok().flatten() {
            Some(id) => executor
                .select(referenced, &Filter::id(id))?
                .is_empty()
                .then_some(FailureKind::MustExist),
            None => Some(FailureKind::MustExist),
        },
    };
    Ok(failure)
}

fn text(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(Some(s))) => Some(s.as_str()),
        _ => None,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::String(Some(s))) => s.is_empty(),
        Some(v) => is_null(v),
    }
}
