//! Null handling and column type conformance for `sea_query::Value`.

use crate::schema::{ColumnDef, ColumnType};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_query::Value;

/// Whether the value is any SQL NULL variant
#[must_use]
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::Decimal(None)
            | Value::ChronoDateTimeUtc(None)
    )
}

/// The NULL value stored for a column of this type
#[must_use]
pub fn null_of(column_type: ColumnType) -> Value {
    match column_type {
        ColumnType::String | ColumnType::Text => Value::String(None),
        ColumnType::Integer | ColumnType::BigInteger => Value::BigInt(None),
        ColumnType::Decimal { .. } => Value::Decimal(None),
        ColumnType::DateTime => Value::ChronoDateTimeUtc(None),
        ColumnType::Boolean => Value::Bool(None),
    }
}

/// Why a value was refused by [`conform`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nonconforming {
    /// The variant cannot represent the column type
    WrongType,
    /// A decimal has more integer digits than the precision allows
    Overflow,
}

/// Coerce `value` into the canonical representation for `column`
///
/// Integers of any width become `BigInt`; decimals are rounded to the column
/// scale and checked against its precision. NULLs are normalized to the
/// column's null variant; nullability itself is enforced by the store.
///
/// # Errors
///
/// Returns [`Nonconforming`] if the value cannot be stored in the column.
pub fn conform(value: Value, column: &ColumnDef) -> Result<Value, Nonconforming> {
    if is_null(&value) {
        return Ok(null_of(column.column_type));
    }
    match column.column_type {
        ColumnType::String | ColumnType::Text => match value {
            Value::String(Some(s)) => Ok(Value::from(s.to_string())),
            _ => Err(Nonconforming::WrongType),
        },
        ColumnType::Integer | ColumnType::BigInteger => match value {
            Value::TinyInt(Some(n)) => Ok(Value::BigInt(Some(i64::from(n)))),
            Value::SmallInt(Some(n)) => Ok(Value::BigInt(Some(i64::from(n)))),
            Value::Int(Some(n)) => Ok(Value::BigInt(Some(i64::from(n)))),
            Value::BigInt(Some(n)) => Ok(Value::BigInt(Some(n))),
            Value::TinyUnsigned(Some(n)) => Ok(Value::BigInt(Some(i64::from(n)))),
            Value::SmallUnsigned(Some(n)) => Ok(Value::BigInt(Some(i64::from(n)))),
            Value::Unsigned(Some(n)) => Ok(Value::BigInt(Some(i64::from(n)))),
            Value::BigUnsigned(Some(n)) => i64::try_from(n)
                .map(|n| Value::BigInt(Some(n)))
                .map_err(|_| Nonconforming::Overflow),
            _ => Err(Nonconforming::WrongType),
        },
        ColumnType::Decimal { precision, scale } => {
            let decimal = match value {
                Value::Decimal(Some(d)) => Decimal::clone(&d),
                Value::BigInt(Some(n)) => Decimal::from(n),
                Value::Int(Some(n)) => Decimal::from(n),
                _ => return Err(Nonconforming::WrongType),
            };
            fit_decimal(decimal, precision, scale).map(Value::from)
        }
        ColumnType::DateTime => match value {
            Value::ChronoDateTimeUtc(Some(t)) => Ok(Value::ChronoDateTimeUtc(Some(t))),
            _ => Err(Nonconforming::WrongType),
        },
        ColumnType::Boolean => match value {
            Value::Bool(Some(b)) => Ok(Value::Bool(Some(b))),
            _ => Err(Nonconforming::WrongType),
        },
    }
}

/// Round to `scale` and reject values with more than `precision - scale` integer digits
fn fit_decimal(value: Decimal, precision: u32, scale: u32) -> Result<Decimal, Nonconforming> {
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    let integer_digits = precision.saturating_sub(scale);
    if let Some(limit) = 10u64.checked_pow(integer_digits) {
        if rounded.abs() >= Decimal::from(limit) {
            return Err(Nonconforming::Overflow);
        }
    }
    Ok(rounded)
}
