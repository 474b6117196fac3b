//! Book record

use crate::active_model::{ActiveModelBehavior, ActiveModelTrait};
use crate::store::{Row, RowError};
use crate::validation::{Validation, ValidationErrors};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A book, optionally shelved in a library
///
/// Names must be at least three characters long and unique across all books.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Book {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub isbn: Option<String>,
    /// `decimal(5,2)`; the store rounds extra places and rejects values that overflow
    pub price: Option<Decimal>,
    pub library_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    errors: ValidationErrors,
}

impl Book {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl ActiveModelBehavior for Book {}

impl ActiveModelTrait for Book {
    const TABLE: &'static str = "books";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_row(&self) -> Row {
        let row = super::identified(self.id)
            .with("name", self.name.clone())
            .with("isbn", self.isbn.clone())
            .with("price", self.price)
            .with("library_id", self.library_id);
        super::with_timestamps(row, self.created_at, self.updated_at)
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
            isbn: row.get_string("isbn")?,
            price: row.get_decimal("price")?,
            library_id: row.get_i64("library_id")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
            errors: ValidationErrors::new(),
        })
    }

    fn validations() -> Vec<Validation> {
        vec![Validation::minimum("name", 3), Validation::uniqueness("name")]
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }
}
