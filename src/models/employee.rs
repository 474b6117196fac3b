//! Employee record

use crate::active_model::{ActiveModelBehavior, ActiveModelTrait};
use crate::store::{Row, RowError};
use crate::validation::{Validation, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Employee {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub designation: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    errors: ValidationErrors,
}

impl Employee {
    pub fn new(name: impl Into<String>, designation: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            designation: Some(designation.into()),
            ..Self::default()
        }
    }
}

impl ActiveModelBehavior for Employee {}

impl ActiveModelTrait for Employee {
    const TABLE: &'static str = "employees";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_row(&self) -> Row {
        let row = super::identified(self.id)
            .with("name", self.name.clone())
            .with("designation", self.designation.clone());
        super::with_timestamps(row, self.created_at, self.updated_at)
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
            designation: row.get_string("designation")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
            errors: ValidationErrors::new(),
        })
    }

    fn validations() -> Vec<Validation> {
        Vec::new()
    }

    fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::migrated_store;
    use crate::query::Filter;

    #[test]
    fn test_lookup_by_name() {
        let store = migrated_store();
        Employee::new("Linus", "maintainer").save_strict(&store).unwrap();
        Employee::new("Margaret", "director").save_strict(&store).unwrap();

        let found = Employee::find_by(&store, &Filter::eq("name", "Margaret")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].designation.as_deref(), Some("director"));
    }
}
