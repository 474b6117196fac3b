//! Address record

use crate::active_model::{ActiveModelBehavior, ActiveModelTrait};
use crate::store::{Row, RowError};
use crate::validation::{Validation, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An address, owned by exactly one person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Address {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub person_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    errors: ValidationErrors,
}

impl Address {
    pub fn new(name: impl Into<String>, person_id: i64) -> Self {
        Self {
            name: Some(name.into()),
            person_id: Some(person_id),
            ..Self::default()
        }
    }

    /// A blank address for `person_id`, filled in by nested attributes
    pub(crate) fn owned_by(person_id: i64) -> Self {
        Self {
            person_id: Some(person_id),
            ..Self::default()
        }
    }
}

impl ActiveModelBehavior for Address {}

impl ActiveModelTrait for Address {
    const TABLE: &'static str = "addresses";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_row(&self) -> Row {
        let row = super::identified(self.id)
            .with("name", self.name.clone())
            .with("person_id", self.person_id);
        super::with_timestamps(row, self.created_at, self.updated_at)
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
            person_id: row.get_i64("person_id")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
            errors: ValidationErrors::new(),
        })
    }

    fn validations() -> Vec<Validation> {
        vec![Validation::belongs_to("person", "people")]
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
    use crate::executor::ConstraintViolation;
    use crate::models::testing::migrated_store;
    use crate::ShelfExecutor;
    use serde_json::json;

    #[test]
    fn test_owner_is_required() {
        let store = migrated_store();
        let mut orphan = Address {
            name: Some("Nowhere".to_string()),
            ..Address::default()
        };
        assert!(!orphan.save(&store).unwrap());
        assert_eq!(orphan.errors().full_messages(), vec!["Person must exist"]);
    }

    #[test]
    fn test_owner_must_exist() {
        let store = migrated_store();
        let err = Address::create(&store, json!({ "name": "Nowhere", "person_id": 42 })).unwrap_err();
        assert_eq!(err.validation_errors().unwrap().on("person_id"), vec!["must exist"]);

        let direct = store.insert("addresses", Row::new().with("name", "Nowhere").with("person_id", 42i64));
        assert!(matches!(
            direct.unwrap_err().constraint(),
            Some(ConstraintViolation::ForeignKey { .. })
        ));
    }
}
