//! User record

use crate::active_model::{ActiveModelBehavior, ActiveModelTrait};
use crate::store::{Row, RowError};
use crate::validation::{Validation, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user; `name` must be present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct User {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub occupation: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    errors: ValidationErrors,
}

impl User {
    pub fn new(name: impl Into<String>, occupation: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            occupation: Some(occupation.into()),
            ..Self::default()
        }
    }
}

impl ActiveModelBehavior for User {}

impl ActiveModelTrait for User {
    const TABLE: &'static str = "users";

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_row(&self) -> Row {
        let row = super::identified(self.id)
            .with("name", self.name.clone())
            .with("occupation", self.occupation.clone());
        super::with_timestamps(row, self.created_at, self.updated_at)
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
            occupation: row.get_string("occupation")?,
            created_at: row.get_datetime("created_at")?,
            updated_at: row.get_datetime("updated_at")?,
            errors: ValidationErrors::new(),
        })
    }

    fn validations() -> Vec<Validation> {
        vec![Validation::presence("name")]
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
    use crate::active_model::ActiveModelError;
    use crate::models::testing::migrated_store;
    use serde_json::json;

    #[test]
    fn test_blank_name_fails_save() {
        let store = migrated_store();
        for blank in [None, Some("")] {
            let mut user = User {
                name: blank.map(str::to_string),
                ..User::default()
            };
            assert!(!user.save(&store).unwrap());
            assert_eq!(user.errors().full_messages(), vec!["Name can't be blank"]);
        }
        assert!(User::all(&store).unwrap().is_empty());
    }

    #[test]
    fn test_any_name_saves() {
        let store = migrated_store();
        for name in ["A", "Ada Lovelace", "李", " "] {
            let mut user = User::new(name, "engineer");
            assert!(user.save(&store).unwrap(), "{name} should save");
        }
        // Presence does not imply uniqueness
        assert!(User::new("A", "pilot").save(&store).unwrap());
        assert_eq!(User::all(&store).unwrap().len(), 5);
    }

    #[test]
    fn test_save_strict_raises() {
        let store = migrated_store();
        let err = User::default().save_strict(&store).unwrap_err();
        match err {
            ActiveModelError::Validation(errors) => assert_eq!(errors.on("name"), vec!["can't be blank"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_update_revalidates() {
        let store = migrated_store();
        let user = User::create(&store, json!({ "name": "Grace", "occupation": "admiral" })).unwrap();
        let id = user.id.unwrap();

        let err = User::update(&store, id, json!({ "name": "" })).unwrap_err();
        assert!(err.validation_errors().is_some());

        let updated = User::update(&store, id, json!({ "occupation": "scientist" })).unwrap();
        assert_eq!(updated.name.as_deref(), Some("Grace"));
        assert_eq!(updated.occupation.as_deref(), Some("scientist"));
    }
}
