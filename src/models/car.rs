//! Car record

use crate::active_model::{ActiveModelBehavior, ActiveModelError, ActiveModelTrait};
use crate::executor::ShelfExecutor;
use crate::models::Person;
use crate::query::Filter;
use crate::store::{Row, RowError};
use crate::validation::{Validation, ValidationErrors};
use serde::{Deserialize, Serialize};

/// A car; linked to people through `cars_people`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Car {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(skip)]
    errors: ValidationErrors,
}

impl Car {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// People linked to this car, ordered by id
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::NotPersisted` for an unsaved car.
    pub fn people(&self, executor: &dyn ShelfExecutor) -> Result<Vec<Person>, ActiveModelError> {
        let id = self.id.ok_or(ActiveModelError::NotPersisted(Self::TABLE))?;
        let mut ids = linked_ids(executor, "car_id", id, "person_id")?;
        ids.sort_unstable();
        ids.into_iter().map(|id| Person::find(executor, id)).collect()
    }
}

/// Ids on the `wanted` side of `cars_people` rows where `column = id`
pub(crate) fn linked_ids(
    executor: &dyn ShelfExecutor,
    column: &str,
    id: i64,
    wanted: &str,
) -> Result<Vec<i64>, ActiveModelError> {
    executor
        .select(super::person::CARS_PEOPLE, &Filter::eq(column, id))?
        .iter()
        .filter_map(|row| row.get_i64(wanted).transpose())
        .collect::<Result<Vec<_>, _>>()
        .map_err(ActiveModelError::from)
}

impl ActiveModelBehavior for Car {
    fn before_destroy(&self, executor: &dyn ShelfExecutor) -> Result<(), ActiveModelError> {
        if let Some(id) = self.id {
            executor.delete(super::person::CARS_PEOPLE, &Filter::eq("car_id", id))?;
        }
        Ok(())
    }
}

impl ActiveModelTrait for Car {
    const TABLE: &'static str = "cars";
    const TIMESTAMPS: bool = false;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_row(&self) -> Row {
        super::identified(self.id).with("name", self.name.clone())
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
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
