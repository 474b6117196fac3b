//! Person record, its addresses and its cars

use crate::active_model::{ActiveModelBehavior, ActiveModelError, ActiveModelTrait};
use crate::executor::ShelfExecutor;
use crate::models::{car, Address, Car};
use crate::query::Filter;
use crate::store::{Row, RowError};
use crate::validation::{Validation, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Link table between people and cars
pub(crate) const CARS_PEOPLE: &str = "cars_people";

/// A person
///
/// Destroying a person destroys their addresses and unlinks their cars in
/// the same transaction. `email` is guarded only by the `unique_emails`
/// index, so a duplicate surfaces as a storage constraint violation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Person {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(skip)]
    errors: ValidationErrors,
}

/// One entry of a nested address batch
///
/// Without `id` a new address is created; with `id` the address is updated,
/// or destroyed when `_destroy` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AddressAttributes {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(rename = "_destroy")]
    pub destroy: bool,
}

impl AddressAttributes {
    pub fn create(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn update(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
            destroy: false,
        }
    }

    pub fn destroy(id: i64) -> Self {
        Self {
            id: Some(id),
            name: None,
            destroy: true,
        }
    }
}

impl Person {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            ..Self::default()
        }
    }

    fn persisted_id(&self) -> Result<i64, ActiveModelError> {
        self.id.ok_or(ActiveModelError::NotPersisted(Self::TABLE))
    }

    /// This person's addresses, ordered by id
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::NotPersisted` for an unsaved person.
    pub fn addresses(&self, executor: &dyn ShelfExecutor) -> Result<Vec<Address>, ActiveModelError> {
        let id = self.persisted_id()?;
        Address::find_by(executor, &Filter::eq("person_id", id))
    }

    /// Save this person together with a batch of address changes
    ///
    /// The person and every nested address are validated and written in one
    /// transaction. If any of them is invalid nothing is written, this
    /// person is left as it was, and the failures are reported on
    /// [`errors`](ActiveModelTrait::errors) (nested ones as `addresses.{field}`).
    ///
    /// # Returns
    ///
    /// `Ok(false)` on a validation failure.
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::RecordNotFound` if a nested id is not one of
    /// this person's addresses, or a storage error. Either way the whole batch
    /// is rolled back.
    pub fn save_with_addresses(
        &mut self,
        executor: &dyn ShelfExecutor,
        nested: &[AddressAttributes],
    ) -> Result<bool, ActiveModelError> {
        let mut draft = self.clone();
        let tx = executor.begin()?;
        let failures = draft.write_batch(&tx, nested)?;
        if !failures.is_empty() {
            tx.rollback()?;
            log::debug!("people batch not saved: {failures}");
            *self.errors_mut() = failures;
            return Ok(false);
        }
        tx.commit()?;
        *self = draft;
        Ok(true)
    }

    fn write_batch(
        &mut self,
        executor: &dyn ShelfExecutor,
        nested: &[AddressAttributes],
    ) -> Result<ValidationErrors, ActiveModelError> {
        if !self.save(executor)? {
            return Ok(self.errors().clone());
        }
        let person_id = self.persisted_id()?;

        let mut failures = ValidationErrors::new();
        for attributes in nested {
            let mut address = match attributes.id {
                Some(id) => self.owned_address(executor, id)?,
                // A new record marked for destruction is simply skipped
                None if attributes.destroy => continue,
                None => Address::owned_by(person_id),
            };

            if attributes.destroy {
                if let Some(id) = address.id {
                    Address::destroy(executor, id)?;
                }
                continue;
            }
            if let Some(name) = &attributes.name {
                address.name = Some(name.clone());
            }
            if !address.save(executor)? {
                for failure in address.errors().failures() {
                    failures.add(format!("addresses.{}", failure.field), failure.kind.clone());
                }
            }
        }
        Ok(failures)
    }

    fn owned_address(&self, executor: &dyn ShelfExecutor, id: i64) -> Result<Address, ActiveModelError> {
        let address = Address::find(executor, id)?;
        if address.person_id == self.id {
            Ok(address)
        } else {
            Err(ActiveModelError::RecordNotFound { table: Address::TABLE, id })
        }
    }

    /// Cars linked to this person, ordered by id
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::NotPersisted` for an unsaved person.
    pub fn cars(&self, executor: &dyn ShelfExecutor) -> Result<Vec<Car>, ActiveModelError> {
        let id = self.persisted_id()?;
        let mut ids = car::linked_ids(executor, "person_id", id, "car_id")?;
        ids.sort_unstable();
        ids.into_iter().map(|id| Car::find(executor, id)).collect()
    }

    /// Link a car to this person
    ///
    /// # Returns
    ///
    /// `false` if the link already existed.
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::RecordNotFound` if the car does not exist.
    pub fn add_car(&self, executor: &dyn ShelfExecutor, car_id: i64) -> Result<bool, ActiveModelError> {
        let id = self.persisted_id()?;
        Car::find(executor, car_id)?;
        if !executor.select(CARS_PEOPLE, &link(id, car_id))?.is_empty() {
            return Ok(false);
        }
        executor.insert(CARS_PEOPLE, Row::new().with("person_id", id).with("car_id", car_id))?;
        Ok(true)
    }

    /// Unlink a car from this person
    ///
    /// # Returns
    ///
    /// `false` if they were not linked.
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::NotPersisted` for an unsaved person.
    pub fn remove_car(&self, executor: &dyn ShelfExecutor, car_id: i64) -> Result<bool, ActiveModelError> {
        let id = self.persisted_id()?;
        Ok(executor.delete(CARS_PEOPLE, &link(id, car_id))? > 0)
    }
}

fn link(person_id: i64, car_id: i64) -> Filter {
    Filter::eq("person_id", person_id).and("car_id", car_id)
}

impl ActiveModelBehavior for Person {
    fn before_destroy(&self, executor: &dyn ShelfExecutor) -> Result<(), ActiveModelError> {
        for address in self.addresses(executor)? {
            if let Some(id) = address.id {
                Address::destroy(executor, id)?;
            }
        }
        executor.delete(CARS_PEOPLE, &Filter::eq("person_id", self.persisted_id()?))?;
        Ok(())
    }
}

impl ActiveModelTrait for Person {
    const TABLE: &'static str = "people";
    const TIMESTAMPS: bool = false;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn to_row(&self) -> Row {
        super::identified(self.id)
            .with("name", self.name.clone())
            .with("email", self.email.clone())
    }

    fn from_row(row: &Row) -> Result<Self, RowError> {
        Ok(Self {
            id: row.get_i64("id")?,
            name: row.get_string("name")?,
            email: row.get_string("email")?,
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
