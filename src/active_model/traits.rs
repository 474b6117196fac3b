//! Core traits for ActiveModel operations.
//!
//! This module provides `ActiveModelTrait` and `ActiveModelBehavior`: typed
//! records that know their table, their row form and their validation rules,
//! and get CRUD operations plus lifecycle hooks on top of any
//! [`ShelfExecutor`].

use super::error::ActiveModelError;
use crate::executor::ShelfExecutor;
use crate::query::Filter;
use crate::store::{Row, RowError};
use crate::validation::{validate_row, Validation, ValidationErrors};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

/// Attributes the record layer manages itself; mass assignment ignores them
const RESERVED_ATTRIBUTES: [&str; 3] = ["id", "created_at", "updated_at"];

/// Trait for ActiveModel operations
///
/// Implementors are plain structs mirroring one table. They provide the row
/// conversion and the ordered validation list; everything else is provided.
///
/// # Example
///
/// ```no_run
/// use shelfwise::models::Book;
/// use shelfwise::{ActiveModelTrait, MemoryStore};
///
/// # fn main() -> Result<(), shelfwise::ActiveModelError> {
/// let store = MemoryStore::new();
/// let mut book = Book::new("AB");
/// if !book.save(&store)? {
///     println!("{:?}", book.errors().full_messages());
/// }
/// # Ok(())
/// # }
/// ```
pub trait ActiveModelTrait:
    ActiveModelBehavior + Clone + std::fmt::Debug + Serialize + DeserializeOwned
{
    /// Table the record is stored in
    const TABLE: &'static str;

    /// Whether the table carries `created_at`/`updated_at`
    const TIMESTAMPS: bool = true;

    /// Primary key, `None` until the record is first saved
    fn id(&self) -> Option<i64>;

    /// Row form of the record, including `id` when set
    fn to_row(&self) -> Row;

    /// Decode a stored row
    ///
    /// # Errors
    ///
    /// Returns `RowError` if a column is missing or holds the wrong type.
    fn from_row(row: &Row) -> Result<Self, RowError>;

    /// Ordered validation rules
    fn validations() -> Vec<Validation>;

    /// Failures from the last validation pass
    fn errors(&self) -> &ValidationErrors;

    fn errors_mut(&mut self) -> &mut ValidationErrors;

    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }

    /// Run every validation rule, replacing [`errors`](Self::errors)
    ///
    /// # Returns
    ///
    /// `true` when no rule failed.
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::Storage` if a uniqueness probe cannot read the store.
    fn validate(&mut self, executor: &dyn ShelfExecutor) -> Result<bool, ActiveModelError> {
        let errors = validate_row(executor, Self::TABLE, &self.to_row(), &Self::validations())?;
        let valid = errors.is_empty();
        *self.errors_mut() = errors;
        Ok(valid)
    }

    /// Validate, then insert or update the record
    ///
    /// On success the record is reloaded from the store, so `id` and the
    /// timestamps reflect what was written.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if validation failed; nothing is written in that case and
    /// the failures are available from [`errors`](Self::errors).
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::Storage` if the store rejects the write,
    /// including constraint violations that validation did not catch.
    fn save(&mut self, executor: &dyn ShelfExecutor) -> Result<bool, ActiveModelError> {
        self.before_save()?;
        if !self.validate(executor)? {
            log::debug!("{} not saved: {}", Self::TABLE, self.errors());
            return Ok(false);
        }

        let mut row = self.to_row();
        row.remove("id");
        if Self::TIMESTAMPS {
            let now = Utc::now();
            if !self.is_persisted() || row.get_datetime("created_at").ok().flatten().is_none() {
                row.set("created_at", now);
            }
            row.set("updated_at", now);
        }

        let id = match self.id() {
            Some(id) => {
                if executor.update(Self::TABLE, id, row)? == 0 {
                    return Err(ActiveModelError::RecordNotFound { table: Self::TABLE, id });
                }
                id
            }
            None => executor.insert(Self::TABLE, row)?,
        };
        log::debug!("{} {id} saved", Self::TABLE);

        *self = Self::find(executor, id)?;
        self.after_save()?;
        Ok(true)
    }

    /// Like [`save`](Self::save), but a validation failure is an error
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::Validation` with the failures, or any error
    /// [`save`](Self::save) returns.
    fn save_strict(&mut self, executor: &dyn ShelfExecutor) -> Result<(), ActiveModelError> {
        if self.save(executor)? {
            Ok(())
        } else {
            Err(ActiveModelError::Validation(self.errors().clone()))
        }
    }

    /// Load the record with this id
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::RecordNotFound` if there is no such row.
    fn find(executor: &dyn ShelfExecutor, id: i64) -> Result<Self, ActiveModelError> {
        let rows = executor.select(Self::TABLE, &Filter::id(id))?;
        match rows.first() {
            Some(row) => Ok(Self::from_row(row)?),
            None => Err(ActiveModelError::RecordNotFound { table: Self::TABLE, id }),
        }
    }

    /// Load every record, ordered by id
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError` if the table cannot be read or a row is malformed.
    fn all(executor: &dyn ShelfExecutor) -> Result<Vec<Self>, ActiveModelError> {
        Self::find_by(executor, &Filter::all())
    }

    /// Load every record matching `filter`, ordered by id
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError` if the table cannot be read or a row is malformed.
    fn find_by(executor: &dyn ShelfExecutor, filter: &Filter) -> Result<Vec<Self>, ActiveModelError> {
        executor
            .select(Self::TABLE, filter)?
            .iter()
            .map(|row| Self::from_row(row).map_err(ActiveModelError::from))
            .collect()
    }

    /// Build a record from a JSON object of attributes and save it
    ///
    /// `id` and timestamp attributes are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::InvalidAttributes` for attributes that do not
    /// fit the record, `ActiveModelError::Validation` if the record is invalid,
    /// or a storage error.
    fn create(executor: &dyn ShelfExecutor, attributes: JsonValue) -> Result<Self, ActiveModelError> {
        let mut record: Self = serde_json::from_value(JsonValue::Object(assignable(attributes)?))?;
        record.save_strict(executor)?;
        Ok(record)
    }

    /// Assign a JSON object of attributes to the stored record and save it
    ///
    /// Attributes not mentioned keep their stored values.
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::RecordNotFound`, `InvalidAttributes`,
    /// `Validation`, or a storage error.
    fn update(executor: &dyn ShelfExecutor, id: i64, attributes: JsonValue) -> Result<Self, ActiveModelError> {
        let current = Self::find(executor, id)?;
        let mut merged = match serde_json::to_value(&current)? {
            JsonValue::Object(map) => map,
            _ => return Err(ActiveModelError::InvalidAttributes(format!("{} is not an object", Self::TABLE))),
        };
        merged.extend(assignable(attributes)?);

        let mut record: Self = serde_json::from_value(JsonValue::Object(merged))?;
        record.save_strict(executor)?;
        Ok(record)
    }

    /// Delete the record with this id, returning it
    ///
    /// [`before_destroy`](ActiveModelBehavior::before_destroy) runs in the same
    /// transaction as the delete, so dependent cleanup and the delete commit
    /// or roll back together.
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::RecordNotFound`, an error from the hook, or a
    /// storage error such as a restricting foreign key.
    fn destroy(executor: &dyn ShelfExecutor, id: i64) -> Result<Self, ActiveModelError> {
        let record = Self::find(executor, id)?;
        let tx = executor.begin()?;
        record.before_destroy(&tx)?;
        tx.delete(Self::TABLE, &Filter::id(id))?;
        tx.commit()?;
        log::debug!("{} {id} destroyed", Self::TABLE);
        Ok(record)
    }

    /// JSON form of the record
    ///
    /// # Errors
    ///
    /// Returns `ActiveModelError::InvalidAttributes` if serialization fails.
    fn to_json(&self) -> Result<JsonValue, ActiveModelError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Strip reserved keys from a JSON object of attributes
fn assignable(attributes: JsonValue) -> Result<Map<String, JsonValue>, ActiveModelError> {
    match attributes {
        JsonValue::Object(mut map) => {
            for key in RESERVED_ATTRIBUTES {
                map.remove(key);
            }
            Ok(map)
        }
        other => Err(ActiveModelError::InvalidAttributes(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// ActiveModelBehavior trait for lifecycle hooks
///
/// Every hook defaults to a no-op. A failing hook aborts the operation.
///
/// # Example
///
/// ```no_run
/// use shelfwise::{ActiveModelBehavior, ActiveModelError, ShelfExecutor};
/// use shelfwise::query::Filter;
///
/// struct Shelf { id: i64 }
///
/// impl ActiveModelBehavior for Shelf {
///     fn before_destroy(&self, executor: &dyn ShelfExecutor) -> Result<(), ActiveModelError> {
///         executor.delete("shelf_items", &Filter::eq("shelf_id", self.id))?;
///         Ok(())
///     }
/// }
/// ```
pub trait ActiveModelBehavior {
    /// Called before validation on every save
    ///
    /// # Errors
    ///
    /// Returns an error to abort the save.
    fn before_save(&mut self) -> Result<(), ActiveModelError> {
        Ok(())
    }

    /// Called after a successful save, on the reloaded record
    ///
    /// # Errors
    ///
    /// Returns an error to report a failed follow-up; the write itself stands.
    fn after_save(&mut self) -> Result<(), ActiveModelError> {
        Ok(())
    }

    /// Called inside the destroy transaction, before the row is deleted
    ///
    /// # Errors
    ///
    /// Returns an error to abort the destroy and roll back the transaction.
    fn before_destroy(&self, _executor: &dyn ShelfExecutor) -> Result<(), ActiveModelError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{Migration, MigrationRegistry, Migrator, SchemaManager};
    use crate::store::MemoryStore;
    use crate::validation::ValidationErrors;
    use chrono::{DateTime, Utc};
    use serde::Deserialize;
    use serde_json::json;

    struct CreateNotes;

    impl Migration for CreateNotes {
        fn name(&self) -> &str {
            "create_notes"
        }

        fn version(&self) -> i64 {
            20240101000000
        }

        fn change(&self, manager: &mut SchemaManager) {
            manager.create_table("notes", |t| {
                t.string("title").not_null();
                t.timestamps();
            });
            manager.create_table("tags", |t| {
                t.string("label");
                t.references("note", "notes").foreign_key();
            });
        }
    }

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Note {
        #[serde(default)]
        id: Option<i64>,
        #[serde(default)]
        title: String,
        #[serde(default)]
        created_at: Option<DateTime<Utc>>,
        #[serde(default)]
        updated_at: Option<DateTime<Utc>>,
        #[serde(skip)]
        errors: ValidationErrors,
    }

    impl ActiveModelBehavior for Note {
        fn before_save(&mut self) -> Result<(), ActiveModelError> {
            self.title = self.title.trim().to_string();
            Ok(())
        }

        fn before_destroy(&self, executor: &dyn ShelfExecutor) -> Result<(), ActiveModelError> {
            executor.delete("tags", &Filter::eq("note_id", self.id.unwrap_or_default()))?;
            Ok(())
        }
    }

    impl ActiveModelTrait for Note {
        const TABLE: &'static str = "notes";

        fn id(&self) -> Option<i64> {
            self.id
        }

        fn to_row(&self) -> Row {
            let mut row = Row::new()
                .with("title", self.title.clone())
                .with("created_at", self.created_at)
                .with("updated_at", self.updated_at);
            if let Some(id) = self.id {
                row.set("id", id);
            }
            row
        }

        fn from_row(row: &Row) -> Result<Self, RowError> {
            Ok(Self {
                id: row.get_i64("id")?,
                title: row.get_string("title")?.unwrap_or_default(),
                created_at: row.get_datetime("created_at")?,
                updated_at: row.get_datetime("updated_at")?,
                errors: ValidationErrors::new(),
            })
        }

        fn validations() -> Vec<Validation> {
            vec![Validation::presence("title"), Validation::maximum("title", 10)]
        }

        fn errors(&self) -> &ValidationErrors {
            &self.errors
        }

        fn errors_mut(&mut self) -> &mut ValidationErrors {
            &mut self.errors
        }
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        Migrator::new(MigrationRegistry::new().with(CreateNotes).unwrap())
            .up(&store, None)
            .unwrap();
        store
    }

    #[test]
    fn test_save_stamps_and_reloads() {
        let store = store();
        let mut note = Note {
            title: "  groceries ".to_string(),
            ..Note::default()
        };
        assert!(note.save(&store).unwrap());
        assert_eq!(note.id, Some(1));
        assert_eq!(note.title, "groceries");
        let created = note.created_at.unwrap();
        assert_eq!(note.updated_at, Some(created));

        note.title = "chores".to_string();
        assert!(note.save(&store).unwrap());
        assert_eq!(note.created_at, Some(created));
        assert!(note.updated_at.unwrap() >= created);
        assert_eq!(Note::all(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_save_writes_nothing() {
        let store = store();
        let mut note = Note::default();
        assert!(!note.save(&store).unwrap());
        assert_eq!(note.errors().full_messages(), vec!["Title can't be blank"]);
        assert!(!note.is_persisted());
        assert!(Note::all(&store).unwrap().is_empty());

        let err = note.save_strict(&store).unwrap_err();
        assert!(err.validation_errors().is_some());
    }

    #[test]
    fn test_create_and_update_from_attributes() {
        let store = store();
        let note = Note::create(&store, json!({ "title": "draft", "id": 99 })).unwrap();
        assert_eq!(note.id, Some(1));

        let updated = Note::update(&store, 1, json!({ "title": "final" })).unwrap();
        assert_eq!(updated.title, "final");
        assert_eq!(updated.created_at, note.created_at);

        let err = Note::update(&store, 1, json!({ "title": "far too long a title" })).unwrap_err();
        assert!(matches!(err, ActiveModelError::Validation(_)));
        assert_eq!(Note::find(&store, 1).unwrap().title, "final");

        let err = Note::create(&store, json!({ "colour": "red" })).unwrap_err();
        assert!(matches!(err, ActiveModelError::InvalidAttributes(_)));
        let err = Note::create(&store, json!(["title"])).unwrap_err();
        assert!(matches!(err, ActiveModelError::InvalidAttributes(_)));
    }

    #[test]
    fn test_destroy_runs_hook_in_transaction() {
        let store = store();
        let note = Note::create(&store, json!({ "title": "pinned" })).unwrap();
        let id = note.id.unwrap();
        store
            .insert("tags", Row::new().with("label", "home").with("note_id", id))
            .unwrap();

        let destroyed = Note::destroy(&store, id).unwrap();
        assert_eq!(destroyed.title, "pinned");
        assert!(store.select("tags", &Filter::all()).unwrap().is_empty());
        assert!(matches!(
            Note::find(&store, id),
            Err(ActiveModelError::RecordNotFound { table: "notes", .. })
        ));
        assert!(matches!(
            Note::destroy(&store, id),
            Err(ActiveModelError::RecordNotFound { .. })
        ));
    }
}
