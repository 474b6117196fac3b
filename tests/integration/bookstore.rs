//! Integration tests for the record layer over a fully migrated store
//!
//! These follow the bookstore scenarios end to end: validation on save,
//! uniqueness against stored rows, dependent destruction of addresses and
//! the nested address batch.

use serde_json::json;
use shelfwise::migration::Migrator;
use shelfwise::models::{Address, AddressAttributes, Book, Person, User};
use shelfwise::query::Filter;
use shelfwise::{ActiveModelError, ActiveModelTrait, ConstraintViolation, MemoryStore, ShelfExecutor};

fn migrated_store() -> MemoryStore {
    let store = MemoryStore::new();
    Migrator::new(shelfwise::migrations::registry().unwrap())
        .up(&store, None)
        .unwrap();
    store
}

#[test]
fn test_book_scenario() {
    let store = migrated_store();

    let err = Book::create(&store, json!({ "name": "AB" })).unwrap_err();
    let errors = err.validation_errors().unwrap();
    assert_eq!(errors.full_messages(), vec!["Name is too short (minimum is 3 characters)"]);

    let book = Book::create(&store, json!({ "name": "ABC", "price": 9.99 })).unwrap();
    assert!(book.is_persisted());

    let err = Book::create(&store, json!({ "name": "ABC" })).unwrap_err();
    assert_eq!(err.validation_errors().unwrap().on("name"), vec!["has already been taken"]);

    assert_eq!(Book::all(&store).unwrap(), vec![book]);
}

#[test]
fn test_book_update_and_destroy() {
    let store = migrated_store();
    let dune = Book::create(&store, json!({ "name": "Dune" })).unwrap();
    let emma = Book::create(&store, json!({ "name": "Emma" })).unwrap();

    let err = Book::update(&store, emma.id.unwrap(), json!({ "name": "Dune" })).unwrap_err();
    assert!(err.validation_errors().is_some());

    let renamed = Book::update(&store, emma.id.unwrap(), json!({ "name": "Persuasion" })).unwrap();
    assert_eq!(renamed.name.as_deref(), Some("Persuasion"));

    Book::destroy(&store, dune.id.unwrap()).unwrap();
    assert!(matches!(
        Book::find(&store, dune.id.unwrap()),
        Err(ActiveModelError::RecordNotFound { table: "books", .. })
    ));
    assert!(Book::update(&store, 404, json!({ "name": "Ghost" })).is_err());
}

#[test]
fn test_user_presence() {
    let store = migrated_store();
    let mut blank = User::new("", "writer");
    assert!(!blank.save(&store).unwrap());
    assert_eq!(blank.errors().on("name"), vec!["can't be blank"]);

    let mut named = User::new("Ursula", "writer");
    assert!(named.save(&store).unwrap());
    assert!(User::new(" ", "poet").save(&store).unwrap());
}

#[test]
fn test_person_scenario() {
    let store = migrated_store();
    let mut person = Person::new("X", "a@b.com");
    assert!(person.save(&store).unwrap());
    let person_id = person.id.unwrap();

    for street in ["High St", "Low St"] {
        Address::new(street, person_id).save_strict(&store).unwrap();
    }
    assert_eq!(person.addresses(&store).unwrap().len(), 2);

    Person::destroy(&store, person_id).unwrap();
    let orphans = store
        .select("addresses", &Filter::eq("person_id", person_id))
        .unwrap();
    assert!(orphans.is_empty());
}

#[test]
fn test_deleting_person_row_directly_is_restricted() {
    let store = migrated_store();
    let mut person = Person::new("X", "a@b.com");
    person
        .save_with_addresses(&store, &[AddressAttributes::create("High St")])
        .unwrap();

    // Bypassing the record layer skips the dependent destroy
    let err = store
        .delete("people", &Filter::id(person.id.unwrap()))
        .unwrap_err();
    assert!(matches!(err.constraint(), Some(ConstraintViolation::ForeignKey { .. })));
    assert_eq!(Address::all(&store).unwrap().len(), 1);
}

#[test]
fn test_nested_batch_is_all_or_nothing() {
    let store = migrated_store();
    let mut person = Person::new("X", "a@b.com");
    person
        .save_with_addresses(&store, &[AddressAttributes::create("High St")])
        .unwrap();
    let kept = person.addresses(&store).unwrap()[0].id.unwrap();
    let before = store.database().unwrap();

    person.name = Some("Renamed".to_string());
    let batch = [
        AddressAttributes::destroy(kept),
        AddressAttributes::create("Mid St"),
        AddressAttributes::update(999, "Nowhere"),
    ];
    assert!(person.save_with_addresses(&store, &batch).is_err());

    assert_eq!(store.database().unwrap(), before);
    assert_eq!(Person::find(&store, person.id.unwrap()).unwrap().name.as_deref(), Some("X"));
}

#[test]
fn test_commit_never_discards_a_concurrent_create() {
    let store = migrated_store();
    let tx = store.begin().unwrap();
    tx.insert("books", shelfwise::Row::new().with("name", "Emma")).unwrap();

    let dune = Book::create(&store, json!({ "name": "Dune" })).unwrap();
    assert_eq!(dune.id, Some(1));

    let err = tx.commit().unwrap_err();
    assert!(matches!(err, shelfwise::ShelfError::Conflict { .. }));
    assert_eq!(Book::all(&store).unwrap(), vec![dune]);
}
