//! SchemaManager - Records the schema operations a migration performs
//!
//! A migration's `change()` describes its forward change through this builder.
//! Nothing is executed while describing: the recorded [`SchemaOp`] list is
//! what the [`Migrator`](crate::migration::Migrator) applies, checksums, and
//! reverses on rollback.

use crate::schema::{ColumnDef, ColumnType, ForeignKeyDef, IndexDef, OnDelete, SchemaOp, TableDef};
use std::collections::BTreeSet;

/// A message printed while a migration runs
///
/// Announcements are not schema changes: they do not take part in the
/// checksum and are not replayed on rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Announcement {
    /// `-- text`, or `   -> text` as a subitem
    Say { text: String, subitem: bool },
    /// `-- text`, timed until the matching [`Announcement::Done`]
    Timed(String),
    Done,
}

/// SchemaManager collects schema operations in the order they are declared
///
/// # Example
///
/// ```rust
/// use shelfwise::migration::SchemaManager;
/// use shelfwise::schema::ColumnType;
///
/// let mut manager = SchemaManager::new();
/// manager.create_table("people", |t| {
///     t.string("name").index();
///     t.string("email").unique_index("unique_emails");
/// });
/// manager.change_table("people", |t| {
///     t.remove_typed("email", ColumnType::String);
/// });
/// assert_eq!(manager.operations().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct SchemaManager {
    operations: Vec<SchemaOp>,
    announcements: Vec<(usize, Announcement)>,
    quiet: BTreeSet<usize>,
    suppressing: bool,
}

impl SchemaManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations recorded so far
    pub fn operations(&self) -> &[SchemaOp] {
        &self.operations
    }

    #[must_use]
    pub fn into_operations(self) -> Vec<SchemaOp> {
        self.operations
    }

    /// Announcements keyed by the number of operations recorded before them
    pub fn announcements(&self) -> &[(usize, Announcement)] {
        &self.announcements
    }

    /// Whether the operation at `index` runs without its `-- op` line
    pub fn is_quiet(&self, index: usize) -> bool {
        self.quiet.contains(&index)
    }

    /// Print `-- message` at this point of the run
    pub fn say(&mut self, message: impl Into<String>) {
        self.announce(Announcement::Say {
            text: message.into(),
            subitem: false,
        });
    }

    /// Print `   -> message` at this point of the run
    pub fn say_subitem(&mut self, message: impl Into<String>) {
        self.announce(Announcement::Say {
            text: message.into(),
            subitem: true,
        });
    }

    /// Print `-- message`, then the time taken by the operations `build` records
    pub fn say_with_time(&mut self, message: impl Into<String>, build: impl FnOnce(&mut Self)) {
        self.announce(Announcement::Timed(message.into()));
        build(self);
        self.announce(Announcement::Done);
    }

    /// Record the operations of `build` without any of their messages
    pub fn suppress_messages(&mut self, build: impl FnOnce(&mut Self)) {
        let outer = std::mem::replace(&mut self.suppressing, true);
        let start = self.operations.len();
        build(self);
        self.quiet.extend(start..self.operations.len());
        self.suppressing = outer;
    }

    fn announce(&mut self, announcement: Announcement) {
        if !self.suppressing {
            self.announcements.push((self.operations.len(), announcement));
        }
    }

    /// Create a table with an implicit `id` bigint primary key
    pub fn create_table(&mut self, name: &str, build: impl FnOnce(&mut TableBuilder)) {
        let mut table = TableDef::new(name);
        table.columns.push(ColumnDef::primary_id());
        self.finish_table(table, build);
    }

    /// Create a table with no `id` column
    pub fn create_table_without_id(&mut self, name: &str, build: impl FnOnce(&mut TableBuilder)) {
        self.finish_table(TableDef::new(name), build);
    }

    fn finish_table(&mut self, table: TableDef, build: impl FnOnce(&mut TableBuilder)) {
        let mut builder = TableBuilder { table };
        build(&mut builder);
        self.operations.push(SchemaOp::CreateTable {
            table: builder.table,
        });
    }

    /// Create a link table for a many-to-many association
    ///
    /// The table is named from the two tables in alphabetical order
    /// (`people`, `cars` → `cars_people`) and gets one non-null
    /// `{singular}_id` bigint column per table, in argument order. It has no
    /// `id` column.
    pub fn create_join_table(
        &mut self,
        first: &str,
        second: &str,
        build: impl FnOnce(&mut TableBuilder),
    ) {
        let table = TableDef::new(join_table_name(first, second));
        let mut builder = TableBuilder { table };
        for side in [first, second] {
            builder
                .bigint(&format!("{}_id", singularize(side)))
                .not_null();
        }
        build(&mut builder);
        self.operations.push(SchemaOp::CreateTable {
            table: builder.table,
        });
    }

    /// Alter an existing table
    pub fn change_table(&mut self, name: &str, build: impl FnOnce(&mut ChangeTable<'_>)) {
        let mut change = ChangeTable {
            table: name.to_string(),
            operations: &mut self.operations,
        };
        build(&mut change);
    }

    /// Drop a table; irreversible since the definition is not recorded
    pub fn drop_table(&mut self, name: &str) {
        self.operations.push(SchemaOp::DropTable {
            table: name.to_string(),
            definition: None,
        });
    }

    /// Drop a table, recording its definition so the drop can be reversed
    pub fn drop_table_with(&mut self, name: &str, build: impl FnOnce(&mut TableBuilder)) {
        let mut table = TableDef::new(name);
        table.columns.push(ColumnDef::primary_id());
        let mut builder = TableBuilder { table };
        build(&mut builder);
        self.operations.push(SchemaOp::DropTable {
            table: name.to_string(),
            definition: Some(builder.table),
        });
    }

    pub fn rename_table(&mut self, from: &str, to: &str) {
        self.operations.push(SchemaOp::RenameTable {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    pub fn add_column(&mut self, table: &str, column: ColumnDef) {
        self.operations.push(SchemaOp::AddColumn {
            table: table.to_string(),
            column,
        });
    }

    /// Remove a column; pass its definition to make the removal reversible
    pub fn remove_column(&mut self, table: &str, column: &str, definition: Option<ColumnDef>) {
        self.operations.push(SchemaOp::RemoveColumn {
            table: table.to_string(),
            column: column.to_string(),
            definition,
        });
    }

    pub fn rename_column(&mut self, table: &str, from: &str, to: &str) {
        self.operations.push(SchemaOp::RenameColumn {
            table: table.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    /// Add an index with the conventional name; returns it for `unique()` / `named()`
    pub fn add_index(&mut self, table: &str, columns: &[&str]) -> NewIndex<'_> {
        push_index(&mut self.operations, table, IndexDef::new(table, columns))
    }

    /// Remove the conventionally named index over `columns` (reversible)
    pub fn remove_index(&mut self, table: &str, columns: &[&str]) {
        let index = IndexDef::new(table, columns);
        self.operations.push(SchemaOp::RemoveIndex {
            table: table.to_string(),
            name: index.name.clone(),
            definition: Some(index),
        });
    }

    /// Add a foreign key from `table.column` to `to_table.id`
    pub fn add_foreign_key(&mut self, table: &str, column: &str, to_table: &str, on_delete: OnDelete) {
        let mut foreign_key = ForeignKeyDef::new(column, to_table);
        foreign_key.on_delete(on_delete);
        self.operations.push(SchemaOp::AddForeignKey {
            table: table.to_string(),
            foreign_key,
        });
    }
}

/// Column and index declarations for a table being created
#[derive(Debug)]
pub struct TableBuilder {
    table: TableDef,
}

impl TableBuilder {
    /// Name of the table being built
    pub fn name(&self) -> &str {
        &self.table.name
    }

    /// Add a column of any type
    pub fn column(&mut self, name: &str, column_type: ColumnType) -> ColumnRef<'_> {
        self.table.columns.push(ColumnDef::new(name, column_type));
        let position = self.table.columns.len() - 1;
        ColumnRef {
            table: &mut self.table,
            position,
        }
    }

    pub fn string(&mut self, name: &str) -> ColumnRef<'_> {
        self.column(name, ColumnType::String)
    }

    pub fn text(&mut self, name: &str) -> ColumnRef<'_> {
        self.column(name, ColumnType::Text)
    }

    pub fn integer(&mut self, name: &str) -> ColumnRef<'_> {
        self.column(name, ColumnType::Integer)
    }

    pub fn bigint(&mut self, name: &str) -> ColumnRef<'_> {
        self.column(name, ColumnType::BigInteger)
    }

    pub fn decimal(&mut self, name: &str, precision: u32, scale: u32) -> ColumnRef<'_> {
        self.column(name, ColumnType::Decimal { precision, scale })
    }

    pub fn datetime(&mut self, name: &str) -> ColumnRef<'_> {
        self.column(name, ColumnType::DateTime)
    }

    pub fn boolean(&mut self, name: &str) -> ColumnRef<'_> {
        self.column(name, ColumnType::Boolean)
    }

    /// `created_at` / `updated_at`, both non-null
    pub fn timestamps(&mut self) {
        self.datetime("created_at").not_null();
        self.datetime("updated_at").not_null();
    }

    /// A `{name}_id` bigint column pointing at `to_table`, indexed by default
    pub fn references(&mut self, name: &str, to_table: &str) -> ReferenceRef<'_> {
        let column = format!("{name}_id");
        self.bigint(&column).index();
        let position = self.table.columns.len() - 1;
        ReferenceRef {
            table: &mut self.table,
            position,
            to_table: to_table.to_string(),
        }
    }

    /// Add an index over existing columns
    pub fn index(&mut self, columns: &[&str]) -> &mut IndexDef {
        let index = IndexDef::new(&self.table.name, columns);
        self.table.indexes.push(index);
        let last = self.table.indexes.len() - 1;
        &mut self.table.indexes[last]
    }
}

/// Modifiers for a column just added to a [`TableBuilder`]
#[derive(Debug)]
pub struct ColumnRef<'t> {
    table: &'t mut TableDef,
    position: usize,
}

impl ColumnRef<'_> {
    fn def(&mut self) -> Option<&mut ColumnDef> {
        self.table.columns.get_mut(self.position)
    }

    fn column_name(&self) -> String {
        self.table
            .columns
            .get(self.position)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    pub fn not_null(mut self) -> Self {
        if let Some(def) = self.def() {
            def.not_null();
        }
        self
    }

    pub fn null(mut self) -> Self {
        if let Some(def) = self.def() {
            def.null();
        }
        self
    }

    /// Index this column under the conventional name
    pub fn index(mut self) -> Self {
        let column = self.column_name();
        let index = IndexDef::new(&self.table.name, &[column.as_str()]);
        self.table.indexes.push(index);
        self
    }

    /// Index this column uniquely under `name`
    pub fn unique_index(mut self, name: &str) -> Self {
        let column = self.column_name();
        let mut index = IndexDef::new(&self.table.name, &[column.as_str()]);
        index.unique().named(name);
        self.table.indexes.push(index);
        self
    }
}

/// Modifiers for a `references` column
#[derive(Debug)]
pub struct ReferenceRef<'t> {
    table: &'t mut TableDef,
    position: usize,
    to_table: String,
}

impl ReferenceRef<'_> {
    pub fn not_null(mut self) -> Self {
        if let Some(def) = self.table.columns.get_mut(self.position) {
            def.not_null();
        }
        self
    }

    /// Enforce the reference with a restricting foreign key
    pub fn foreign_key(self) -> Self {
        self.on_delete(OnDelete::Restrict)
    }

    /// Enforce the reference with a foreign key using `action`
    pub fn on_delete(mut self, action: OnDelete) -> Self {
        let Some(column) = self.table.columns.get(self.position).map(|c| c.name.clone()) else {
            return self;
        };
        self.table.foreign_keys.retain(|fk| fk.column != column);
        let mut foreign_key = ForeignKeyDef::new(column, self.to_table.clone());
        foreign_key.on_delete(action);
        self.table.foreign_keys.push(foreign_key);
        self
    }
}

/// Changes to an existing table, recorded in declaration order
#[derive(Debug)]
pub struct ChangeTable<'m> {
    table: String,
    operations: &'m mut Vec<SchemaOp>,
}

impl ChangeTable<'_> {
    /// Add a column of any type
    pub fn column(&mut self, name: &str, column_type: ColumnType) -> NewColumn<'_> {
        self.operations.push(SchemaOp::AddColumn {
            table: self.table.clone(),
            column: ColumnDef::new(name, column_type),
        });
        let position = self.operations.len() - 1;
        NewColumn {
            table: &self.table,
            operations: self.operations,
            position,
        }
    }

    pub fn string(&mut self, name: &str) -> NewColumn<'_> {
        self.column(name, ColumnType::String)
    }

    pub fn text(&mut self, name: &str) -> NewColumn<'_> {
        self.column(name, ColumnType::Text)
    }

    pub fn integer(&mut self, name: &str) -> NewColumn<'_> {
        self.column(name, ColumnType::Integer)
    }

    pub fn bigint(&mut self, name: &str) -> NewColumn<'_> {
        self.column(name, ColumnType::BigInteger)
    }

    pub fn decimal(&mut self, name: &str, precision: u32, scale: u32) -> NewColumn<'_> {
        self.column(name, ColumnType::Decimal { precision, scale })
    }

    pub fn datetime(&mut self, name: &str) -> NewColumn<'_> {
        self.column(name, ColumnType::DateTime)
    }

    pub fn boolean(&mut self, name: &str) -> NewColumn<'_> {
        self.column(name, ColumnType::Boolean)
    }

    /// Nullable `created_at` / `updated_at`; existing rows have no value for them
    pub fn timestamps(&mut self) {
        self.datetime("created_at");
        self.datetime("updated_at");
    }

    /// Remove columns without recording their type; rollback will refuse
    pub fn remove(&mut self, columns: &[&str]) {
        for column in columns {
            self.operations.push(SchemaOp::RemoveColumn {
                table: self.table.clone(),
                column: (*column).to_string(),
                definition: None,
            });
        }
    }

    /// Remove a column, recording its type so rollback can recreate it
    pub fn remove_typed(&mut self, column: &str, column_type: ColumnType) {
        self.operations.push(SchemaOp::RemoveColumn {
            table: self.table.clone(),
            column: column.to_string(),
            definition: Some(ColumnDef::new(column, column_type)),
        });
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        self.operations.push(SchemaOp::RenameColumn {
            table: self.table.clone(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    /// Add an index; returns it for `unique()` / `named()`
    pub fn index(&mut self, columns: &[&str]) -> NewIndex<'_> {
        let index = IndexDef::new(&self.table, columns);
        push_index(self.operations, &self.table, index)
    }

    /// Remove the conventionally named index over `columns` (reversible)
    pub fn remove_index(&mut self, columns: &[&str]) {
        let index = IndexDef::new(&self.table, columns);
        self.operations.push(SchemaOp::RemoveIndex {
            table: self.table.clone(),
            name: index.name.clone(),
            definition: Some(index),
        });
    }

    /// Add an indexed `{name}_id` bigint column, optionally with a foreign key
    pub fn references(&mut self, name: &str, to_table: &str, on_delete: Option<OnDelete>) {
        let column = format!("{name}_id");
        self.bigint(&column).index();
        if let Some(action) = on_delete {
            let mut foreign_key = ForeignKeyDef::new(column, to_table);
            foreign_key.on_delete(action);
            self.operations.push(SchemaOp::AddForeignKey {
                table: self.table.clone(),
                foreign_key,
            });
        }
    }
}

/// Modifiers for a column added inside [`ChangeTable`]
#[derive(Debug)]
pub struct NewColumn<'c> {
    table: &'c str,
    operations: &'c mut Vec<SchemaOp>,
    position: usize,
}

impl NewColumn<'_> {
    fn def(&mut self) -> Option<&mut ColumnDef> {
        match self.operations.get_mut(self.position) {
            Some(SchemaOp::AddColumn { column, .. }) => Some(column),
            _ => None,
        }
    }

    pub fn not_null(mut self) -> Self {
        if let Some(def) = self.def() {
            def.not_null();
        }
        self
    }

    pub fn null(mut self) -> Self {
        if let Some(def) = self.def() {
            def.null();
        }
        self
    }

    /// Index this column under the conventional name
    pub fn index(mut self) -> Self {
        if let Some(column) = self.def().map(|c| c.name.clone()) {
            let index = IndexDef::new(self.table, &[column.as_str()]);
            self.operations.push(SchemaOp::AddIndex {
                table: self.table.to_string(),
                index,
            });
        }
        self
    }

    /// Index this column uniquely under `name`
    pub fn unique_index(mut self, name: &str) -> Self {
        if let Some(column) = self.def().map(|c| c.name.clone()) {
            let mut index = IndexDef::new(self.table, &[column.as_str()]);
            index.unique().named(name);
            self.operations.push(SchemaOp::AddIndex {
                table: self.table.to_string(),
                index,
            });
        }
        self
    }
}

/// Push an `AddIndex` and hand back the recorded index for further modifiers
fn push_index<'o>(operations: &'o mut Vec<SchemaOp>, table: &str, index: IndexDef) -> NewIndex<'o> {
    operations.push(SchemaOp::AddIndex {
        table: table.to_string(),
        index,
    });
    let position = operations.len() - 1;
    NewIndex {
        operations,
        position,
    }
}

/// Modifiers for an index recorded by `add_index` or [`ChangeTable::index`]
#[derive(Debug)]
pub struct NewIndex<'o> {
    operations: &'o mut Vec<SchemaOp>,
    position: usize,
}

impl NewIndex<'_> {
    fn def(&mut self) -> Option<&mut IndexDef> {
        match self.operations.get_mut(self.position) {
            Some(SchemaOp::AddIndex { index, .. }) => Some(index),
            _ => None,
        }
    }

    /// Enforce uniqueness over the indexed columns
    pub fn unique(mut self) -> Self {
        if let Some(index) = self.def() {
            index.unique();
        }
        self
    }

    /// Override the conventional name
    pub fn named(mut self, name: &str) -> Self {
        if let Some(index) = self.def() {
            index.named(name);
        }
        self
    }
}

/// Join table name: both table names, sorted, joined with `_`
#[must_use]
pub fn join_table_name(first: &str, second: &str) -> String {
    let mut names = [first, second];
    names.sort_unstable();
    names.join("_")
}

/// Singular form of a table name, for `{singular}_id` columns
#[must_use]
pub fn singularize(table: &str) -> String {
    match table {
        "people" => "person".to_string(),
        _ if table.ends_with("ies") => format!("{}y", &table[..table.len() - 3]),
        _ if table.ends_with("sses") || table.ends_with("xes") || table.ends_with("ches") => {
            table[..table.len() - 2].to_string()
        }
        _ if table.ends_with('s') && !table.ends_with("ss") => table[..table.len() - 1].to_string(),
        _ => table.to_string(),
    }
}
