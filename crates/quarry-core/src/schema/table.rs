//! Table descriptors.

use std::collections::HashMap;
use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{info, warn};

use super::{Column, TableId, TableRef};
use crate::error::{self, SchemaError};
use crate::executor::Executor;

/// Definition of a table, registered through [`Schema::define`].
///
/// [`Schema::define`]: super::Schema::define
///
/// # Example
///
/// ```rust
/// use quarry_core::schema::{Schema, TableDef};
///
/// let mut schema = Schema::new();
/// let users = schema.define(TableDef::new("users").columns(["name"])).unwrap();
/// let owner_name = schema[users].column("name").unwrap().clone();
///
/// let items = schema
///     .define(
///         TableDef::new("tbl_item")
///             .logical_name("item")
///             .columns(["item_title"])
///             .alias("item_title", "title")
///             .reference("owner_name", owner_name),
///     )
///     .unwrap();
///
/// let table = &schema[items];
/// assert_eq!(table.logical_name(), "item");
/// assert_eq!(table.column("title").unwrap().to_sql(), "tbl_item.item_title");
/// assert_eq!(table.column("owner_name").unwrap().to_sql(), "users.name");
/// ```
#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    logical_name: Option<String>,
    columns: Vec<String>,
    aliases: HashMap<String, String>,
    references: Vec<(String, Column)>,
}

impl TableDef {
    /// Starts a definition for the given physical table name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_name: None,
            columns: Vec::new(),
            aliases: HashMap::new(),
            references: Vec::new(),
        }
    }

    /// Adds physical column names.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Overrides the logical table name.
    #[must_use]
    pub fn logical_name(mut self, name: impl Into<String>) -> Self {
        self.logical_name = Some(name.into());
        self
    }

    /// Exposes the physical column `physical` under the logical name `logical`.
    #[must_use]
    pub fn alias(mut self, physical: impl Into<String>, logical: impl Into<String>) -> Self {
        self.aliases.insert(physical.into(), logical.into());
        self
    }

    /// Exposes a column owned by another table under `logical`.
    #[must_use]
    pub fn reference(mut self, logical: impl Into<String>, column: Column) -> Self {
        self.references.push((logical.into(), column));
        self
    }

    /// Builds the table, failing if two columns share a logical name.
    pub(super) fn build(self, id: TableId) -> error::Result<Table> {
        let table_ref = TableRef::new(id, &self.name);
        let logical = |physical: &str| {
            self.aliases
                .get(physical)
                .cloned()
                .unwrap_or_else(|| physical.to_string())
        };

        let mut columns = IndexMap::new();
        expose(
            &mut columns,
            &self.name,
            logical(Table::ID_COLUMN),
            Column::new(table_ref.clone(), Table::ID_COLUMN),
        )?;
        for physical in self.columns.iter().filter(|c| *c != Table::ID_COLUMN) {
            expose(
                &mut columns,
                &self.name,
                logical(physical),
                Column::new(table_ref.clone(), physical),
            )?;
        }
        for (name, column) in self.references {
            expose(&mut columns, &self.name, name, column)?;
        }

        Ok(Table {
            logical_name: self.logical_name.unwrap_or_else(|| self.name.clone()),
            table_ref,
            columns,
            parent: None,
        })
    }
}

fn expose(
    columns: &mut IndexMap<String, Column>,
    table: &str,
    logical: String,
    column: Column,
) -> error::Result<()> {
    match columns.entry(logical) {
        Entry::Occupied(entry) => Err(SchemaError::DuplicateColumn {
            table: table.to_string(),
            column: entry.key().clone(),
        }),
        Entry::Vacant(entry) => {
            entry.insert(column);
            Ok(())
        }
    }
}

/// A registered table: physical and logical names plus its exposed columns.
///
/// Columns are keyed by logical name and kept in definition order, starting
/// with the implicit `id` column.
#[derive(Debug, Clone)]
pub struct Table {
    table_ref: TableRef,
    logical_name: String,
    columns: IndexMap<String, Column>,
    parent: Option<TableId>,
}

impl Table {
    /// Name of the implicit primary key column.
    pub const ID_COLUMN: &'static str = "id";

    /// Returns the table id.
    #[must_use]
    pub const fn id(&self) -> TableId {
        self.table_ref.id()
    }

    /// Returns the physical table name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.table_ref.name()
    }

    /// Returns the logical table name.
    #[must_use]
    pub fn logical_name(&self) -> &str {
        &self.logical_name
    }

    /// Returns a handle to this table.
    #[must_use]
    pub fn table_ref(&self) -> TableRef {
        self.table_ref.clone()
    }

    /// Returns the column exposed under a logical name.
    #[must_use]
    pub fn column(&self, logical: &str) -> Option<&Column> {
        self.columns.get(logical)
    }

    /// Returns the implicit `id` column.
    #[must_use]
    pub fn id_column(&self) -> Column {
        self.table_ref.id_column()
    }

    /// Iterates over `(logical name, column)` pairs in definition order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, column)| (name.as_str(), column))
    }

    /// Returns whether `column` belongs to another table.
    #[must_use]
    pub fn is_foreign(&self, column: &Column) -> bool {
        column.table().id() != self.id()
    }

    /// Returns the logical parent table, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<TableId> {
        self.parent
    }

    pub(super) fn set_parent(&mut self, parent: TableId) {
        self.parent = Some(parent);
    }

    /// Drops the physical table through `executor`.
    ///
    /// This cannot be undone.
    ///
    /// # Errors
    ///
    /// Returns the executor's error unchanged.
    pub async fn drop<E: Executor>(&self, executor: &E) -> Result<E::Rows, E::Error> {
        let sql = format!("DROP TABLE {}", self.name());
        warn!(table = %self.name(), "Dropping table");
        let rows = executor.execute(&sql, &[]).await?;
        info!(table = %self.name(), "Table dropped");
        Ok(rows)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
