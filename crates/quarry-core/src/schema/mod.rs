//! Schema registry.
//!
//! Tables live in a single [`Schema`] arena and are addressed by [`TableId`].
//! A [`Column`] never owns its table: it carries a [`TableRef`] (the arena id
//! plus the physical name needed for rendering), so tables and columns do not
//! form ownership cycles.
//!
//! ```rust
//! use quarry_core::schema::{Schema, TableDef};
//!
//! let mut schema = Schema::new();
//! let items = schema.define(TableDef::new("items").columns(["name"])).unwrap();
//!
//! let names: Vec<String> = schema[items].columns().map(|(_, c)| c.to_sql()).collect();
//! assert_eq!(names, ["items.id", "items.name"]);
//! ```

mod column;
mod description;
mod table;

use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::path::Path;
use std::sync::Arc;

pub use column::{Column, CONTAINS, DEFAULT_OPERATOR, ENDS_WITH, STARTS_WITH};
pub use description::{SchemaDescription, TableDescription};
pub use table::{Table, TableDef};

use crate::error::{Result, SchemaError};

/// Stable identifier of a table inside a [`Schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(usize);

impl TableId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Non-owning handle to a table: its id and physical name.
///
/// Renders as the physical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    id: TableId,
    name: Arc<str>,
}

impl TableRef {
    pub(crate) fn new(id: TableId, name: &str) -> Self {
        Self {
            id,
            name: Arc::from(name),
        }
    }

    /// Returns the table id.
    #[must_use]
    pub const fn id(&self) -> TableId {
        self.id
    }

    /// Returns the physical table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns this table's implicit `id` column.
    #[must_use]
    pub fn id_column(&self) -> Column {
        Column::new(self.clone(), Table::ID_COLUMN)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Process-wide registry of table descriptors.
///
/// Tables are registered once through [`Schema::define`] and are immutable
/// afterwards, except for their logical parent.
#[derive(Debug, Default, Clone)]
pub struct Schema {
    tables: Vec<Table>,
    by_name: HashMap<String, TableId>,
    by_logical: HashMap<String, TableId>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a schema from a JSON description.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or describes an invalid
    /// schema (see [`Schema::from_description`]).
    pub fn from_json(json: &str) -> Result<Self> {
        let description: SchemaDescription = serde_json::from_str(json)?;
        Self::from_description(&description)
    }

    /// Reads and builds a schema from a JSON description file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or its content is not a
    /// valid description.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Registers a table and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::DuplicateTable`] if the physical or logical
    /// name is already taken, and [`SchemaError::DuplicateColumn`] if two
    /// columns share a logical name.
    pub fn define(&mut self, def: TableDef) -> Result<TableId> {
        let id = TableId(self.tables.len());
        let table = def.build(id)?;

        for name in [table.name(), table.logical_name()] {
            if self.by_name.contains_key(name) || self.by_logical.contains_key(name) {
                return Err(SchemaError::DuplicateTable(name.to_string()));
            }
        }

        self.by_name.insert(table.name().to_string(), id);
        self.by_logical.insert(table.logical_name().to_string(), id);
        self.tables.push(table);
        Ok(id)
    }

    /// Returns the table with the given id.
    #[must_use]
    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(id.0)
    }

    /// Looks a table up by physical name, then by logical name.
    #[must_use]
    pub fn table_named(&self, name: &str) -> Option<&Table> {
        self.by_name
            .get(name)
            .or_else(|| self.by_logical.get(name))
            .and_then(|id| self.table(*id))
    }

    /// Iterates over all tables in definition order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Records `parent` as the logical parent of `child`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownTableId`] if either id does not belong
    /// to this schema.
    pub fn set_parent(&mut self, child: TableId, parent: TableId) -> Result<&Table> {
        if self.table(parent).is_none() {
            return Err(SchemaError::UnknownTableId(parent.0));
        }
        let table = self
            .tables
            .get_mut(child.0)
            .ok_or(SchemaError::UnknownTableId(child.0))?;
        table.set_parent(parent);
        Ok(&*table)
    }

    /// Returns the chain of logical parents of `id`, nearest first.
    ///
    /// The walk stops at the first table already visited.
    #[must_use]
    pub fn ancestors(&self, id: TableId) -> Vec<TableId> {
        let mut chain = Vec::new();
        let mut current = self.table(id).and_then(Table::parent);

        while let Some(parent) = current {
            if parent == id || chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.table(parent).and_then(Table::parent);
        }

        chain
    }

    /// Returns the number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns whether no table is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Index<TableId> for Schema {
    type Output = Table;

    fn index(&self, id: TableId) -> &Table {
        &self.tables[id.0]
    }
}
