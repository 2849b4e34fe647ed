//! Serializable schema descriptions.
//!
//! ```json
//! {
//!   "tables": [
//!     { "name": "users", "columns": ["name"] },
//!     {
//!       "name": "tbl_item",
//!       "logical_name": "item",
//!       "columns": ["item_title"],
//!       "aliases": { "item_title": "title" },
//!       "references": { "owner_name": "users.name" },
//!       "parent": "users"
//!     }
//!   ]
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Schema, TableDef};
use crate::error::{Result, SchemaError};

/// Description of a whole schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescription {
    /// Tables in definition order. References and parents may only point at
    /// tables listed earlier.
    pub tables: Vec<TableDescription>,
}

/// Description of a single table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    /// Physical table name.
    pub name: String,
    /// Logical table name; defaults to the physical name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_name: Option<String>,
    /// Physical column names. `id` is implied.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Physical column name to logical column name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub aliases: IndexMap<String, String>,
    /// Logical column name to `table.column` of another table, exposed in
    /// the order listed.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub references: IndexMap<String, String>,
    /// Logical parent table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Schema {
    /// Builds a schema from a description.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate tables, on references to unknown tables
    /// or columns, and on references not of the form `table.column`.
    pub fn from_description(description: &SchemaDescription) -> Result<Self> {
        let mut schema = Self::new();

        for table in &description.tables {
            let mut def = TableDef::new(&table.name).columns(table.columns.iter().cloned());
            if let Some(logical) = &table.logical_name {
                def = def.logical_name(logical);
            }
            for (physical, logical) in &table.aliases {
                def = def.alias(physical, logical);
            }
            for (logical, target) in &table.references {
                let (owner, column) = target
                    .split_once('.')
                    .ok_or_else(|| SchemaError::InvalidReference(target.clone()))?;
                let owner = schema
                    .table_named(owner)
                    .ok_or_else(|| SchemaError::UnknownTable(owner.to_string()))?;
                let column = owner.column(column).ok_or_else(|| SchemaError::UnknownColumn {
                    table: owner.name().to_string(),
                    column: column.to_string(),
                })?;
                def = def.reference(logical, column.clone());
            }

            let id = schema.define(def)?;

            if let Some(parent) = &table.parent {
                let parent = schema
                    .table_named(parent)
                    .map(super::Table::id)
                    .ok_or_else(|| SchemaError::UnknownTable(parent.clone()))?;
                schema.set_parent(id, parent)?;
            }
        }

        Ok(schema)
    }
}
