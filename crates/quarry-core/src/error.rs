//! Error types for schema registration.
//!
//! Query building never fails, and execution errors belong to the executor,
//! so the only errors raised by this crate concern the schema registry.

use thiserror::Error;

/// Errors raised while registering or describing tables.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A table with the same physical or logical name already exists.
    #[error("table '{0}' is already defined")]
    DuplicateTable(String),

    /// No table with this name is registered.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// The table has no column with this logical name.
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn {
        /// Physical table name.
        table: String,
        /// Logical column name.
        column: String,
    },

    /// Two columns of a table share a logical name.
    #[error("column '{column}' is defined twice on table '{table}'")]
    DuplicateColumn {
        /// Physical table name.
        table: String,
        /// Logical column name.
        column: String,
    },

    /// A column reference is not of the form `table.column`.
    #[error("invalid column reference '{0}', expected 'table.column'")]
    InvalidReference(String),

    /// The table id was not issued by this schema.
    #[error("table id #{0} does not belong to this schema")]
    UnknownTableId(usize),

    /// The schema description could not be parsed.
    #[error("invalid schema description: {0}")]
    Description(#[from] serde_json::Error),

    /// The schema description could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
