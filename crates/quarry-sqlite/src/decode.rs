//! Row decoding into engine values.

use quarry_core::SqlValue;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use thiserror::Error;

/// Errors raised while decoding result rows.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Error reported by sqlx while reading a value.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The value has a storage class with no `SqlValue` counterpart.
    #[error("unsupported type '{type_name}' in column '{column}'")]
    UnsupportedType {
        /// Column name.
        column: String,
        /// SQLite type name.
        type_name: String,
    },
}

/// Decodes a row into `(column name, value)` pairs, in column order.
///
/// # Errors
///
/// Returns an error if a value cannot be read.
pub fn decode_row(row: &SqliteRow) -> Result<Vec<(String, SqlValue)>, DecodeError> {
    row.columns()
        .iter()
        .map(|column| -> Result<(String, SqlValue), DecodeError> {
            let index = column.ordinal();
            let name = column.name().to_string();
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                return Ok((name, SqlValue::Null));
            }

            let type_name = raw.type_info().name().to_string();
            let value = match type_name.as_str() {
                "INTEGER" | "NUMERIC" => SqlValue::Int(row.try_get(index)?),
                "BOOLEAN" => SqlValue::Bool(row.try_get(index)?),
                "REAL" => SqlValue::Float(row.try_get(index)?),
                "TEXT" | "DATE" | "TIME" | "DATETIME" => SqlValue::Text(row.try_get(index)?),
                "BLOB" => SqlValue::Blob(row.try_get(index)?),
                _ => {
                    return Err(DecodeError::UnsupportedType {
                        column: name,
                        type_name: type_name.clone(),
                    })
                }
            };
            Ok((name, value))
        })
        .collect()
}

/// Decodes every row of a result set.
///
/// # Errors
///
/// Returns the first decoding error.
pub fn decode_rows(rows: &[SqliteRow]) -> Result<Vec<Vec<(String, SqlValue)>>, DecodeError> {
    rows.iter().map(decode_row).collect()
}
