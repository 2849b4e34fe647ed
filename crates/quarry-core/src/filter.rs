//! Normalized external filters.
//!
//! Filters coming from outside the engine (request payloads, command-line
//! flags) are `(field, operator, value)` triples naming logical columns.
//! [`Query::apply_external_filters`] turns them into column comparisons.
//!
//! [`Query::apply_external_filters`]: crate::query::Query::apply_external_filters

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::schema::DEFAULT_OPERATOR;
use crate::value::{SqlValue, ToSqlValue};

/// A `(field, operator, value)` filter on a logical column.
///
/// Deserializes from a JSON array `[field, operator, value]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "(String, String, Value)")]
pub struct FilterTriple {
    /// Logical column name.
    pub field: String,
    /// Operator, as accepted by [`Column::compare_with`].
    ///
    /// [`Column::compare_with`]: crate::schema::Column::compare_with
    pub operator: String,
    /// Value compared against.
    pub value: SqlValue,
}

impl FilterTriple {
    /// Creates a triple.
    #[must_use]
    pub fn new(field: impl Into<String>, operator: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.to_sql_value(),
        }
    }

    /// Creates a triple using the default `is` operator.
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self::new(field, DEFAULT_OPERATOR, value)
    }
}

impl From<(String, String, Value)> for FilterTriple {
    fn from((field, operator, value): (String, String, Value)) -> Self {
        Self::new(field, operator, value)
    }
}

/// Normalizes an implicit-equality map into triples.
///
/// `{"status": "open"}` becomes `("status", "is", "open")`. An object value
/// lists explicit operators: `{"age": {">": 18, "<": 65}}` becomes one triple
/// per entry, in key order.
///
/// ```rust
/// use quarry_core::filter::{normalize, FilterTriple};
/// use serde_json::json;
///
/// let map = json!({ "age": { ">": 18 }, "status": "open" });
/// let triples = normalize(map.as_object().unwrap());
/// assert_eq!(
///     triples,
///     [FilterTriple::new("age", ">", 18), FilterTriple::equals("status", "open")]
/// );
/// ```
#[must_use]
pub fn normalize(map: &Map<String, Value>) -> Vec<FilterTriple> {
    let mut triples = Vec::with_capacity(map.len());

    for (field, value) in map {
        match value {
            Value::Object(operators) => {
                for (operator, value) in operators {
                    triples.push(FilterTriple::new(field, operator, value.clone()));
                }
            }
            scalar => triples.push(FilterTriple::equals(field, scalar.clone())),
        }
    }

    triples
}
