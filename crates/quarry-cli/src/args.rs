//! Query flags shared by `render` and `query`.

use std::str::FromStr;

use clap::Args;
use quarry_core::{normalize, Column, Direction, FilterTriple, Query, Schema, SchemaError, Table};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while parsing query flags.
#[derive(Debug, Error)]
pub enum ArgError {
    #[error("expected 'field:value' or 'field:operator:value', got '{0}'")]
    Filter(String),

    #[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
    Direction(String),

    #[error("invalid --match object: {0}")]
    Match(String),
}

/// Flags describing a query on one table.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Table to select, by logical or physical name.
    pub table: String,

    /// Filter as `field:value` or `field:operator:value` (repeatable).
    ///
    /// Values are read as JSON when possible and as text otherwise.
    #[arg(short = 'w', long = "where", value_name = "FILTER", value_parser = parse_filter)]
    pub filters: Vec<FilterTriple>,

    /// Filters as a JSON object, e.g. `{"status": "open", "priority": {">": 1}}`.
    #[arg(long = "match", value_name = "JSON", value_parser = parse_match)]
    pub matches: Option<Map<String, Value>>,

    /// Include foreign columns and join their tables.
    #[arg(long)]
    pub follow_references: bool,

    /// Sort key as `column[:asc|desc]` (repeatable).
    #[arg(long, value_name = "COLUMN[:DIR]")]
    pub order_by: Vec<SortKey>,

    /// Grouping key as `column[:asc|desc]` (repeatable).
    #[arg(long, value_name = "COLUMN[:DIR]")]
    pub group_by: Vec<SortKey>,
}

impl QueryArgs {
    /// Builds the query described by the flags.
    ///
    /// Filters on unknown fields are skipped. Unknown tables and unknown
    /// sort columns are errors.
    pub fn build<'s>(&self, schema: &'s Schema) -> Result<Query<'s>, SchemaError> {
        let table = lookup(schema, &self.table)?;

        let mut query = Query::new(table).apply_external_filters(self.filters.iter().cloned(), table);
        if let Some(map) = &self.matches {
            query = query.apply_external_filters(normalize(map), table);
        }
        for key in &self.group_by {
            query = query.group_by(key.resolve(table)?, key.direction.clone());
        }
        for key in &self.order_by {
            query = query.order_by(key.resolve(table)?, key.direction.clone());
        }
        if self.follow_references {
            query = query.follow_references();
        }

        Ok(query)
    }
}

/// Finds a table by logical or physical name.
pub fn lookup<'s>(schema: &'s Schema, name: &str) -> Result<&'s Table, SchemaError> {
    schema
        .table_named(name)
        .ok_or_else(|| SchemaError::UnknownTable(name.to_string()))
}

/// A column name with a direction, parsed from `column[:asc|desc]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: Direction,
}

impl SortKey {
    fn resolve<'s>(&self, table: &'s Table) -> Result<&'s Column, SchemaError> {
        table
            .column(&self.column)
            .ok_or_else(|| SchemaError::UnknownColumn {
                table: table.name().to_string(),
                column: self.column.clone(),
            })
    }
}

impl FromStr for SortKey {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, direction) = match s.split_once(':') {
            Some((column, direction)) => (column, parse_direction(direction)?),
            None => (s, Direction::Asc),
        };
        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }
}

fn parse_direction(s: &str) -> Result<Direction, ArgError> {
    match s.to_ascii_lowercase().as_str() {
        "asc" => Ok(Direction::Asc),
        "desc" => Ok(Direction::Desc),
        _ => Err(ArgError::Direction(s.to_string())),
    }
}

/// Parses `field:value` or `field:operator:value`.
pub fn parse_filter(arg: &str) -> Result<FilterTriple, ArgError> {
    let mut parts = arg.splitn(3, ':');
    let triple = match (parts.next(), parts.next(), parts.next()) {
        (Some(field), Some(value), None) if !field.is_empty() => {
            FilterTriple::equals(field, parse_value(value))
        }
        (Some(field), Some(operator), Some(value)) if !field.is_empty() && !operator.is_empty() => {
            FilterTriple::new(field, operator, parse_value(value))
        }
        _ => return Err(ArgError::Filter(arg.to_string())),
    };
    Ok(triple)
}

/// Parses a JSON object of filters.
pub fn parse_match(arg: &str) -> Result<Map<String, Value>, ArgError> {
    match serde_json::from_str(arg) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ArgError::Match(String::from("expected a JSON object"))),
        Err(e) => Err(ArgError::Match(e.to_string())),
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
