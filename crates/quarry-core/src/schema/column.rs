//! Column references and comparisons.

use std::fmt;
use std::sync::Arc;

use super::TableRef;
use crate::expr::{Expression, Operand};
use crate::value::SqlValue;

/// Operator used by [`Column::compare`].
///
/// `IS` treats NULL as an ordinary value, so comparing against an absent
/// value matches NULL rows instead of matching nothing.
pub const DEFAULT_OPERATOR: &str = "is";

/// Matches text containing the value anywhere.
pub const CONTAINS: &str = "contains";

/// Matches text starting with the value.
pub const STARTS_WITH: &str = "starts-with";

/// Matches text ending with the value.
pub const ENDS_WITH: &str = "ends-with";

const LIKE: &str = "like";

/// A column of a table.
///
/// Always renders as `<table>.<name>`, where `<table>` is the physical name
/// of the owning table. The owning table is not necessarily the table that
/// exposes the column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    table: TableRef,
    name: Arc<str>,
}

impl Column {
    pub(crate) fn new(table: TableRef, name: &str) -> Self {
        Self {
            table,
            name: Arc::from(name),
        }
    }

    /// Returns the physical column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning table.
    #[must_use]
    pub const fn table(&self) -> &TableRef {
        &self.table
    }

    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    /// Compares this column with a value, column or expression using `is`.
    #[must_use]
    pub fn compare(&self, target: impl Into<Operand>) -> Expression {
        self.compare_with(target, DEFAULT_OPERATOR)
    }

    /// Compares this column with a value, column or expression.
    ///
    /// [`CONTAINS`], [`STARTS_WITH`] and [`ENDS_WITH`] become `like` with the
    /// text value wrapped in `%` wildcards. Any other operator is used
    /// verbatim.
    ///
    /// ```rust
    /// use quarry_core::schema::{Schema, TableDef};
    ///
    /// let mut schema = Schema::new();
    /// let t = schema.define(TableDef::new("t").columns(["name"])).unwrap();
    /// let name = schema[t].column("name").unwrap();
    ///
    /// let expr = name.compare_with("J", "starts-with");
    /// assert_eq!(expr.to_string(), "t.name like ?");
    /// assert_eq!(expr.params()[0].as_text(), Some("J%"));
    /// ```
    #[must_use]
    pub fn compare_with(&self, target: impl Into<Operand>, operator: &str) -> Expression {
        let target = target.into();
        let (operator, target) = match operator {
            CONTAINS => (LIKE, wrap_text(target, "%", "%")),
            STARTS_WITH => (LIKE, wrap_text(target, "", "%")),
            ENDS_WITH => (LIKE, wrap_text(target, "%", "")),
            other => (other, target),
        };
        Expression::comparison(self.clone().into(), operator, target)
    }
}

/// Wraps a text literal with wildcards. Other operands are left untouched.
fn wrap_text(operand: Operand, prefix: &str, suffix: &str) -> Operand {
    match operand {
        Operand::Literal(SqlValue::Text(text)) => {
            Operand::Literal(SqlValue::Text(format!("{prefix}{text}{suffix}")))
        }
        other => other,
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Schema, TableDef};

    fn columns() -> (Column, Column) {
        let mut schema = Schema::new();
        let users = schema
            .define(TableDef::new("users").columns(["name"]))
            .unwrap();
        let items = schema
            .define(TableDef::new("items").columns(["owner"]))
            .unwrap();
        (
            schema[users].column("name").unwrap().clone(),
            schema[items].column("owner").unwrap().clone(),
        )
    }

    #[test]
    fn test_column_renders_qualified() {
        let (name, owner) = columns();
        assert_eq!(name.to_sql(), "users.name");
        assert_eq!(owner.to_string(), "items.owner");
    }

    #[test]
    fn test_default_operator_is_is() {
        let (name, _) = columns();
        let expr = name.compare("John");
        assert_eq!(expr.to_string(), "users.name is ?");
        assert_eq!(expr.params(), [SqlValue::Text(String::from("John"))]);
    }

    #[test]
    fn test_compare_with_null() {
        let (name, _) = columns();
        let expr = name.compare(None::<&str>);
        assert_eq!(expr.to_string(), "users.name is ?");
        assert_eq!(expr.params(), [SqlValue::Null]);
    }

    #[test]
    fn test_wildcard_operators() {
        let (name, _) = columns();
        let cases = [
            (CONTAINS, "%oh%"),
            (STARTS_WITH, "oh%"),
            (ENDS_WITH, "%oh"),
        ];
        for (operator, pattern) in cases {
            let expr = name.compare_with("oh", operator);
            assert_eq!(expr.to_string(), "users.name like ?");
            assert_eq!(expr.params(), [SqlValue::Text(String::from(pattern))]);
        }
    }

    #[test]
    fn test_other_operators_pass_through() {
        let (name, _) = columns();
        for operator in ["=", "!=", "<", ">=", "not like"] {
            let expr = name.compare_with(3, operator);
            assert_eq!(expr.to_string(), format!("users.name {operator} ?"));
            assert_eq!(expr.params(), [SqlValue::Int(3)]);
        }
    }

    #[test]
    fn test_wildcards_leave_non_text_untouched() {
        let (name, _) = columns();
        let expr = name.compare_with(5, CONTAINS);
        assert_eq!(expr.to_string(), "users.name like ?");
        assert_eq!(expr.params(), [SqlValue::Int(5)]);
    }

    #[test]
    fn test_column_to_column_comparison() {
        let (name, owner) = columns();
        let expr = owner.compare_with(&name, "=");
        assert_eq!(expr.to_string(), "items.owner = users.name");
        assert!(expr.params().is_empty());
        let tables: Vec<&str> = expr.tables().map(TableRef::name).collect();
        assert_eq!(tables, ["items", "users"]);
    }
}
