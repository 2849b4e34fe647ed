//! SELECT query builder with join inference.
//!
//! A [`Query`] accumulates selections, filters and ordering through chained
//! calls and renders itself only when asked, so the order of the calls does
//! not matter. Tables are never joined explicitly: every table a query
//! touches is listed in `FROM` and the join conditions are ordinary `WHERE`
//! predicates.
//!
//! ```rust
//! use quarry_core::query::Query;
//! use quarry_core::schema::{Schema, TableDef};
//!
//! let mut schema = Schema::new();
//! let items = schema.define(TableDef::new("items").columns(["name"])).unwrap();
//! let items = &schema[items];
//!
//! let query = Query::new(items).filter(items.column("name").unwrap().compare("John"));
//! let (sql, params) = query.build();
//!
//! assert_eq!(sql, "SELECT items.id, items.name\nFROM items\nWHERE items.name is ?");
//! assert_eq!(params.len(), 1);
//! ```

use std::fmt;

use indexmap::IndexSet;
use tracing::debug;

use crate::executor::Executor;
use crate::expr::Expression;
use crate::filter::FilterTriple;
use crate::schema::{Column, Table, TableRef};
use crate::value::SqlValue;

/// Sort direction of a GROUP BY or ORDER BY entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (ASC)
    #[default]
    Asc,
    /// Descending order (DESC)
    Desc,
    /// Written verbatim after the expression, e.g. `DESC NULLS LAST`.
    ///
    /// Not validated: never put user input here.
    Raw(String),
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
            Self::Raw(direction) => f.write_str(direction),
        }
    }
}

/// Something selected by a query.
#[derive(Debug, Clone)]
pub enum Selection<'s> {
    /// Every column exposed by a table.
    Table(&'s Table),
    /// A single column.
    Column(Column),
}

impl<'s> From<&'s Table> for Selection<'s> {
    fn from(table: &'s Table) -> Self {
        Self::Table(table)
    }
}

impl From<Column> for Selection<'_> {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

impl From<&Column> for Selection<'_> {
    fn from(column: &Column) -> Self {
        Self::Column(column.clone())
    }
}

/// A lazily rendered SELECT statement.
///
/// Queries borrow their tables from the [`Schema`](crate::schema::Schema).
/// Builder methods consume and return the query so calls can be chained.
#[derive(Debug, Clone, Default)]
pub struct Query<'s> {
    /// Selected tables and columns, in order
    selections: Vec<Selection<'s>>,
    /// Tables to list in FROM, ordered by first use
    tables: IndexSet<TableRef>,
    /// WHERE conditions (combined with AND)
    filters: Vec<Expression>,
    /// GROUP BY entries
    group_by: Vec<(Expression, Direction)>,
    /// ORDER BY entries
    order_by: Vec<(Expression, Direction)>,
    /// Bind parameters of the filters, in order
    params: Vec<SqlValue>,
    /// Whether foreign columns of selected tables are included
    follow_references: bool,
}

impl<'s> Query<'s> {
    /// Creates a query selecting a table or a column.
    #[must_use]
    pub fn new(selection: impl Into<Selection<'s>>) -> Self {
        Self::default().select(selection)
    }

    /// Creates a query selecting several tables and columns.
    #[must_use]
    pub fn from_selections<I>(selections: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Selection<'s>>,
    {
        selections.into_iter().fold(Self::default(), Self::select)
    }

    /// Adds a table or a column to the selection.
    ///
    /// Tables are expanded into their columns at render time.
    #[must_use]
    pub fn select(mut self, selection: impl Into<Selection<'s>>) -> Self {
        let selection = selection.into();
        match &selection {
            Selection::Table(table) => {
                self.tables.insert(table.table_ref());
            }
            Selection::Column(column) => {
                self.tables.insert(column.table().clone());
            }
        }
        self.selections.push(selection);
        self
    }

    /// Adds a WHERE condition.
    ///
    /// Multiple filters are combined with AND. An [empty](Expression::is_empty)
    /// expression is ignored.
    #[must_use]
    pub fn filter(mut self, expr: Expression) -> Self {
        if expr.is_empty() {
            return self;
        }
        self.tables.extend(expr.tables().cloned());
        self.params.extend_from_slice(expr.params());
        self.filters.push(expr);
        self
    }

    /// Adds one filter per triple whose field is a logical column of `table`.
    ///
    /// Triples naming unknown fields are skipped.
    #[must_use]
    pub fn apply_external_filters<I>(self, triples: I, table: &Table) -> Self
    where
        I: IntoIterator<Item = FilterTriple>,
    {
        triples.into_iter().fold(self, |query, triple| {
            match table.column(&triple.field) {
                Some(column) => query.filter(column.compare_with(triple.value, &triple.operator)),
                None => {
                    debug!(
                        table = %table.name(),
                        field = %triple.field,
                        "Skipping filter on unknown field"
                    );
                    query
                }
            }
        })
    }

    /// Adds a GROUP BY entry.
    #[must_use]
    pub fn group_by(mut self, expr: impl Into<Expression>, direction: Direction) -> Self {
        let expr = expr.into();
        self.tables.extend(expr.tables().cloned());
        self.group_by.push((expr, direction));
        self
    }

    /// Adds an ORDER BY entry.
    #[must_use]
    pub fn order_by(mut self, expr: impl Into<Expression>, direction: Direction) -> Self {
        let expr = expr.into();
        self.tables.extend(expr.tables().cloned());
        self.order_by.push((expr, direction));
        self
    }

    /// Includes the foreign columns of selected tables, joining their owners
    /// on `id`.
    #[must_use]
    pub fn follow_references(mut self) -> Self {
        self.follow_references = true;
        self
    }

    /// Returns the tables required so far, excluding those added by
    /// following references.
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        self.tables.iter()
    }

    /// Returns the filters added so far.
    #[must_use]
    pub fn filters(&self) -> &[Expression] {
        &self.filters
    }

    /// Returns the bind parameters of the filters, in order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Renders the statement and its bind parameters.
    ///
    /// Rendering does not modify the query: calling it twice yields the
    /// same output.
    #[must_use]
    pub fn build(&self) -> (String, Vec<SqlValue>) {
        let mut tables = self.tables.clone();
        let mut joins = Vec::new();
        let mut columns = Vec::new();

        for selection in &self.selections {
            match selection {
                Selection::Table(table) => {
                    for (_, column) in table.columns() {
                        if table.is_foreign(column) {
                            if !self.follow_references {
                                continue;
                            }
                            tables.insert(column.table().clone());
                            joins.push(
                                column
                                    .table()
                                    .id_column()
                                    .compare_with(table.id_column(), "="),
                            );
                        }
                        columns.push(column.to_sql());
                    }
                }
                Selection::Column(column) => columns.push(column.to_sql()),
            }
        }

        let mut sql = format!("SELECT {}", columns.join(", "));

        if !tables.is_empty() {
            let names: Vec<&str> = tables.iter().map(TableRef::name).collect();
            sql.push_str("\nFROM ");
            sql.push_str(&names.join(", "));
        }

        let conditions: Vec<String> = self
            .filters
            .iter()
            .chain(&joins)
            .map(Expression::render_checked)
            .collect();
        if !conditions.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&conditions.join("\nAND "));
        }

        if !self.group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&render_ordering(&self.group_by));
        }

        if !self.order_by.is_empty() {
            sql.push_str("\nORDER BY ");
            sql.push_str(&render_ordering(&self.order_by));
        }

        let mut params = self.params.clone();
        for (expr, _) in self.group_by.iter().chain(&self.order_by) {
            params.extend_from_slice(expr.params());
        }

        (sql, params)
    }

    /// Renders the query and runs it through `executor`.
    ///
    /// Exactly one request is issued. The executor's result is returned
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns the executor's error unchanged.
    pub async fn execute<E: Executor>(&self, executor: &E) -> Result<E::Rows, E::Error> {
        let (sql, params) = self.build();
        debug!(sql = %sql, params = params.len(), "Executing query");
        executor.execute(&sql, &params).await
    }
}

fn render_ordering(entries: &[(Expression, Direction)]) -> String {
    entries
        .iter()
        .map(|(expr, direction)| format!("{} {direction}", expr.render_checked()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{func, or, Operand};
    use crate::schema::{Schema, TableDef, TableId};

    fn schema() -> (Schema, TableId, TableId) {
        let mut schema = Schema::new();
        let users = schema
            .define(TableDef::new("users").columns(["name"]))
            .unwrap();
        let owner = schema[users].column("name").unwrap().clone();
        let items = schema
            .define(
                TableDef::new("items")
                    .columns(["name", "status"])
                    .reference("owner_name", owner),
            )
            .unwrap();
        (schema, users, items)
    }

    #[test]
    fn test_basic_select() {
        let (schema, users, _) = schema();
        let (sql, params) = Query::new(&schema[users]).build();
        assert_eq!(sql, "SELECT users.id, users.name\nFROM users");
        assert!(params.is_empty());
    }

    #[test]
    fn test_select_single_column() {
        let (schema, users, _) = schema();
        let name = schema[users].column("name").unwrap();
        assert_eq!(
            Query::new(name).to_string(),
            "SELECT users.name\nFROM users"
        );
    }

    #[test]
    fn test_select_with_multiple_filters() {
        let (schema, _, items) = schema();
        let items = &schema[items];
        let name = items.column("name").unwrap();
        let status = items.column("status").unwrap();
        let (sql, params) = Query::new(items)
            .filter(name.compare("Alice"))
            .filter(status.compare_with("open", "!="))
            .build();
        assert_eq!(
            sql,
            "SELECT items.id, items.name, items.status\nFROM items\n\
             WHERE items.name is ?\nAND items.status != ?"
        );
        assert_eq!(
            params,
            [
                SqlValue::Text(String::from("Alice")),
                SqlValue::Text(String::from("open"))
            ]
        );
    }

    #[test]
    fn test_foreign_columns_skipped_by_default() {
        let (schema, _, items) = schema();
        let sql = Query::new(&schema[items]).to_string();
        assert_eq!(sql, "SELECT items.id, items.name, items.status\nFROM items");
    }

    #[test]
    fn test_follow_references_joins_owner() {
        let (schema, _, items) = schema();
        let sql = Query::new(&schema[items]).follow_references().to_string();
        assert_eq!(
            sql,
            "SELECT items.id, items.name, items.status, users.name\n\
             FROM items, users\n\
             WHERE users.id = items.id"
        );
    }

    #[test]
    fn test_filter_on_other_table_adds_it_to_from() {
        let (schema, users, items) = schema();
        let name = schema[users].column("name").unwrap();
        let sql = Query::new(&schema[items]).filter(name.compare("Bob")).to_string();
        assert!(sql.contains("\nFROM items, users\n"));
    }

    #[test]
    fn test_empty_filter_is_ignored() {
        let (schema, users, _) = schema();
        let query = Query::new(&schema[users]).filter(or(Vec::new()));
        assert!(query.filters().is_empty());
        assert_eq!(query.to_string(), "SELECT users.id, users.name\nFROM users");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "placeholders and bind parameters out of step")]
    fn test_filter_rendering_extra_placeholders_panics() {
        let (schema, users, _) = schema();
        let users = &schema[users];
        let name = users.column("name").unwrap();
        let broken = Expression::new([Operand::from(name), Operand::from(5)], |parts| {
            format!("{0} = {1} OR {0} > {1}", parts[0], parts[1])
        });
        let _ = Query::new(users).filter(broken).build();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "placeholders and bind parameters out of step")]
    fn test_ordering_dropping_a_placeholder_panics() {
        let (schema, users, _) = schema();
        let users = &schema[users];
        let name = users.column("name").unwrap();
        let broken = Expression::new([Operand::from(name), Operand::from("x")], |parts| {
            format!("instr({}, 'x')", parts[0])
        });
        let _ = Query::new(users).order_by(broken, Direction::Asc).build();
    }

    #[test]
    fn test_raw_question_mark_is_not_a_placeholder() {
        let (schema, users, _) = schema();
        let users = &schema[users];
        let (sql, params) = Query::new(users)
            .filter(Expression::raw("users.name <> '?'"))
            .build();
        assert!(sql.ends_with("WHERE users.name <> '?'"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_raw_direction_passes_through() {
        let (schema, users, _) = schema();
        let users = &schema[users];
        let name = users.column("name").unwrap();
        let sql = Query::new(users)
            .order_by(name, Direction::Raw(String::from("DESC NULLS LAST")))
            .to_string();
        assert!(sql.ends_with("\nORDER BY users.name DESC NULLS LAST"));
    }

    #[test]
    fn test_group_and_order_by() {
        let (schema, _, items) = schema();
        let items = &schema[items];
        let status = items.column("status").unwrap();
        let name = items.column("name").unwrap();
        let sql = Query::new(status)
            .select(Column::clone(name))
            .group_by(status, Direction::Asc)
            .order_by(func("lower", [name]), Direction::Desc)
            .order_by(status, Direction::Asc)
            .to_string();
        assert_eq!(
            sql,
            "SELECT items.status, items.name\nFROM items\n\
             GROUP BY items.status ASC\n\
             ORDER BY lower(items.name) DESC, items.status ASC"
        );
    }

    #[test]
    fn test_order_by_params_follow_filter_params() {
        let (schema, _, items) = schema();
        let items = &schema[items];
        let name = items.column("name").unwrap();
        let (sql, params) = Query::new(name)
            .order_by(func("instr", [crate::expr::Operand::from(name), "x".into()]), Direction::Asc)
            .filter(name.compare(1))
            .build();
        assert!(sql.ends_with("WHERE items.name is ?\nORDER BY instr(items.name,?) ASC"));
        assert_eq!(params, [SqlValue::Int(1), SqlValue::Text(String::from("x"))]);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let (schema, _, items) = schema();
        let items = &schema[items];
        let query = Query::new(items)
            .follow_references()
            .filter(items.column("name").unwrap().compare("x"));
        assert_eq!(query.build(), query.build());
        assert_eq!(query.tables().count(), 1);
    }
}
