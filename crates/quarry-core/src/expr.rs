//! Composable SQL expressions.
//!
//! An [`Expression`] is an ordered list of operands plus a rendering
//! strategy. Operands are classified once, when the expression is built:
//!
//! - a literal becomes a `?` placeholder and is appended to the bind
//!   parameters, preserving left-to-right order;
//! - a column registers its owning table;
//! - a nested expression contributes its tables and bind parameters.
//!
//! Expressions are immutable afterwards.
//!
//! ```rust
//! use quarry_core::expr::{func, or};
//! use quarry_core::schema::{Schema, TableDef};
//!
//! let mut schema = Schema::new();
//! let t = schema.define(TableDef::new("t").columns(["name"])).unwrap();
//! let name = schema[t].column("name").unwrap();
//!
//! let expr = or([name.compare("John"), name.compare_with("J", "starts-with")]);
//! assert_eq!(expr.to_string(), "(t.name is ? OR t.name like ?)");
//!
//! let upper = func("upper", [name]);
//! assert_eq!(upper.to_string(), "upper(t.name)");
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;

use crate::schema::{Column, TableRef};
use crate::value::{SqlValue, ToSqlValue};

/// An operand handed to an expression constructor.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A literal, bound as a parameter.
    Literal(SqlValue),
    /// A column reference.
    Column(Column),
    /// A nested expression.
    Nested(Expression),
}

impl<T: ToSqlValue> From<T> for Operand {
    fn from(value: T) -> Self {
        Self::Literal(value.to_sql_value())
    }
}

impl From<Column> for Operand {
    fn from(column: Column) -> Self {
        Self::Column(column)
    }
}

impl From<&Column> for Operand {
    fn from(column: &Column) -> Self {
        Self::Column(column.clone())
    }
}

impl From<Expression> for Operand {
    fn from(expr: Expression) -> Self {
        Self::Nested(expr)
    }
}

/// Boolean connective of a junction expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    /// All operands must hold.
    And,
    /// At least one operand must hold.
    Or,
}

impl Junction {
    const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    /// Value of the junction over zero operands.
    const fn neutral(self) -> &'static str {
        match self {
            Self::And => "TRUE",
            Self::Or => "FALSE",
        }
    }
}

type RenderFn = dyn Fn(&[String]) -> String + Send + Sync;

#[derive(Clone)]
enum Render {
    Operand,
    Comparison(String),
    Junction(Junction),
    Function(String),
    Raw(String),
    Custom(Arc<RenderFn>),
}

impl fmt::Debug for Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Operand => f.write_str("Operand"),
            Self::Comparison(op) => f.debug_tuple("Comparison").field(op).finish(),
            Self::Junction(j) => f.debug_tuple("Junction").field(j).finish(),
            Self::Function(name) => f.debug_tuple("Function").field(name).finish(),
            Self::Raw(sql) => f.debug_tuple("Raw").field(sql).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// An operand after classification. Literals are only placeholders here;
/// their values live in [`Expression::params`].
#[derive(Debug, Clone)]
enum Slot {
    Placeholder,
    Column(Column),
    Nested(Expression),
}

impl Slot {
    fn to_sql(&self) -> String {
        match self {
            Self::Placeholder => String::from(SqlValue::placeholder()),
            Self::Column(column) => column.to_sql(),
            Self::Nested(expr) => expr.to_string(),
        }
    }
}

/// A composite SQL expression.
#[derive(Debug, Clone)]
pub struct Expression {
    slots: Vec<Slot>,
    tables: IndexSet<TableRef>,
    params: Vec<SqlValue>,
    render: Render,
}

impl Expression {
    /// Creates an expression rendered by `render`.
    ///
    /// `render` receives the rendered operands in order: `?` for literals,
    /// `table.column` for columns and the rendered text of nested
    /// expressions.
    ///
    /// ```rust
    /// use quarry_core::expr::{Expression, Operand};
    ///
    /// let between = Expression::new(
    ///     [Operand::from(3), Operand::from(9)],
    ///     |parts| format!("price BETWEEN {} AND {}", parts[0], parts[1]),
    /// );
    /// assert_eq!(between.to_string(), "price BETWEEN ? AND ?");
    /// assert_eq!(between.params().len(), 2);
    /// ```
    #[must_use]
    pub fn new<I, F>(operands: I, render: F) -> Self
    where
        I: IntoIterator<Item = Operand>,
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        Self::build(operands, Render::Custom(Arc::new(render)))
    }

    fn build(operands: impl IntoIterator<Item = Operand>, render: Render) -> Self {
        let mut slots = Vec::new();
        let mut tables = IndexSet::new();
        let mut params = Vec::new();

        for operand in operands {
            match operand {
                Operand::Literal(value) => {
                    params.push(value);
                    slots.push(Slot::Placeholder);
                }
                Operand::Column(column) => {
                    tables.insert(column.table().clone());
                    slots.push(Slot::Column(column));
                }
                Operand::Nested(expr) => {
                    tables.extend(expr.tables.iter().cloned());
                    params.extend(expr.params.iter().cloned());
                    slots.push(Slot::Nested(expr));
                }
            }
        }

        Self {
            slots,
            tables,
            params,
            render,
        }
    }

    /// Creates `left <operator> right`.
    pub(crate) fn comparison(left: Operand, operator: &str, right: Operand) -> Self {
        Self::build([left, right], Render::Comparison(operator.to_string()))
    }

    /// Joins expressions with `AND`.
    ///
    /// Empty operands are dropped. With no operands left the expression is
    /// [empty](Self::is_empty); a single operand renders without
    /// parentheses.
    #[must_use]
    pub fn and(exprs: impl IntoIterator<Item = Self>) -> Self {
        Self::junction(Junction::And, exprs)
    }

    /// Joins expressions with `OR`. See [`Expression::and`] for the edge
    /// cases.
    #[must_use]
    pub fn or(exprs: impl IntoIterator<Item = Self>) -> Self {
        Self::junction(Junction::Or, exprs)
    }

    fn junction(junction: Junction, exprs: impl IntoIterator<Item = Self>) -> Self {
        Self::build(
            exprs
                .into_iter()
                .filter(|expr| !expr.is_empty())
                .map(Operand::Nested),
            Render::Junction(junction),
        )
    }

    /// Creates a function call `name(arg1,arg2,...)`.
    #[must_use]
    pub fn func<I>(name: &str, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        Self::build(
            args.into_iter().map(Into::into),
            Render::Function(name.to_string()),
        )
    }

    /// Creates a verbatim SQL fragment without operands.
    ///
    /// **Warning**: never put user input here; compare columns with values
    /// instead so they are bound as parameters.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::build(Vec::new(), Render::Raw(sql.into()))
    }

    /// Returns whether this is a junction without operands.
    ///
    /// Queries ignore empty filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self.render, Render::Junction(_)) && self.slots.is_empty()
    }

    /// Returns the bind parameters, in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Returns the tables referenced by this expression, deduplicated.
    pub fn tables(&self) -> impl Iterator<Item = &TableRef> {
        self.tables.iter()
    }

    /// Counts the `?` characters written verbatim by raw fragments in this
    /// expression and its children. Those are not bind placeholders.
    pub(crate) fn raw_question_marks(&self) -> usize {
        let own = match &self.render {
            Render::Raw(sql) => sql.matches(SqlValue::placeholder()).count(),
            _ => 0,
        };
        let nested: usize = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Nested(expr) => expr.raw_question_marks(),
                Slot::Placeholder | Slot::Column(_) => 0,
            })
            .sum();
        own + nested
    }

    /// Renders the expression, checking in debug builds that it contains
    /// one placeholder per bind parameter.
    pub(crate) fn render_checked(&self) -> String {
        let sql = self.to_string();
        debug_assert_eq!(
            sql.matches(SqlValue::placeholder())
                .count()
                .saturating_sub(self.raw_question_marks()),
            self.params.len(),
            "placeholders and bind parameters out of step in `{sql}`"
        );
        sql
    }
}

impl From<Column> for Expression {
    fn from(column: Column) -> Self {
        Self::build([Operand::Column(column)], Render::Operand)
    }
}

impl From<&Column> for Expression {
    fn from(column: &Column) -> Self {
        Self::from(column.clone())
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.slots.iter().map(Slot::to_sql).collect();

        match &self.render {
            Render::Operand => f.write_str(&parts.concat()),
            Render::Comparison(op) => f.write_str(&parts.join(&format!(" {op} "))),
            Render::Junction(junction) => match parts.as_slice() {
                [] => f.write_str(junction.neutral()),
                [single] => f.write_str(single),
                _ => write!(f, "({})", parts.join(&format!(" {} ", junction.keyword()))),
            },
            Render::Function(name) => write!(f, "{name}({})", parts.join(",")),
            Render::Raw(sql) => f.write_str(sql),
            Render::Custom(render) => f.write_str(&render(&parts)),
        }
    }
}

/// Joins expressions with `AND`.
#[must_use]
pub fn and(exprs: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::and(exprs)
}

/// Joins expressions with `OR`.
#[must_use]
pub fn or(exprs: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::or(exprs)
}

/// Creates a function call expression.
#[must_use]
pub fn func<I>(name: &str, args: I) -> Expression
where
    I: IntoIterator,
    I::Item: Into<Operand>,
{
    Expression::func(name, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Schema, TableDef};

    fn name_and_owner() -> (Column, Column) {
        let mut schema = Schema::new();
        let t = schema.define(TableDef::new("t").columns(["name"])).unwrap();
        let o = schema.define(TableDef::new("o").columns(["owner"])).unwrap();
        (
            schema[t].column("name").unwrap().clone(),
            schema[o].column("owner").unwrap().clone(),
        )
    }

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(String::from(s))
    }

    #[test]
    fn test_or_of_two() {
        let (name, _) = name_and_owner();
        let expr = or([name.compare("John"), name.compare_with("J", "starts-with")]);
        assert_eq!(expr.to_string(), "(t.name is ? OR t.name like ?)");
        assert_eq!(expr.params(), [text("John"), text("J%")]);
    }

    #[test]
    fn test_and_of_two() {
        let (name, owner) = name_and_owner();
        let expr = and([name.compare("a"), owner.compare_with(2, ">")]);
        assert_eq!(expr.to_string(), "(t.name is ? AND o.owner > ?)");
        assert_eq!(expr.params(), [text("a"), SqlValue::Int(2)]);
        let tables: Vec<&str> = expr.tables().map(TableRef::name).collect();
        assert_eq!(tables, ["t", "o"]);
    }

    #[test]
    fn test_junction_without_operands_is_empty() {
        let expr = and(Vec::new());
        assert!(expr.is_empty());
        assert_eq!(expr.to_string(), "TRUE");
        assert_eq!(or(Vec::new()).to_string(), "FALSE");
        assert!(expr.params().is_empty());
    }

    #[test]
    fn test_junction_with_single_operand_has_no_parens() {
        let (name, _) = name_and_owner();
        let expr = or([name.compare("John")]);
        assert!(!expr.is_empty());
        assert_eq!(expr.to_string(), "t.name is ?");
        assert_eq!(expr.params(), [text("John")]);
    }

    #[test]
    fn test_empty_children_are_dropped() {
        let (name, _) = name_and_owner();
        let expr = and([and(Vec::new()), name.compare(1), or(Vec::new())]);
        assert_eq!(expr.to_string(), "t.name is ?");
    }

    #[test]
    fn test_nested_params_keep_textual_order() {
        let (name, owner) = name_and_owner();
        let expr = and([
            name.compare(1),
            or([owner.compare(2), name.compare_with(3, "<")]),
            owner.compare(4),
        ]);
        assert_eq!(
            expr.to_string(),
            "(t.name is ? AND (o.owner is ? OR t.name < ?) AND o.owner is ?)"
        );
        assert_eq!(
            expr.params(),
            [
                SqlValue::Int(1),
                SqlValue::Int(2),
                SqlValue::Int(3),
                SqlValue::Int(4)
            ]
        );
        assert_eq!(expr.render_checked().matches('?').count(), 4);
    }

    #[test]
    fn test_func_renders_without_spaces() {
        let (name, _) = name_and_owner();
        let expr = func("substr", [Operand::from(&name), Operand::from(1), Operand::from(3)]);
        assert_eq!(expr.to_string(), "substr(t.name,?,?)");
        assert_eq!(expr.params(), [SqlValue::Int(1), SqlValue::Int(3)]);
    }

    #[test]
    fn test_func_as_comparison_target() {
        let (name, _) = name_and_owner();
        let expr = name.compare_with(func("lower", ["JOHN"]), "=");
        assert_eq!(expr.to_string(), "t.name = lower(?)");
        assert_eq!(expr.params(), [text("JOHN")]);
    }

    #[test]
    fn test_raw_fragment() {
        let expr = Expression::raw("1 = 0");
        assert_eq!(expr.to_string(), "1 = 0");
        assert!(expr.params().is_empty());
        assert!(!expr.is_empty());
    }

    #[test]
    fn test_raw_question_marks_are_not_placeholders() {
        let (name, _) = name_and_owner();
        let expr = and([Expression::raw("t.note <> '?'"), name.compare("x")]);
        assert_eq!(expr.raw_question_marks(), 1);
        assert_eq!(expr.render_checked(), "(t.note <> '?' AND t.name is ?)");
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "placeholders and bind parameters out of step")]
    fn test_render_repeating_an_operand_is_caught() {
        let expr = Expression::new([Operand::from(5)], |parts| {
            format!("t.a = {} OR t.a > {}", parts[0], parts[0])
        });
        let _ = expr.render_checked();
    }

    #[test]
    fn test_custom_render_sees_placeholders() {
        let (name, _) = name_and_owner();
        let expr = Expression::new([Operand::from(&name), Operand::from("x")], |parts| {
            format!("{} GLOB {}", parts[0], parts[1])
        });
        assert_eq!(expr.to_string(), "t.name GLOB ?");
        assert_eq!(expr.params(), [text("x")]);
    }

    #[test]
    fn test_column_expression() {
        let (name, _) = name_and_owner();
        let expr = Expression::from(&name);
        assert_eq!(expr.to_string(), "t.name");
        assert_eq!(expr.tables().count(), 1);
    }
}
