//! # quarry-core
//!
//! Composable SELECT construction with join inference and parameter binding.
//!
//! This crate provides:
//! - A schema registry of tables and columns, with logical aliases, foreign
//!   ("virtual") columns and logical parent tables
//! - Expressions that turn literals into `?` placeholders and track the
//!   tables they touch
//! - A lazy query builder that infers the tables to list in FROM and the
//!   join predicates to add to WHERE
//! - An [`Executor`] trait so rendered queries can be run by any storage
//!
//! ## Building a query
//!
//! ```rust
//! use quarry_core::{Direction, Query, Schema, TableDef};
//!
//! let mut schema = Schema::new();
//! let users = schema.define(TableDef::new("users").columns(["name"])).unwrap();
//! let owner = schema[users].column("name").unwrap().clone();
//! let items = schema
//!     .define(TableDef::new("items").columns(["title"]).reference("owner", owner))
//!     .unwrap();
//!
//! let items = &schema[items];
//! let title = items.column("title").unwrap();
//!
//! let (sql, params) = Query::new(items)
//!     .follow_references()
//!     .filter(title.compare_with("report", "contains"))
//!     .order_by(title, Direction::Desc)
//!     .build();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT items.id, items.title, users.name\n\
//!      FROM items, users\n\
//!      WHERE items.title like ?\n\
//!      AND users.id = items.id\n\
//!      ORDER BY items.title DESC"
//! );
//! assert_eq!(params[0].as_text(), Some("%report%"));
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Literals never reach the SQL text:
//!
//! ```rust
//! use quarry_core::{Query, Schema, SqlValue, TableDef};
//!
//! let mut schema = Schema::new();
//! let users = schema.define(TableDef::new("users").columns(["name"])).unwrap();
//! let users = &schema[users];
//!
//! let user_input = "'; DROP TABLE users; --";
//! let (sql, params) = Query::new(users)
//!     .filter(users.column("name").unwrap().compare(user_input))
//!     .build();
//!
//! assert!(sql.ends_with("WHERE users.name is ?"));
//! assert_eq!(params, [SqlValue::Text(String::from(user_input))]);
//! ```

mod error;
pub mod executor;
pub mod expr;
pub mod filter;
pub mod query;
pub mod schema;
pub mod value;

pub use error::{Result, SchemaError};
pub use executor::Executor;
pub use expr::{and, func, or, Expression, Operand};
pub use filter::{normalize, FilterTriple};
pub use query::{Direction, Query, Selection};
pub use schema::{Column, Schema, Table, TableDef, TableId, TableRef};
pub use value::{SqlValue, ToSqlValue};
