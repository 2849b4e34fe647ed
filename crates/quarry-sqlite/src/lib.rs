//! # quarry-sqlite
//!
//! Runs quarry queries against SQLite through `sqlx`.
//!
//! ```ignore
//! use quarry_core::{Query, Schema};
//! use quarry_sqlite::{decode_rows, SqliteExecutor};
//!
//! async fn example(schema: &Schema) -> anyhow::Result<()> {
//!     let executor = SqliteExecutor::connect("sqlite:tracker.db").await?;
//!     let task = schema.table_named("task").unwrap();
//!
//!     let rows = Query::new(task)
//!         .filter(task.column("status").unwrap().compare("open"))
//!         .execute(&executor)
//!         .await?;
//!
//!     for row in decode_rows(&rows)? {
//!         println!("{row:?}");
//!     }
//!     Ok(())
//! }
//! ```

mod decode;
mod executor;

pub use decode::{decode_row, decode_rows, DecodeError};
pub use executor::SqliteExecutor;
