//! The execution boundary.
//!
//! The engine never talks to storage. [`Query::execute`] and [`Table::drop`]
//! hand the rendered text and its bind parameters to an [`Executor`] and
//! return whatever it returns.
//!
//! [`Query::execute`]: crate::query::Query::execute
//! [`Table::drop`]: crate::schema::Table::drop

use std::future::Future;

use crate::value::SqlValue;

/// Runs rendered SQL against some storage.
///
/// Implementations bind `params` positionally to the `?` placeholders of
/// `sql`. The engine issues exactly one call per execution and neither
/// retries nor inspects the outcome.
pub trait Executor {
    /// Result set type.
    type Rows;

    /// Storage-level error type.
    type Error;

    /// Executes `sql` with `params`.
    fn execute(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = Result<Self::Rows, Self::Error>> + Send;
}
