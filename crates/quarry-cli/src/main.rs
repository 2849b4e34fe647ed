//! quarry CLI
//!
//! Renders and runs SELECT queries over a schema described in JSON.

mod args;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use quarry_core::{Schema, SchemaError, SqlValue};
use quarry_sqlite::{decode_rows, SqliteExecutor};
use serde_json::{Map, Value};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::args::{lookup, QueryArgs};

/// Render and run SQL SELECT queries.
#[derive(Parser)]
#[command(name = "quarry")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// JSON schema description.
    #[arg(short, long, default_value = "schema.json")]
    schema: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL and bind parameters of a query without running it.
    Render(QueryArgs),

    /// Run a query and print each row as a JSON object.
    Query(QueryArgs),

    /// Show the columns and logical ancestors of a table.
    Describe {
        /// Table name.
        table: String,
    },

    /// Drop a table.
    DropTable {
        /// Table name.
        table: String,

        /// Confirm the drop.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let schema = Schema::load(&cli.schema)
        .with_context(|| format!("failed to load schema from {}", cli.schema.display()))?;

    match cli.command {
        Commands::Render(args) => {
            let (sql, params) = args.build(&schema)?.build();
            println!("{sql}");
            println!("{}", serde_json::to_string(&params)?);
        }

        Commands::Query(args) => {
            let query = args.build(&schema)?;
            let executor = SqliteExecutor::connect(&cli.database).await?;
            let rows = query.execute(&executor).await?;
            info!(count = rows.len(), "Query returned rows");
            for row in decode_rows(&rows)? {
                println!("{}", row_to_json(row)?);
            }
        }

        Commands::Describe { table } => {
            for line in describe(&schema, &table)? {
                println!("{line}");
            }
        }

        Commands::DropTable { table, yes } => {
            let table = lookup(&schema, &table)?;
            if !yes {
                bail!("refusing to drop table '{}' without --yes", table.name());
            }
            let executor = SqliteExecutor::connect(&cli.database).await?;
            table.drop(&executor).await?;
        }
    }

    Ok(())
}

/// Turns a decoded row into a JSON object keyed by column name.
fn row_to_json(row: Vec<(String, SqlValue)>) -> serde_json::Result<Value> {
    let mut object = Map::new();
    for (name, value) in row {
        object.insert(name, serde_json::to_value(value)?);
    }
    Ok(Value::Object(object))
}

fn describe(schema: &Schema, name: &str) -> Result<Vec<String>, SchemaError> {
    let table = lookup(schema, name)?;

    let mut lines = vec![format!("{} ({})", table.name(), table.logical_name())];
    for (logical, column) in table.columns() {
        let marker = if table.is_foreign(column) { "  [foreign]" } else { "" };
        lines.push(format!("  {logical:<16} {column}{marker}"));
    }

    let ancestors: Vec<&str> = schema
        .ancestors(table.id())
        .into_iter()
        .map(|id| schema[id].name())
        .collect();
    if !ancestors.is_empty() {
        lines.push(format!("ancestors: {}", ancestors.join(" -> ")));
    }

    Ok(lines)
}
