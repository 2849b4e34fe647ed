#![allow(dead_code)]

use std::sync::Mutex;

use quarry_core::{Executor, Schema, SqlValue, Table, TableDef};

/// A small task tracker schema.
///
/// - `users(id, name)`
/// - `projects(id, title)`, child of `users`
/// - `tbl_task(id, task_title AS title, status, priority)` exposing
///   `owner_name` (users.name) and `project_title` (projects.title)
pub fn tracker() -> Schema {
    let mut schema = Schema::new();

    let users = schema
        .define(TableDef::new("users").columns(["name"]))
        .unwrap_or_else(|e| panic!("users: {e}"));
    let projects = schema
        .define(TableDef::new("projects").columns(["title"]))
        .unwrap_or_else(|e| panic!("projects: {e}"));
    schema.set_parent(projects, users).unwrap();

    let owner_name = schema[users].column("name").unwrap().clone();
    let project_title = schema[projects].column("title").unwrap().clone();
    schema
        .define(
            TableDef::new("tbl_task")
                .logical_name("task")
                .columns(["task_title", "status", "priority"])
                .alias("task_title", "title")
                .reference("owner_name", owner_name)
                .reference("project_title", project_title),
        )
        .unwrap_or_else(|e| panic!("tasks: {e}"));

    schema
}

pub fn table<'s>(schema: &'s Schema, name: &str) -> &'s Table {
    schema
        .table_named(name)
        .unwrap_or_else(|| panic!("no table named {name}"))
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(String::from(s))
}

/// Counts `?` placeholders in rendered text.
pub fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

/// Storage error returned by [`RecordingExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError(pub String);

/// Records every call and answers with canned rows.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub calls: Mutex<Vec<(String, Vec<SqlValue>)>>,
    pub rows: Vec<Vec<SqlValue>>,
    pub fail_with: Option<String>,
}

impl RecordingExecutor {
    pub fn returning(rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for RecordingExecutor {
    type Rows = Vec<Vec<SqlValue>>;
    type Error = StorageError;

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Self::Rows, Self::Error> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        match &self.fail_with {
            Some(message) => Err(StorageError(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}
