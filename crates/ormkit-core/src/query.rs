//! Statement execution with optional SQL diagnostics.
//!
//! Every statement the crate issues goes through [`Query`]. When diagnostics
//! are enabled the statement text and its bound values are logged before
//! execution, and driver errors are logged after a failure. Diagnostics never
//! change the outcome of a statement.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::database::Database;
use crate::driver::{ResultSet, Statement};
use crate::error::Error;
use crate::value::Value;

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Whether SQL diagnostics are logged.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Enable or disable SQL diagnostics for the whole process.
pub fn set_debug_enabled(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

/// A statement bound to a connection.
#[derive(Debug)]
pub struct Query {
    db: Database,
    sql: String,
    bound: Vec<Value>,
    forward_only: bool,
    result: ResultSet,
    cursor: Option<usize>,
    last_error: Option<Error>,
}

impl Query {
    /// Create a query on `db`.
    ///
    /// Families that prefer it get a forward-only cursor by default.
    pub fn new(db: Database) -> Self {
        let forward_only = db.family().prefers_forward_only();
        Self {
            db,
            sql: String::new(),
            bound: Vec::new(),
            forward_only,
            result: ResultSet::default(),
            cursor: None,
            last_error: None,
        }
    }

    /// Set the statement text, clearing previously bound values.
    pub fn prepare(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
        self.bound.clear();
    }

    /// Bind the next positional value.
    pub fn add_bind_value(&mut self, value: impl Into<Value>) {
        self.bound.push(value.into().into_bindable());
    }

    /// Whether the cursor is forward-only.
    pub fn is_forward_only(&self) -> bool {
        self.forward_only
    }

    /// Request or release a forward-only cursor.
    pub fn set_forward_only(&mut self, forward_only: bool) {
        self.forward_only = forward_only;
    }

    /// Statement text most recently prepared or executed.
    pub fn last_query(&self) -> &str {
        &self.sql
    }

    /// Values bound to the prepared statement.
    pub fn bound_values(&self) -> &[Value] {
        &self.bound
    }

    /// Error from the last failed execution.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Run the prepared statement with its bound values.
    pub fn exec(&mut self) -> bool {
        if is_debug_enabled() {
            debug!(sql = %self.sql, "SQL query");
            for (index, value) in self.bound.iter().enumerate() {
                debug!(index, value = %value, "SQL   bound");
            }
        }
        let statement = Statement::new(self.sql.clone())
            .with_params(self.bound.clone())
            .with_forward_only(self.forward_only);
        self.run(statement)
    }

    /// Run `sql` directly, without bound values.
    pub fn exec_sql(&mut self, sql: &str) -> bool {
        if is_debug_enabled() {
            debug!(sql = %sql, "SQL query");
        }
        self.sql = sql.to_string();
        self.bound.clear();
        let statement = Statement::new(sql).with_forward_only(self.forward_only);
        self.run(statement)
    }

    fn run(&mut self, statement: Statement) -> bool {
        self.cursor = None;
        match self.db.execute(&statement) {
            Ok(result) => {
                self.result = result;
                self.last_error = None;
                true
            }
            Err(e) => {
                if is_debug_enabled() {
                    warn!(error = %e, "SQL error");
                }
                self.result = ResultSet::default();
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Advance to the next result row. Returns `false` past the last row.
    pub fn next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.result.rows.len() {
            self.cursor = Some(next);
            true
        } else {
            self.cursor = Some(self.result.rows.len());
            false
        }
    }

    /// Column `index` of the current row.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.cursor
            .and_then(|row| self.result.rows.get(row))
            .and_then(|row| row.get(index))
    }

    /// Rows changed by the last statement.
    pub fn rows_affected(&self) -> u64 {
        self.result.rows_affected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ConnectOptions;
    use crate::driver::SqliteDriver;
    use crate::family::DatabaseFamily;
    use std::sync::Arc;

    fn open_memory() -> Database {
        let db = Database::new(
            "q",
            Arc::new(SqliteDriver::new()),
            ConnectOptions::new(":memory:"),
        );
        assert!(db.open());
        db
    }

    #[test]
    fn test_exec_prepared_with_bindings() {
        let db = open_memory();
        let mut query = Query::new(db.clone());
        assert!(query.exec_sql("CREATE TABLE t (id INTEGER, name TEXT)"));

        query.prepare("INSERT INTO t (id, name) VALUES (?1, ?2)");
        query.add_bind_value(1);
        query.add_bind_value("alice");
        assert_eq!(query.bound_values().len(), 2);
        assert!(query.exec());
        assert_eq!(query.rows_affected(), 1);

        assert!(query.exec_sql("SELECT name FROM t"));
        assert!(query.next());
        assert_eq!(query.value(0), Some(&Value::Text("alice".into())));
        assert!(!query.next());
        assert!(query.value(0).is_none());
    }

    #[test]
    fn test_exec_failure_returns_false() {
        let mut query = Query::new(open_memory());
        assert!(!query.exec_sql("SELECT * FROM missing"));
        assert!(query.last_error().is_some());
        assert_eq!(query.last_query(), "SELECT * FROM missing");
    }

    #[test]
    fn test_exec_on_closed_handle_fails() {
        let mut query = Query::new(Database::invalid());
        assert!(!query.exec_sql("SELECT 1"));
        assert!(matches!(query.last_error(), Some(Error::InvalidHandle)));
    }

    #[test]
    fn test_forward_only_follows_family() {
        let db = open_memory();
        assert!(!Query::new(db.clone()).is_forward_only());

        db.set_family(DatabaseFamily::MsSql);
        let mut query = Query::new(db);
        assert!(query.is_forward_only());
        query.set_forward_only(false);
        assert!(!query.is_forward_only());
    }

    #[test]
    fn test_prepare_clears_bindings() {
        let mut query = Query::new(open_memory());
        query.prepare("SELECT ?1");
        query.add_bind_value(5);
        query.prepare("SELECT 1");
        assert!(query.bound_values().is_empty());
    }
}
