//! Database driver seam.
//!
//! Drivers own the wire-level work: opening physical connections, running
//! statements and decoding rows. The rest of the crate only talks to them
//! through these traits.

pub mod sqlite;

pub use sqlite::SqliteDriver;

use crate::database::ConnectOptions;
use crate::error::Result;
use crate::value::Value;

/// A statement ready to run on a driver connection.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    /// SQL text.
    pub sql: String,
    /// Positional parameters, already normalized for binding.
    pub params: Vec<Value>,
    /// Request a forward-only cursor.
    pub forward_only: bool,
}

impl Statement {
    /// Create a statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            forward_only: false,
        }
    }

    /// Set positional parameters.
    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    /// Request a forward-only cursor.
    pub fn with_forward_only(mut self, forward_only: bool) -> Self {
        self.forward_only = forward_only;
        self
    }
}

/// Rows and counters produced by one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Result rows, in driver order.
    pub rows: Vec<Vec<Value>>,
    /// Rows changed by a DML statement.
    pub rows_affected: u64,
}

impl ResultSet {
    /// Result of a statement that returns no rows.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows: Vec::new(),
            rows_affected,
        }
    }

    /// Result holding rows.
    pub fn with_rows(rows: Vec<Vec<Value>>) -> Self {
        Self {
            rows,
            rows_affected: 0,
        }
    }
}

/// Factory for physical connections of one driver.
pub trait Driver: Send + Sync + 'static {
    /// Driver name, e.g. `sqlite`, `postgres` or `odbc`.
    fn name(&self) -> &str;

    /// Open a new physical connection.
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn DriverConnection>>;
}

/// One open physical connection.
pub trait DriverConnection: Send {
    /// Run a statement and collect its result.
    fn execute(&mut self, statement: &Statement) -> Result<ResultSet>;
}
