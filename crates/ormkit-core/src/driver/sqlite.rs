//! SQLite driver backed by rusqlite.
//!
//! Every clone of a SQLite handle opens its own connection to the same file.
//! An in-memory database is private to the connection that opened it, so
//! multi-threaded use needs a file path.

use rusqlite::types::{ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

use super::{Driver, DriverConnection, ResultSet, Statement};
use crate::database::ConnectOptions;
use crate::error::{Error, Result};
use crate::value::Value;

/// Path that selects a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// SQLite driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create the driver.
    pub fn new() -> Self {
        Self
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn DriverConnection>> {
        let conn = if options.database.is_empty() || options.database == MEMORY_PATH {
            Connection::open_in_memory()
        } else {
            Connection::open(&options.database)
        }
        .map_err(|e| Error::Connect(e.to_string()))?;

        Ok(Box::new(SqliteConnection { conn }))
    }
}

struct SqliteConnection {
    conn: Connection,
}

impl DriverConnection for SqliteConnection {
    fn execute(&mut self, statement: &Statement) -> Result<ResultSet> {
        let mut stmt = self.conn.prepare(&statement.sql)?;
        let params = params_from_iter(statement.params.iter());

        let column_count = stmt.column_count();
        if column_count == 0 {
            let affected = stmt.execute(params)?;
            return Ok(ResultSet::affected(affected as u64));
        }

        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(from_value_ref(row.get_ref(i)?));
            }
            out.push(values);
        }
        Ok(ResultSet::with_rows(out))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let output = match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(r) => ToSqlOutput::Owned(SqlValue::Real(*r)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::DateTime(dt) => ToSqlOutput::Owned(SqlValue::Text(dt.to_rfc3339())),
        };
        Ok(output)
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
