//! Database family detection.
//!
//! A family groups drivers that share an SQL dialect. It decides which
//! initialization a fresh connection receives and how queries are set up.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::query::Query;

/// SQL dialect category of a connection.
///
/// Discriminants follow the classic DBMS type numbering so that persisted
/// configuration stays compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DatabaseFamily {
    /// Driver not recognized.
    #[default]
    Unknown = 0,
    /// Microsoft SQL Server.
    MsSql = 1,
    /// MySQL and MariaDB.
    MySql = 2,
    /// PostgreSQL.
    PostgreSql = 3,
    /// SQLite.
    Sqlite = 6,
}

impl DatabaseFamily {
    /// Numeric code of this family.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Family for a numeric code, `None` for codes that name no family.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::MsSql),
            2 => Some(Self::MySql),
            3 => Some(Self::PostgreSql),
            6 => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Family implied by a driver name alone.
    ///
    /// Generic ODBC drivers return `Unknown` here; they need a live probe.
    pub fn from_driver_name(driver: &str) -> Self {
        match driver.to_ascii_lowercase().as_str() {
            "mysql" | "mysql3" | "mariadb" => Self::MySql,
            "sqlite" | "sqlite2" | "sqlite3" => Self::Sqlite,
            "postgres" | "postgresql" | "psql" => Self::PostgreSql,
            "mssql" | "sqlserver" => Self::MsSql,
            _ => Self::Unknown,
        }
    }

    /// Whether queries on this family default to a forward-only cursor.
    pub fn prefers_forward_only(self) -> bool {
        self == Self::MsSql
    }

    /// Quote an identifier in this family's dialect.
    pub fn quote_identifier(self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::MsSql => format!("[{}]", ident.replace(']', "]]")),
            _ => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }
}

impl fmt::Display for DatabaseFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::MsSql => "mssql",
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for DatabaseFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_driver_name(s) {
            Self::Unknown if !s.eq_ignore_ascii_case("unknown") => {
                Err(format!("unknown database family: {s}"))
            }
            family => Ok(family),
        }
    }
}

/// Resolves the family of a connection.
pub trait FamilyDetector: Send + Sync {
    /// Inspect `db` and return its family.
    fn detect(&self, db: &Database) -> DatabaseFamily;
}

/// Default detector: matches the driver name, probing ODBC connections with
/// dialect-specific statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct DriverNameDetector;

impl DriverNameDetector {
    fn probe_odbc(db: &Database) -> DatabaseFamily {
        let mut query = Query::new(db.clone());

        if query.exec_sql("SELECT sqlite_version()") {
            return DatabaseFamily::Sqlite;
        }

        if query.exec_sql("SELECT @@version")
            && query.next()
            && query
                .value(0)
                .is_some_and(|v| v.to_string().contains("Microsoft SQL"))
        {
            return DatabaseFamily::MsSql;
        }

        if query.exec_sql("SELECT version()") && query.next() {
            let is_postgres = query
                .value(0)
                .is_some_and(|v| v.to_string().contains("PostgreSQL"));
            return if is_postgres {
                DatabaseFamily::PostgreSql
            } else {
                DatabaseFamily::MySql
            };
        }

        DatabaseFamily::Unknown
    }
}

impl FamilyDetector for DriverNameDetector {
    fn detect(&self, db: &Database) -> DatabaseFamily {
        let Some(driver) = db.driver_name() else {
            return DatabaseFamily::Unknown;
        };
        if driver.to_ascii_lowercase().starts_with("odbc") {
            return Self::probe_odbc(db);
        }
        DatabaseFamily::from_driver_name(driver)
    }
}
