//! Named connection handles.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::driver::{Driver, DriverConnection, ResultSet, Statement};
use crate::error::{Error, Result};
use crate::family::DatabaseFamily;

/// Parameters a driver needs to open a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Database name or file path.
    pub database: String,
    /// Server host.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// User name.
    pub user: Option<String>,
    /// Password.
    pub password: Option<String>,
}

impl ConnectOptions {
    /// Options for the given database name or path.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Set the server host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the server port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the credentials.
    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }
}

struct DatabaseInner {
    name: String,
    driver: Arc<dyn Driver>,
    options: ConnectOptions,
    family: AtomicU8,
    session: Mutex<Option<Box<dyn DriverConnection>>>,
    last_error: Mutex<Option<Error>>,
}

/// Handle to a named database connection.
///
/// Handles are cheap to clone and clones share the same physical connection.
/// The default handle is invalid: it refers to no driver and every operation
/// on it fails. A valid handle starts closed until [`Database::open`] succeeds.
#[derive(Clone, Default)]
pub struct Database {
    inner: Option<Arc<DatabaseInner>>,
}

impl Database {
    /// Create a closed handle named `name`.
    pub fn new(name: impl Into<String>, driver: Arc<dyn Driver>, options: ConnectOptions) -> Self {
        Self {
            inner: Some(Arc::new(DatabaseInner {
                name: name.into(),
                driver,
                options,
                family: AtomicU8::new(DatabaseFamily::Unknown as u8),
                session: Mutex::new(None),
                last_error: Mutex::new(None),
            })),
        }
    }

    /// The invalid handle.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Whether this handle refers to a driver.
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Whether a physical connection is open.
    pub fn is_open(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|inner| inner.session.lock().is_some())
    }

    /// Connection name, empty for the invalid handle.
    pub fn connection_name(&self) -> &str {
        self.inner.as_ref().map_or("", |inner| inner.name.as_str())
    }

    /// Driver name, `None` for the invalid handle.
    pub fn driver_name(&self) -> Option<&str> {
        self.inner.as_ref().map(|inner| inner.driver.name())
    }

    /// Connection options this handle opens with.
    pub fn options(&self) -> Option<&ConnectOptions> {
        self.inner.as_ref().map(|inner| &inner.options)
    }

    /// Family recorded on this handle.
    pub fn family(&self) -> DatabaseFamily {
        self.inner
            .as_ref()
            .and_then(|inner| {
                DatabaseFamily::from_code(i32::from(inner.family.load(Ordering::Acquire)))
            })
            .unwrap_or_default()
    }

    /// Record the resolved family on this handle and its clones.
    pub(crate) fn set_family(&self, family: DatabaseFamily) {
        if let Some(inner) = &self.inner {
            inner.family.store(family as u8, Ordering::Release);
        }
    }

    /// Whether both handles share the same physical connection.
    pub fn same_connection(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Open the physical connection. Returns `true` if it is open afterwards.
    ///
    /// On failure the error is kept and available from [`Database::last_error`].
    pub fn open(&self) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };

        let mut session = inner.session.lock();
        if session.is_some() {
            return true;
        }

        match inner.driver.connect(&inner.options) {
            Ok(conn) => {
                *session = Some(conn);
                *inner.last_error.lock() = None;
                true
            }
            Err(e) => {
                *inner.last_error.lock() = Some(e);
                false
            }
        }
    }

    /// Close the physical connection. Clones are closed too.
    pub fn close(&self) {
        if let Some(inner) = &self.inner {
            inner.session.lock().take();
        }
    }

    /// A new closed handle named `name` with this handle's driver, options
    /// and family.
    pub fn clone_as(&self, name: impl Into<String>) -> Self {
        match &self.inner {
            Some(inner) => {
                let copy = Self::new(name, inner.driver.clone(), inner.options.clone());
                copy.set_family(self.family());
                copy
            }
            None => Self::invalid(),
        }
    }

    /// Last connection error recorded on this handle.
    pub fn last_error(&self) -> Option<Error> {
        self.inner
            .as_ref()
            .and_then(|inner| inner.last_error.lock().clone())
    }

    /// Run a statement on the open connection.
    pub fn execute(&self, statement: &Statement) -> Result<ResultSet> {
        let inner = self.inner.as_ref().ok_or(Error::InvalidHandle)?;
        let mut session = inner.session.lock();
        let conn = session.as_mut().ok_or(Error::NotOpen)?;
        conn.execute(statement)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(inner) => f
                .debug_struct("Database")
                .field("name", &inner.name)
                .field("driver", &inner.driver.name())
                .field("database", &inner.options.database)
                .field("family", &self.family())
                .field("open", &self.is_open())
                .finish(),
            None => f.write_str("Database(invalid)"),
        }
    }
}
