//! Per-thread connection management.
//!
//! The application configures one reference connection. The thread that
//! configured it uses that connection directly; every other thread gets its
//! own clone, opened on first use and released when the thread exits.
//!
//! Thread exit is observed through a thread-local guard whose destructor
//! releases the thread's clones. Threads whose thread-local destructors do
//! not run (for example threads torn down by a foreign runtime) must call
//! [`ConnectionManager::release_current_thread`] before they exit.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::database::Database;
use crate::family::{DatabaseFamily, DriverNameDetector, FamilyDetector};
use crate::query::Query;

/// Default prefix of generated clone names.
pub const DEFAULT_NAME_PREFIX: &str = "_ormkit_";

/// Options for [`ConnectionManager::configure_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureOptions {
    /// Only swap the handle when the driver matches the current reference.
    pub skip_init: bool,
    /// Family to use instead of probing the handle.
    pub family: Option<DatabaseFamily>,
}

impl ConfigureOptions {
    /// Default options: probe the family and initialize the connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip initialization when the driver is unchanged.
    pub fn with_skip_init(mut self, skip_init: bool) -> Self {
        self.skip_init = skip_init;
        self
    }

    /// Use an explicit family.
    pub fn with_family(mut self, family: DatabaseFamily) -> Self {
        self.family = Some(family);
        self
    }

    /// Use an explicit family by numeric code. Codes that are not positive,
    /// or that name no family, fall back to probing.
    pub fn with_family_code(mut self, code: i32) -> Self {
        self.family = if code > 0 {
            DatabaseFamily::from_code(code)
        } else {
            None
        };
        self
    }

    /// The explicit family, if it is a known one.
    fn explicit_family(&self) -> Option<DatabaseFamily> {
        self.family.filter(|f| *f != DatabaseFamily::Unknown)
    }
}

/// Configuration of a [`ConnectionManager`].
#[derive(Clone)]
pub struct ManagerConfig {
    /// Prefix of generated clone names.
    pub name_prefix: String,
    /// Family detector used when no family is given explicitly.
    pub detector: Arc<dyn FamilyDetector>,
}

impl ManagerConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self {
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            detector: Arc::new(DriverNameDetector),
        }
    }

    /// Set the clone name prefix.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    /// Set the family detector.
    pub fn with_detector(mut self, detector: impl FamilyDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("name_prefix", &self.name_prefix)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct ManagerState {
    reference: Database,
    owner: Option<ThreadId>,
    family: DatabaseFamily,
    copies: HashMap<ThreadId, Database>,
    /// Never reset, so clone names stay unique for the manager's lifetime.
    next_id: u64,
    /// Bumped whenever the reference changes or the manager is closed.
    generation: u64,
}

struct Shared {
    config: ManagerConfig,
    state: Mutex<ManagerState>,
}

impl Shared {
    fn release(&self, thread: ThreadId) {
        let removed = self.state.lock().copies.remove(&thread);
        if let Some(db) = removed {
            if db.connection_name().starts_with(&self.config.name_prefix) {
                debug!(connection = db.connection_name(), "releasing thread connection");
                db.close();
            }
        }
    }
}

thread_local! {
    static EXIT_HOOKS: ExitHooks = ExitHooks::default();
}

/// Managers holding a clone for the current thread.
#[derive(Default)]
struct ExitHooks {
    managers: RefCell<Vec<(Weak<Shared>, ThreadId)>>,
}

impl ExitHooks {
    fn register(&self, shared: &Arc<Shared>, thread: ThreadId) {
        let weak = Arc::downgrade(shared);
        let mut managers = self.managers.borrow_mut();
        managers.retain(|(w, _)| w.strong_count() > 0);
        if !managers.iter().any(|(w, _)| Weak::ptr_eq(w, &weak)) {
            managers.push((weak, thread));
        }
    }
}

impl Drop for ExitHooks {
    fn drop(&mut self) {
        for (weak, thread) in self.managers.get_mut().drain(..) {
            if let Some(shared) = weak.upgrade() {
                shared.release(thread);
            }
        }
    }
}

/// Hands out one connection per thread derived from a reference connection.
///
/// Cloning the manager yields another handle to the same state.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    /// Create an unconfigured manager with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Create an unconfigured manager.
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(ManagerState::default()),
            }),
        }
    }

    /// Set the reference connection.
    ///
    /// With `skip_init` and a reference of the same driver already in place,
    /// only the handle is swapped and the owner thread is kept. Otherwise the
    /// family is taken from `family` (when known) or detected, the connection
    /// is initialized unless `skip_init` is set, and the calling thread
    /// becomes the owner of the reference connection.
    pub fn configure(&self, db: Database, skip_init: bool, family: Option<DatabaseFamily>) {
        self.configure_with(
            db,
            ConfigureOptions {
                skip_init,
                family,
            },
        );
    }

    /// Set the reference connection using [`ConfigureOptions`].
    pub fn configure_with(&self, db: Database, options: ConfigureOptions) {
        let thread = thread::current().id();

        if options.skip_init {
            let mut state = self.shared.state.lock();
            if state.reference.is_valid() && state.reference.driver_name() == db.driver_name() {
                db.set_family(state.family);
                state.reference = db;
                state.generation += 1;
                return;
            }
        }

        let family = options
            .explicit_family()
            .unwrap_or_else(|| self.shared.config.detector.detect(&db));

        if db.is_valid() && family == DatabaseFamily::Unknown {
            warn!(
                driver = db.driver_name().unwrap_or_default(),
                "unsupported database driver"
            );
        }

        db.set_family(family);
        if !options.skip_init {
            initialize(&db, family);
        }

        let mut state = self.shared.state.lock();
        state.reference = db;
        state.family = family;
        state.generation += 1;
        Self::take_ownership(&mut state, thread);
    }

    fn take_ownership(state: &mut ManagerState, thread: ThreadId) {
        state.owner = Some(thread);
        // The owner uses the reference connection directly.
        state.copies.remove(&thread);
    }

    /// Connection for the calling thread.
    ///
    /// Returns the invalid handle when nothing is configured, the reference
    /// connection on the owner thread, and otherwise this thread's clone,
    /// creating it on first use. A clone that fails to open is returned as is;
    /// check [`Database::is_open`] before use.
    ///
    /// If the manager is closed or reconfigured while the clone is being
    /// opened, the clone is closed and returned without being kept.
    pub fn current_connection(&self) -> Database {
        let thread = thread::current().id();

        let (reference, id, generation) = {
            let mut state = self.shared.state.lock();
            if !state.reference.is_valid() {
                return Database::invalid();
            }
            if state.owner == Some(thread) {
                return state.reference.clone();
            }
            if let Some(db) = state.copies.get(&thread) {
                return db.clone();
            }
            let id = state.next_id;
            state.next_id += 1;
            (state.reference.clone(), id, state.generation)
        };

        let name = format!("{}{}", self.shared.config.name_prefix, id);
        let db = reference.clone_as(name);
        if db.open() {
            initialize(&db, db.family());
            debug!(connection = db.connection_name(), "opened thread connection");
        } else {
            debug!(
                connection = db.connection_name(),
                error = ?db.last_error(),
                "failed to open thread connection"
            );
        }

        {
            let mut state = self.shared.state.lock();
            if state.generation != generation {
                drop(state);
                debug!(
                    connection = db.connection_name(),
                    "reference changed while opening, discarding thread connection"
                );
                db.close();
                return db;
            }
            state.copies.insert(thread, db.clone());
        }

        let registered = EXIT_HOOKS
            .try_with(|hooks| hooks.register(&self.shared, thread))
            .is_ok();
        if !registered {
            warn!(
                connection = db.connection_name(),
                "thread is exiting, connection must be released explicitly"
            );
        }
        db
    }

    /// Release the calling thread's clone. Does nothing if it has none.
    pub fn release_current_thread(&self) {
        self.shared.release(thread::current().id());
    }

    /// Family of the reference connection.
    pub fn database_family(&self) -> DatabaseFamily {
        self.shared.state.lock().family
    }

    /// Whether a valid reference connection is configured.
    pub fn is_configured(&self) -> bool {
        self.shared.state.lock().reference.is_valid()
    }

    /// The reference connection.
    pub fn reference(&self) -> Database {
        self.shared.state.lock().reference.clone()
    }

    /// Names of the live thread clones, sorted.
    pub fn connection_names(&self) -> Vec<String> {
        let state = self.shared.state.lock();
        let mut names: Vec<String> = state
            .copies
            .values()
            .map(|db| db.connection_name().to_string())
            .collect();
        names.sort();
        names
    }

    /// Whether a live thread clone is named `name`.
    pub fn contains_connection(&self, name: &str) -> bool {
        self.shared
            .state
            .lock()
            .copies
            .values()
            .any(|db| db.connection_name() == name)
    }

    /// Drop the reference connection and close every thread clone.
    ///
    /// The clone counter keeps running, so clones created after a
    /// reconfiguration never reuse a name.
    pub fn close(&self) {
        let copies = {
            let mut state = self.shared.state.lock();
            state.reference = Database::invalid();
            state.owner = None;
            state.family = DatabaseFamily::Unknown;
            state.generation += 1;
            std::mem::take(&mut state.copies)
        };
        for db in copies.into_values() {
            db.close();
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ConnectionManager")
            .field("reference", &state.reference)
            .field("family", &state.family)
            .field("copies", &state.copies.len())
            .finish()
    }
}

/// Run family-specific setup on a freshly opened connection.
fn initialize(db: &Database, family: DatabaseFamily) {
    if family == DatabaseFamily::Sqlite {
        let mut query = Query::new(db.clone());
        query.prepare("PRAGMA foreign_keys=on");
        query.exec();
    }
}
