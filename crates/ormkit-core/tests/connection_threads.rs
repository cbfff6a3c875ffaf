mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::MockDriver;
use ormkit_core::{
    ConfigureOptions, ConnectionManager, Database, DatabaseFamily, ManagerConfig,
    DEFAULT_NAME_PREFIX,
};

const PRAGMA: &str = "PRAGMA foreign_keys=on";

fn configured(driver: &MockDriver) -> ConnectionManager {
    let manager = ConnectionManager::new();
    manager.configure(driver.database("default"), false, None);
    manager
}

#[test]
fn test_clone_is_reused_within_a_thread_and_released_on_exit() {
    let driver = MockDriver::new("postgres");
    let manager = configured(&driver);

    let worker = manager.clone();
    let name = thread::spawn(move || {
        let first = worker.current_connection();
        let second = worker.current_connection();
        assert!(first.same_connection(&second));
        assert!(first.is_open());
        assert!(worker.contains_connection(first.connection_name()));
        first.connection_name().to_string()
    })
    .join()
    .unwrap();

    assert!(name.starts_with(DEFAULT_NAME_PREFIX));
    assert!(!manager.contains_connection(&name));
    assert!(manager.connection_names().is_empty());
}

#[test]
fn test_concurrent_threads_get_distinct_clones() {
    let driver = MockDriver::new("postgres");
    let manager = configured(&driver);
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let manager = manager.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let db = manager.current_connection();
                barrier.wait();
                assert!(manager.contains_connection(db.connection_name()));
                barrier.wait();
                db.connection_name().to_string()
            })
        })
        .collect();

    let mut names: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    names.sort();
    names.dedup();

    assert_eq!(names.len(), threads);
    assert_eq!(driver.connects(), threads + 1);
    assert!(manager.connection_names().is_empty());
}

#[test]
fn test_owner_uses_reference_and_ownership_moves() {
    let driver = MockDriver::new("postgres");
    let reference = driver.database("default");
    let manager = ConnectionManager::new();
    manager.configure(reference.clone(), false, None);
    assert!(manager.current_connection().same_connection(&reference));

    let other = driver.database("other");
    let configurer = manager.clone();
    let moved = other.clone();
    thread::spawn(move || {
        configurer.configure(moved.clone(), false, None);
        assert!(configurer.current_connection().same_connection(&moved));
    })
    .join()
    .unwrap();

    let current = manager.current_connection();
    assert!(!current.same_connection(&other));
    assert!(current.connection_name().starts_with(DEFAULT_NAME_PREFIX));
    assert!(manager.reference().same_connection(&other));
}

#[test]
fn test_clone_name_prefix_is_configurable() {
    let driver = MockDriver::new("postgres");
    let manager = ConnectionManager::with_config(ManagerConfig::new().with_name_prefix("worker_"));
    manager.configure(driver.database("default"), false, None);

    let worker = manager.clone();
    let name = thread::spawn(move || worker.current_connection().connection_name().to_string())
        .join()
        .unwrap();
    assert!(name.starts_with("worker_"));
}

#[test]
fn test_sqlite_connections_are_initialized() {
    let driver = MockDriver::new("sqlite");
    let manager = configured(&driver);
    assert_eq!(manager.database_family(), DatabaseFamily::Sqlite);
    assert_eq!(driver.count(PRAGMA), 1);

    let worker = manager.clone();
    thread::spawn(move || {
        worker.current_connection();
    })
    .join()
    .unwrap();
    assert_eq!(driver.count(PRAGMA), 2);
}

#[test]
fn test_skip_init_swaps_handle_for_same_driver() {
    let driver = MockDriver::new("sqlite");
    let manager = configured(&driver);
    assert_eq!(driver.count(PRAGMA), 1);

    let replacement = driver.database("replacement");
    manager.configure(replacement.clone(), true, None);

    assert_eq!(driver.count(PRAGMA), 1);
    assert!(manager.reference().same_connection(&replacement));
    assert_eq!(replacement.family(), DatabaseFamily::Sqlite);
}

#[test]
fn test_skip_init_swap_keeps_owner_thread() {
    let driver = MockDriver::new("postgres");
    let manager = configured(&driver);

    let replacement = driver.database("replacement");
    let swapper = manager.clone();
    let swapped = replacement.clone();
    thread::spawn(move || {
        swapper.configure(swapped.clone(), true, None);
        let db = swapper.current_connection();
        assert!(!db.same_connection(&swapped));
        assert!(db.connection_name().starts_with(DEFAULT_NAME_PREFIX));
    })
    .join()
    .unwrap();

    assert!(manager.current_connection().same_connection(&replacement));
}

#[test]
fn test_skip_init_with_new_driver_detects_without_initializing() {
    let sqlite = MockDriver::new("sqlite");
    let manager = configured(&sqlite);

    let postgres = MockDriver::new("postgres");
    manager.configure(postgres.database("pg"), true, None);

    assert_eq!(manager.database_family(), DatabaseFamily::PostgreSql);
    assert!(postgres.statements().is_empty());
}

#[test]
fn test_odbc_family_is_probed() {
    let cases = [
        (
            MockDriver::new("odbc").replying("SELECT sqlite_version()", "3.45.0"),
            DatabaseFamily::Sqlite,
        ),
        (
            MockDriver::new("odbc")
                .failing("SELECT sqlite_version()")
                .replying("SELECT @@version", "Microsoft SQL Server 2019 (RTM)"),
            DatabaseFamily::MsSql,
        ),
        (
            MockDriver::new("odbc")
                .failing("SELECT sqlite_version()")
                .failing("SELECT @@version")
                .replying("SELECT version()", "PostgreSQL 16.2 on x86_64-pc-linux-gnu"),
            DatabaseFamily::PostgreSql,
        ),
        (
            MockDriver::new("odbc")
                .failing("SELECT sqlite_version()")
                .replying("SELECT @@version", "8.0.36")
                .replying("SELECT version()", "8.0.36"),
            DatabaseFamily::MySql,
        ),
        (
            MockDriver::new("odbc")
                .failing("SELECT sqlite_version()")
                .failing("SELECT @@version")
                .failing("SELECT version()"),
            DatabaseFamily::Unknown,
        ),
    ];

    for (driver, expected) in cases {
        let manager = configured(&driver);
        assert_eq!(manager.database_family(), expected, "{:?}", driver.statements());
    }
}

#[test]
fn test_explicit_family_skips_probing() {
    let driver = MockDriver::new("odbc");
    let manager = ConnectionManager::new();
    manager.configure_with(
        driver.database("default"),
        ConfigureOptions::new().with_family_code(DatabaseFamily::PostgreSql.code()),
    );

    assert_eq!(manager.database_family(), DatabaseFamily::PostgreSql);
    assert!(driver.statements().is_empty());
}

#[test]
fn test_unknown_driver_is_still_usable() {
    let driver = MockDriver::new("oracle");
    let reference = driver.database("default");
    let manager = ConnectionManager::new();
    manager.configure(reference.clone(), false, None);

    assert!(manager.is_configured());
    assert_eq!(manager.database_family(), DatabaseFamily::Unknown);
    assert!(manager.current_connection().same_connection(&reference));
}

#[test]
fn test_failed_clone_is_returned_closed() {
    let driver = MockDriver::new("postgres").refusing();
    let reference = Database::new(
        "default",
        Arc::new(driver.clone()),
        ormkit_core::ConnectOptions::new("mock"),
    );
    assert!(!reference.open());

    let manager = ConnectionManager::new();
    manager.configure(reference, false, None);

    let worker = manager.clone();
    thread::spawn(move || {
        let db = worker.current_connection();
        assert!(db.is_valid());
        assert!(!db.is_open());
        assert!(matches!(db.last_error(), Some(ormkit_core::Error::Connect(_))));
    })
    .join()
    .unwrap();
}

#[test]
fn test_explicit_release() {
    let driver = MockDriver::new("postgres");
    let manager = configured(&driver);

    let worker = manager.clone();
    thread::spawn(move || {
        let first = worker.current_connection();
        worker.release_current_thread();
        assert!(!first.is_open());
        assert!(!worker.contains_connection(first.connection_name()));
        worker.release_current_thread();

        let second = worker.current_connection();
        assert!(second.is_open());
        assert_ne!(first.connection_name(), second.connection_name());
    })
    .join()
    .unwrap();
}

#[test]
fn test_close_closes_thread_clones() {
    let driver = MockDriver::new("postgres");
    let manager = ConnectionManager::new();

    let configurer = manager.clone();
    let reference = driver.database("default");
    thread::spawn(move || configurer.configure(reference, false, None))
        .join()
        .unwrap();

    let clone = manager.current_connection();
    assert!(clone.is_open());

    manager.close();
    assert!(!clone.is_open());
    assert!(!manager.is_configured());
    assert!(!manager.current_connection().is_valid());
}

#[test]
fn test_close_while_clone_opens_discards_clone() {
    let driver = MockDriver::new("postgres");
    let manager = configured(&driver);
    let barrier = Arc::new(Barrier::new(2));
    driver.gate_connects(Arc::clone(&barrier));

    let worker = manager.clone();
    let handle = thread::spawn(move || worker.current_connection());

    // The worker is now inside connect.
    barrier.wait();
    manager.close();
    barrier.wait();

    let db = handle.join().unwrap();
    assert!(db.is_valid());
    assert!(!db.is_open());
    assert!(!manager.is_configured());
    assert!(manager.connection_names().is_empty());
}

#[test]
fn test_clone_names_are_not_reused_after_close() {
    let driver = MockDriver::new("postgres");
    let manager = configured(&driver);

    let clone_name = |manager: &ConnectionManager| {
        let worker = manager.clone();
        thread::spawn(move || worker.current_connection().connection_name().to_string())
            .join()
            .unwrap()
    };

    let first = clone_name(&manager);
    manager.close();
    manager.configure(driver.database("default"), false, None);
    let second = clone_name(&manager);

    assert_eq!(first, format!("{DEFAULT_NAME_PREFIX}0"));
    assert_ne!(first, second);
}
