//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use ormkit_core::{
    ConnectOptions, Database, Driver, DriverConnection, Error, FieldDef, ForeignKey, ResultSet,
    Statement, TableDef, Value,
};
use parking_lot::Mutex;

enum Reply {
    Rows(Vec<Vec<Value>>),
    Fail,
}

struct Rule {
    prefix: String,
    reply: Reply,
}

/// Driver that records every statement and answers from scripted rules.
///
/// Statements matching no rule succeed with no rows.
#[derive(Clone)]
pub struct MockDriver {
    name: String,
    rules: Arc<Mutex<Vec<Rule>>>,
    log: Arc<Mutex<Vec<String>>>,
    connects: Arc<AtomicUsize>,
    gate: Arc<Mutex<Option<Arc<Barrier>>>>,
    refuse: bool,
}

impl MockDriver {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Arc::default(),
            log: Arc::default(),
            connects: Arc::default(),
            gate: Arc::default(),
            refuse: false,
        }
    }

    /// Answer statements starting with `prefix` with a single text value.
    pub fn replying(self, prefix: &str, text: &str) -> Self {
        self.rules.lock().push(Rule {
            prefix: prefix.to_string(),
            reply: Reply::Rows(vec![vec![Value::Text(text.to_string())]]),
        });
        self
    }

    /// Fail statements starting with `prefix`.
    pub fn failing(self, prefix: &str) -> Self {
        self.rules.lock().push(Rule {
            prefix: prefix.to_string(),
            reply: Reply::Fail,
        });
        self
    }

    /// Refuse every connection attempt.
    pub fn refusing(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// Hold later connection attempts inside `connect`: each waits on
    /// `barrier` once on entry and once more before returning.
    pub fn gate_connects(&self, barrier: Arc<Barrier>) {
        *self.gate.lock() = Some(barrier);
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn count(&self, sql: &str) -> usize {
        self.log.lock().iter().filter(|s| s.as_str() == sql).count()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// An opened handle on this driver.
    pub fn database(&self, name: &str) -> Database {
        let db = Database::new(name, Arc::new(self.clone()), ConnectOptions::new("mock"));
        db.open();
        db
    }
}

impl Driver for MockDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&self, _options: &ConnectOptions) -> ormkit_core::Result<Box<dyn DriverConnection>> {
        if self.refuse {
            return Err(Error::Connect("connection refused".to_string()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(barrier) = gate {
            barrier.wait();
            barrier.wait();
        }
        Ok(Box::new(MockConnection {
            driver: self.clone(),
        }))
    }
}

struct MockConnection {
    driver: MockDriver,
}

impl DriverConnection for MockConnection {
    fn execute(&mut self, statement: &Statement) -> ormkit_core::Result<ResultSet> {
        self.driver.log.lock().push(statement.sql.clone());
        let rules = self.driver.rules.lock();
        match rules.iter().find(|r| statement.sql.starts_with(&r.prefix)) {
            Some(Rule {
                reply: Reply::Fail, ..
            }) => Err(Error::statement(format!("no such statement: {}", statement.sql))),
            Some(Rule {
                reply: Reply::Rows(rows),
                ..
            }) => Ok(ResultSet::with_rows(rows.clone())),
            None => Ok(ResultSet::affected(0)),
        }
    }
}

/// A model with an `id` key and one foreign key per referenced model.
pub fn table(name: &str, refs: &[&str]) -> TableDef {
    let mut def = TableDef::new(name).with_field(FieldDef::auto_increment("id"));
    for r in refs {
        def = def.with_field(FieldDef::foreign_key(
            format!("{}_id", r.to_lowercase()),
            ForeignKey::new(*r),
        ));
    }
    def
}

/// Table names in the order `CREATE TABLE` or `DROP TABLE` statements ran.
pub fn tables_in(statements: &[String], verb: &str) -> Vec<String> {
    statements
        .iter()
        .filter_map(|s| s.strip_prefix(verb))
        .map(|rest| {
            rest.trim_start()
                .split(|c: char| c.is_whitespace() || c == '(')
                .next()
                .unwrap_or_default()
                .trim_matches(|c: char| matches!(c, '"' | '`' | '[' | ']'))
                .to_string()
        })
        .collect()
}
