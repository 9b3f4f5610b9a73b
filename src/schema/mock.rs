use super::{Column, Constraint, SchemaIntrospector, SchemaSnapshot};
use crate::DriftErr;
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Mutex,
};

/// Serves a [`SchemaSnapshot`] from memory, recording every query it answers.
///
/// Stands in for a live database in tests and when checking against a
/// saved snapshot.
#[derive(Debug, Default)]
pub struct MockIntrospector {
    snapshot: SchemaSnapshot,
    failures: BTreeMap<String, DriftErr>,
    query_log: Mutex<Vec<String>>,
}

impl MockIntrospector {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_snapshot(snapshot: SchemaSnapshot) -> Self {
        Self {
            snapshot,
            ..Default::default()
        }
    }

    pub fn append_table(mut self, table: impl Into<String>, columns: Vec<Column>) -> Self {
        self.snapshot.tables.insert(table.into(), columns);
        self
    }

    pub fn append_constraints(mut self, mut constraints: Vec<Constraint>) -> Self {
        self.snapshot.constraints.append(&mut constraints);
        self
    }

    /// Make `list_columns(table)` fail with `err`
    pub fn fail_columns_of(mut self, table: impl Into<String>, err: DriftErr) -> Self {
        self.failures.insert(table.into(), err);
        self
    }

    pub fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }

    /// Queries answered so far, in order
    pub fn drain_query_log(&self) -> Vec<String> {
        match self.query_log.lock() {
            Ok(mut log) => std::mem::take(&mut *log),
            Err(_) => Vec::new(),
        }
    }

    fn log(&self, query: String) -> Result<(), DriftErr> {
        self.query_log
            .lock()
            .map_err(|err| DriftErr::Query(err.to_string()))?
            .push(query);
        Ok(())
    }
}

#[async_trait]
impl SchemaIntrospector for MockIntrospector {
    async fn list_tables(&self) -> Result<BTreeSet<String>, DriftErr> {
        self.log("list_tables".to_owned())?;
        Ok(self.snapshot.tables.keys().cloned().collect())
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<Column>, DriftErr> {
        self.log(format!("list_columns {table}"))?;
        if let Some(err) = self.failures.get(table) {
            return Err(err.clone());
        }
        Ok(self.snapshot.tables.get(table).cloned().unwrap_or_default())
    }

    async fn list_foreign_key_constraints(&self) -> Result<Vec<Constraint>, DriftErr> {
        self.log("list_foreign_key_constraints".to_owned())?;
        Ok(self.snapshot.constraints.clone())
    }
}
