use serde::Serialize;
use std::collections::BTreeSet;

/// Schema objects one entity check accounted for
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisitedDelta {
    tables: BTreeSet<String>,
    constraints: BTreeSet<String>,
}

impl VisitedDelta {
    pub fn visit_table(&mut self, table: &str) {
        self.tables.insert(table.to_owned());
    }

    pub fn visit_constraint(&mut self, constraint: &str) {
        self.constraints.insert(constraint.to_owned());
    }
}

/// Run-wide union of the deltas, written only by the collector
#[derive(Debug, Default)]
pub(crate) struct VisitedRegistry {
    tables: BTreeSet<String>,
    constraints: BTreeSet<String>,
}

impl VisitedRegistry {
    pub fn merge(&mut self, delta: VisitedDelta) {
        self.tables.extend(delta.tables);
        self.constraints.extend(delta.constraints);
    }

    /// Close the registry once every entity check has completed
    pub fn freeze(self) -> FrozenVisited {
        FrozenVisited {
            tables: self.tables,
            constraints: self.constraints,
        }
    }
}

/// The read-only registry the orphan stages consult
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FrozenVisited {
    tables: BTreeSet<String>,
    constraints: BTreeSet<String>,
}

impl FrozenVisited {
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains(table)
    }

    pub fn has_constraint(&self, constraint: &str) -> bool {
        self.constraints.contains(constraint)
    }

    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(String::as_str)
    }

    pub fn constraints(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().map(String::as_str)
    }
}
