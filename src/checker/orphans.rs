use super::FrozenVisited;
use crate::{CheckerConfig, Constraint, Finding, FindingKind};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Constraints no entity check matched, once per constraint name
pub(super) fn unused_constraints(
    constraints: &[Constraint],
    visited: &FrozenVisited,
    config: &CheckerConfig,
) -> Vec<Finding> {
    constraints
        .iter()
        .filter(|c| c.referenced_table != config.shared_reference_table)
        .filter(|c| !visited.has_constraint(&c.name))
        .unique_by(|c| c.name.as_str())
        .map(|c| {
            Finding::error(
                FindingKind::OrphanSchemaObject,
                format!("{} not used by any entity", c.name),
            )
            .table(&c.table)
            .column(&c.column)
            .detail(c)
        })
        .collect()
}

/// Tables no entity maps to
pub(super) fn unused_tables(
    tables: &BTreeSet<String>,
    visited: &FrozenVisited,
    config: &CheckerConfig,
) -> Vec<Finding> {
    tables
        .iter()
        .filter(|t| !visited.has_table(t) && !config.is_ignored_table(t))
        .map(|t| {
            Finding::error(
                FindingKind::OrphanSchemaObject,
                format!("{t} not used by any entity"),
            )
            .table(t)
        })
        .collect()
}
