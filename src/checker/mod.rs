//! Cross-references the parsed entity model against the live schema.

mod columns;
mod orphans;
mod relation;
mod stages;
mod visited;

pub use columns::{ColumnMatch, match_column};
pub use visited::*;

use crate::{
    CheckerConfig, Column, Constraint, DriftErr, DriftReporter, EntityCatalog, EntityModel,
    Finding, FindingKind, SchemaIntrospector,
};
use futures_util::{StreamExt, stream};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};
use visited::VisitedRegistry;

/// Drives the per-entity stage pipeline, then the orphan stages.
///
/// Entity checks only read the schema; each returns its findings and the
/// schema objects it accounted for, merged in entity order once it completes.
#[derive(Debug)]
pub struct ConsistencyChecker<I> {
    introspector: I,
    config: CheckerConfig,
}

/// Everything one entity check produced
#[derive(Debug, Default)]
pub struct EntityOutcome {
    pub findings: Vec<Finding>,
    pub visited: VisitedDelta,
}

/// Schema facts shared by every entity check of a run
struct RunContext<'a> {
    config: &'a CheckerConfig,
    catalog: &'a EntityCatalog,
    tables: &'a BTreeSet<String>,
    constraints: &'a [Constraint],
}

impl<I> ConsistencyChecker<I>
where
    I: SchemaIntrospector,
{
    pub fn new(introspector: I, config: CheckerConfig) -> Self {
        Self {
            introspector,
            config,
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn introspector(&self) -> &I {
        &self.introspector
    }

    /// Check every entity of `catalog`, then report unused schema objects.
    ///
    /// Findings go to `reporter` in discovery order. Only a fatal
    /// [`DriftErr`] ends the pass early.
    #[instrument(level = "debug", skip_all, fields(entities = catalog.len()))]
    pub async fn run(
        &self,
        catalog: &EntityCatalog,
        reporter: &mut DriftReporter,
    ) -> Result<FrozenVisited, DriftErr> {
        self.config.validate()?;
        let tables = self.introspector.list_tables().await?;
        let constraints = self.introspector.list_foreign_key_constraints().await?;
        debug!(
            tables = tables.len(),
            constraints = constraints.len(),
            "schema loaded"
        );

        let ctx = RunContext {
            config: &self.config,
            catalog,
            tables: &tables,
            constraints: &constraints,
        };
        let entities = catalog.entities().iter().filter(|entity| {
            let skipped = self.config.is_skipped(&entity.name);
            if skipped {
                info!(entity = %entity.name, "skipped");
            }
            !skipped
        });

        let mut registry = VisitedRegistry::default();
        let mut outcomes = stream::iter(entities)
            .map(|entity| self.check_entity(&ctx, entity))
            .buffered(self.config.concurrency);
        while let Some(outcome) = outcomes.next().await {
            let outcome = outcome?;
            reporter.extend(outcome.findings);
            registry.merge(outcome.visited);
        }

        let visited = registry.freeze();
        reporter.extend(orphans::unused_constraints(
            &constraints,
            &visited,
            &self.config,
        ));
        reporter.extend(orphans::unused_tables(&tables, &visited, &self.config));
        info!(summary = ?reporter.summary(), "done checking");
        Ok(visited)
    }

    async fn check_entity(
        &self,
        ctx: &RunContext<'_>,
        entity: &EntityModel,
    ) -> Result<EntityOutcome, DriftErr> {
        info!(entity = %entity.name, "checking");
        let table = entity.table_name();
        let mut outcome = EntityOutcome::default();

        if !ctx.tables.contains(&table) {
            outcome.findings.push(
                Finding::error(FindingKind::SchemaLookupFailure, "entity doesn't have a table")
                    .entity(&entity.name)
                    .table(&table),
            );
            return Ok(outcome);
        }
        outcome.visited.visit_table(&table);

        let columns = match self.introspector.list_columns(&table).await {
            Ok(columns) => columns,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                outcome.findings.push(
                    Finding::error(
                        FindingKind::SchemaLookupFailure,
                        format!("cannot read columns, remaining checks skipped: {err}"),
                    )
                    .entity(&entity.name)
                    .table(&table),
                );
                return Ok(outcome);
            }
        };

        let mut check = EntityCheck {
            config: ctx.config,
            catalog: ctx.catalog,
            constraints: ctx.constraints,
            entity,
            table: &table,
            columns: &columns,
            outcome,
        };
        check.entity_annotations();
        check.base_columns();
        check.extra_columns();
        check.nameable_columns();
        check.properties();
        Ok(check.outcome)
    }
}

/// The stage pipeline of one entity whose table exists
pub(crate) struct EntityCheck<'a> {
    config: &'a CheckerConfig,
    catalog: &'a EntityCatalog,
    constraints: &'a [Constraint],
    entity: &'a EntityModel,
    table: &'a str,
    columns: &'a [Column],
    outcome: EntityOutcome,
}

impl<'a> EntityCheck<'a> {
    /// Record a finding in the context of this entity and its table
    fn report(&mut self, finding: Finding) {
        let finding = finding.entity(&self.entity.name).table(self.table);
        self.outcome.findings.push(finding);
    }

    fn column(&self, name: &str) -> Option<&'a Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
