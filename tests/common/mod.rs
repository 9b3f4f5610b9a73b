#![allow(dead_code)]

use sea_orm_drift::{
    CheckerConfig, Column, ConsistencyChecker, DriftErr, DriftReporter, EntityCatalog, Finding,
    FindingKind, FrozenVisited, MockIntrospector, Severity,
};

/// Install a test subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Run a full pass and hand back everything it reported
pub async fn check(
    catalog: &EntityCatalog,
    introspector: MockIntrospector,
    config: CheckerConfig,
) -> (DriftReporter, Result<FrozenVisited, DriftErr>) {
    init_tracing();
    let checker = ConsistencyChecker::new(introspector, config);
    let mut reporter = DriftReporter::new();
    let result = checker.run(catalog, &mut reporter).await;
    (reporter, result)
}

pub fn without(columns: Vec<Column>, name: &str) -> Vec<Column> {
    columns.into_iter().filter(|c| c.name != name).collect()
}

pub fn replace(columns: Vec<Column>, column: Column) -> Vec<Column> {
    columns
        .into_iter()
        .map(|c| if c.name == column.name { column.clone() } else { c })
        .collect()
}

pub fn of_kind(reporter: &DriftReporter, kind: FindingKind) -> Vec<&Finding> {
    reporter.of_kind(kind).collect()
}

pub fn by_severity(reporter: &DriftReporter, severity: Severity) -> Vec<&Finding> {
    reporter
        .findings()
        .iter()
        .filter(|f| f.severity == severity)
        .collect()
}

/// Show what was found when an assertion on the findings fails
pub fn dump(reporter: &DriftReporter) -> String {
    reporter
        .findings()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
