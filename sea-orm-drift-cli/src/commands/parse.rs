use super::write_output;
use sea_orm_drift::{AnnotationParser, CheckerConfig, DriftReporter, EntityCatalog};
use std::error::Error;
use tracing::info;

/// Parse every annotation of the collection at `input` and write it back
/// with parameters filled in
pub fn run_parse_command(
    input: &str,
    output: Option<&str>,
    config: &CheckerConfig,
) -> Result<(), Box<dyn Error>> {
    let mut catalog = EntityCatalog::load(input)?;
    let mut reporter = DriftReporter::new();
    AnnotationParser::new(config.length_classes.clone()).enrich(&mut catalog, &mut reporter);

    let summary = reporter.summary();
    info!(
        entities = catalog.len(),
        warnings = summary.warning,
        errors = summary.error,
        "Parsed annotations"
    );
    write_output(output, &catalog.to_json()?)
}
