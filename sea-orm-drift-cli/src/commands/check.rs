use sea_orm_drift::{
    AnnotationParser, CheckerConfig, ConsistencyChecker, DriftReporter, EntityCatalog,
    MockIntrospector, SchemaIntrospector, SchemaSnapshot,
};
use std::{error::Error, fs::File, io::BufWriter};
use tracing::info;

/// Where the live side of a check comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    Database(String),
    Snapshot(String),
}

impl SchemaSource {
    /// A snapshot wins over a database URL
    pub fn pick(
        database_url: Option<String>,
        snapshot: Option<String>,
    ) -> Result<Self, Box<dyn Error>> {
        match (snapshot, database_url) {
            (Some(snapshot), _) => Ok(Self::Snapshot(snapshot)),
            (None, Some(url)) => Ok(Self::Database(url)),
            (None, None) => Err("either a database url or a snapshot is required".into()),
        }
    }
}

pub async fn run_check_command(
    entities: &str,
    source: SchemaSource,
    ndjson: Option<&str>,
    config: CheckerConfig,
) -> Result<DriftReporter, Box<dyn Error>> {
    let mut catalog = EntityCatalog::load(entities)?;
    let mut reporter = DriftReporter::new();
    AnnotationParser::new(config.length_classes.clone()).enrich(&mut catalog, &mut reporter);

    match source {
        SchemaSource::Snapshot(path) => {
            let snapshot = SchemaSnapshot::from_json(&std::fs::read_to_string(path)?)?;
            let introspector = MockIntrospector::from_snapshot(snapshot);
            check(introspector, config, &catalog, &mut reporter).await?;
        }
        #[cfg(feature = "sqlx-mysql")]
        SchemaSource::Database(url) => {
            let introspector = super::connect(&url, &config).await?;
            check(introspector, config, &catalog, &mut reporter).await?;
        }
        #[cfg(not(feature = "sqlx-mysql"))]
        SchemaSource::Database(_) => {
            return Err("built without a database driver, check against a snapshot".into());
        }
    }

    if let Some(path) = ndjson {
        reporter.write_ndjson(BufWriter::new(File::create(path)?))?;
    }
    let summary = reporter.summary();
    info!(
        info = summary.info,
        warnings = summary.warning,
        errors = summary.error,
        mistakes = summary.mistake,
        "Drift check finished"
    );
    Ok(reporter)
}

async fn check<I>(
    introspector: I,
    config: CheckerConfig,
    catalog: &EntityCatalog,
    reporter: &mut DriftReporter,
) -> Result<(), Box<dyn Error>>
where
    I: SchemaIntrospector,
{
    let checker = ConsistencyChecker::new(introspector, config);
    let visited = checker.run(catalog, reporter).await?;
    info!(
        tables = visited.tables().count(),
        constraints = visited.constraints().count(),
        "Accounted for"
    );
    Ok(())
}
