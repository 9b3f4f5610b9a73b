use super::write_output;
use sea_orm_drift::{CheckerConfig, MySqlIntrospector, SchemaSnapshot};
use std::error::Error;
use tracing::info;

pub async fn connect(
    url: &str,
    config: &CheckerConfig,
) -> Result<MySqlIntrospector, Box<dyn Error>> {
    if !MySqlIntrospector::accepts(url) {
        return Err(format!("unsupported database url `{url}`, expected mysql://").into());
    }
    Ok(MySqlIntrospector::connect(url, config).await?)
}

/// Capture the live schema and write it as a snapshot
pub async fn run_snapshot_command(
    database_url: &str,
    output: Option<&str>,
    config: &CheckerConfig,
) -> Result<(), Box<dyn Error>> {
    let introspector = connect(database_url, config).await?;
    let snapshot = SchemaSnapshot::capture(&introspector).await?;
    info!(
        schema = introspector.schema(),
        tables = snapshot.tables.len(),
        constraints = snapshot.constraints.len(),
        "Captured schema"
    );
    write_output(output, &snapshot.to_json()?)
}
