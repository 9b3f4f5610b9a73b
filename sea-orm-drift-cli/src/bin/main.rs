use clap::Parser;
use dotenvy::dotenv;
use sea_orm_drift_cli::{
    Cli, Commands, SchemaSource, handle_error, init_tracing, load_checker_config,
    run_check_command, run_parse_command,
};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Parse { input, output } => load_checker_config(config, None)
            .and_then(|checker_config| {
                run_parse_command(&input, output.as_deref(), &checker_config)
            })
            .unwrap_or_else(handle_error),
        Commands::Check {
            entities,
            database_url,
            database_schema,
            snapshot,
            ndjson,
        } => {
            let result = async {
                let checker_config = load_checker_config(config, database_schema)?;
                let source = SchemaSource::pick(database_url, snapshot)?;
                run_check_command(&entities, source, ndjson.as_deref(), checker_config).await
            };
            if let Err(error) = result.await {
                handle_error(error);
            }
        }
        #[cfg(feature = "sqlx-mysql")]
        Commands::Snapshot {
            database_url,
            database_schema,
            output,
        } => {
            let result = async {
                let checker_config = load_checker_config(config, database_schema)?;
                sea_orm_drift_cli::run_snapshot_command(
                    &database_url,
                    output.as_deref(),
                    &checker_config,
                )
                .await
            };
            result.await.unwrap_or_else(handle_error);
        }
        #[cfg(not(feature = "sqlx-mysql"))]
        Commands::Snapshot { .. } => handle_error("built without a database driver"),
    }
}
