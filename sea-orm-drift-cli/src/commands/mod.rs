use std::{error::Error, fmt::Display, fs, io::Write};
use tracing_subscriber::{EnvFilter, prelude::*};

pub mod check;
pub mod parse;
#[cfg(feature = "sqlx-mysql")]
pub mod snapshot;

pub use check::*;
pub use parse::*;
#[cfg(feature = "sqlx-mysql")]
pub use snapshot::*;

pub fn init_tracing(verbose: bool) {
    if verbose {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    } else {
        let filter_layer = EnvFilter::new("sea_orm_drift=info");
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(false)
            .without_time();

        let _ = tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .try_init();
    }
}

/// Write `content` to `path`, or to stdout if there is none
pub fn write_output(path: Option<&str>, content: &str) -> Result<(), Box<dyn Error>> {
    match path {
        Some(path) => fs::write(path, content)?,
        None => std::io::stdout().lock().write_all(content.as_bytes())?,
    }
    Ok(())
}

pub fn handle_error<E>(error: E)
where
    E: Display,
{
    eprintln!("{error}");
    ::std::process::exit(1);
}
