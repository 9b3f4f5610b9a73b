use std::time::Duration;
use thiserror::Error;

/// An error that stops part or all of a drift-check pass.
///
/// Drift itself is never an error: mismatches between the entity model and
/// the schema are reported as [`Finding`](crate::Finding)s. `DriftErr` only
/// covers the cases where the checker could not gather the facts it needs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriftErr {
    /// The connection to the database was lost or could not be established
    #[error("Connection Error: {0}")]
    Conn(String),
    /// A single introspection query failed
    #[error("Query Error: {0}")]
    Query(String),
    /// A single introspection query did not finish in time
    #[error("Query `{query}` timed out after {elapsed:?}")]
    Timeout {
        /// The query that timed out
        query: &'static str,
        /// The time budget that was exceeded
        elapsed: Duration,
    },
    /// Reading or writing a file failed
    #[error("IO Error: {0}")]
    Io(String),
    /// A persisted document could not be (de)serialized
    #[error("Json Error: {0}")]
    Json(String),
    /// The configuration is not usable
    #[error("Config Error: {0}")]
    Config(String),
}

impl DriftErr {
    /// Whether the whole pass has to stop.
    ///
    /// Only a lost transport is fatal; every other failure is scoped to the
    /// entity whose check issued the query.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Conn(_))
    }
}

impl From<std::io::Error> for DriftErr {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DriftErr {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

#[cfg(feature = "sqlx-mysql")]
impl From<sqlx::Error> for DriftErr {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Conn(err.to_string()),
            _ => Self::Query(err.to_string()),
        }
    }
}
