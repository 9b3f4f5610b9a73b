//! Injectable configuration of a drift-check pass.

use crate::{Column, DriftErr};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, time::Duration};

/// Symbolic length names and the integer each stands for, e.g.
/// `UUID_LENGTH -> 36`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LengthCatalog(BTreeMap<String, u64>);

impl LengthCatalog {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, length: u64) -> Self {
        self.0.insert(name.into(), length);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<u64> {
        self.0.get(name).copied()
    }
}

impl Default for LengthCatalog {
    fn default() -> Self {
        Self::new()
            .with("UUID_LENGTH", 36)
            .with("TINY_TEXT_LENGTH", 128)
            .with("SMALL_TEXT_LENGTH", 512)
            .with("MID_TEXT_LENGTH", 2048)
            .with("LONG_TEXT_LENGTH", 8192)
            .with("VERY_LONG_TEXT_LENGTH", 16384)
            .with("CANVAS_VALUE_LENGTH", 16_777_215)
            .with("LIFECYCLE_DEFINITION_LENGTH", 65_535)
    }
}

/// Declared property type to the `data_type`s a column of it may have
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTable(BTreeMap<String, Vec<String>>);

impl TypeTable {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with<I, S>(mut self, declared_type: impl Into<String>, data_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.insert(
            declared_type.into(),
            data_types.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// `None` when the declared type is not in the table at all
    pub fn allowed(&self, declared_type: &str) -> Option<&[String]> {
        self.0.get(declared_type).map(Vec::as_slice)
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
            .with("string", ["varchar", "char", "text", "longtext"])
            .with("string[]", ["text"])
            .with("boolean", ["boolean", "bit", "tinyint"])
            .with("number", ["int", "tinyint", "smallint"])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Catalog schema to introspect; the database named in the URL if unset
    pub schema: Option<String>,
    pub length_classes: LengthCatalog,
    pub type_table: TypeTable,
    /// Columns every mapped table must carry
    pub base_columns: Vec<Column>,
    /// Optional columns whose shape is fixed when present
    pub nameable_columns: Vec<Column>,
    /// Cross-cutting reference column tolerated on every table
    pub authorization_column: String,
    /// Referenced table whose constraints are never reported as unused
    pub shared_reference_table: String,
    pub ignore_tables: Vec<String>,
    pub skip_entities: Vec<String>,
    /// Entities checked at once; `1` runs them in order
    pub concurrency: usize,
    pub query_timeout_secs: u64,
    pub connect_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            schema: None,
            length_classes: LengthCatalog::default(),
            type_table: TypeTable::default(),
            base_columns: default_base_columns(),
            nameable_columns: default_nameable_columns(),
            authorization_column: "authorizationId".to_owned(),
            shared_reference_table: "authorization_policy".to_owned(),
            ignore_tables: Vec::new(),
            skip_entities: Vec::new(),
            concurrency: 1,
            query_timeout_secs: 30,
            connect_retries: 3,
            retry_backoff_ms: 200,
        }
    }
}

impl CheckerConfig {
    pub fn from_json(json: &str) -> Result<Self, DriftErr> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DriftErr> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<(), DriftErr> {
        if self.concurrency == 0 {
            return Err(DriftErr::Config("concurrency must be at least 1".to_owned()));
        }
        if self.query_timeout_secs == 0 {
            return Err(DriftErr::Config(
                "query_timeout_secs must be at least 1".to_owned(),
            ));
        }
        if self.schema.as_deref().is_some_and(str::is_empty) {
            return Err(DriftErr::Config("schema name is empty".to_owned()));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.connect_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn is_base_column(&self, name: &str) -> bool {
        self.base_columns.iter().any(|c| c.name == name)
    }

    pub fn is_skipped(&self, entity: &str) -> bool {
        self.skip_entities.iter().any(|e| e == entity)
    }

    pub fn is_ignored_table(&self, table: &str) -> bool {
        self.ignore_tables.iter().any(|t| t == table)
    }
}

/// Bounded exponential backoff for transient transport failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt`, counting from zero
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

fn text_column(name: &str, data_type: &str, length: u64, key: &str) -> Column {
    Column {
        name: name.to_owned(),
        default: None,
        nullable: false,
        data_type: data_type.to_owned(),
        max_length: Some(length),
        charset: Some("utf8mb4".to_owned()),
        collation: Some("utf8mb4_general_ci".to_owned()),
        column_type: format!("varchar({length})"),
        key: key.to_owned(),
        extra: String::new(),
        generated: Some("NEVER".to_owned()),
    }
}

fn timestamp_column(name: &str, extra: &str) -> Column {
    Column {
        name: name.to_owned(),
        default: Some("current_timestamp(6)".to_owned()),
        nullable: false,
        data_type: "datetime".to_owned(),
        max_length: None,
        charset: None,
        collation: None,
        column_type: "datetime(6)".to_owned(),
        key: String::new(),
        extra: extra.to_owned(),
        generated: Some("NEVER".to_owned()),
    }
}

pub fn default_base_columns() -> Vec<Column> {
    vec![
        text_column("id", "char", 36, crate::schema::KEY_PRIMARY),
        timestamp_column("createdDate", ""),
        timestamp_column("updatedDate", "on update current_timestamp(6)"),
        Column {
            name: "version".to_owned(),
            default: None,
            nullable: false,
            data_type: "int".to_owned(),
            max_length: None,
            charset: None,
            collation: None,
            column_type: "int(11)".to_owned(),
            key: String::new(),
            extra: String::new(),
            generated: Some("NEVER".to_owned()),
        },
    ]
}

pub fn default_nameable_columns() -> Vec<Column> {
    vec![
        text_column("nameID", "varchar", 36, ""),
        text_column("displayName", "varchar", 255, ""),
    ]
}
