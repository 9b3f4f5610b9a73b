//! The live schema side: catalog rows and the introspector that reads them.

mod mock;
#[cfg(feature = "sqlx-mysql")]
mod mysql;

pub use mock::*;
#[cfg(feature = "sqlx-mysql")]
pub use mysql::*;

use crate::DriftErr;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// `column_key` of a primary key column
pub const KEY_PRIMARY: &str = "PRI";
/// `column_key` of a column carrying a unique index
pub const KEY_UNIQUE: &str = "UNI";

/// One row of `information_schema.columns`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub default: Option<String>,
    pub nullable: bool,
    pub data_type: String,
    pub max_length: Option<u64>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub column_type: String,
    pub key: String,
    pub extra: String,
    pub generated: Option<String>,
}

/// A field that differs between a live column and its expectation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnDiff {
    pub field: String,
    pub value: serde_json::Value,
    pub expected: serde_json::Value,
}

impl Column {
    pub fn is_unique(&self) -> bool {
        self.key == KEY_UNIQUE
    }

    /// Field-by-field differences against `expected`, in declaration order
    pub fn diff(&self, expected: &Column) -> Vec<ColumnDiff> {
        let (Ok(serde_json::Value::Object(actual)), Ok(serde_json::Value::Object(expected))) =
            (serde_json::to_value(self), serde_json::to_value(expected))
        else {
            return Vec::new();
        };
        actual
            .into_iter()
            .filter_map(|(field, value)| {
                let expected = expected.get(&field).cloned().unwrap_or_default();
                (value != expected).then_some(ColumnDiff {
                    field,
                    value,
                    expected,
                })
            })
            .collect()
    }
}

/// An enforced foreign-key constraint, one row per referencing column
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    pub name: String,
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub update_rule: String,
    pub delete_rule: String,
}

/// Read-only access to one schema of a relational catalog
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Every table of the target schema
    async fn list_tables(&self) -> Result<BTreeSet<String>, DriftErr>;

    /// The columns of `table`, by ordinal position
    async fn list_columns(&self, table: &str) -> Result<Vec<Column>, DriftErr>;

    /// Foreign keys of the target schema with a referenced column
    async fn list_foreign_key_constraints(&self) -> Result<Vec<Constraint>, DriftErr>;
}

#[async_trait]
impl<T> SchemaIntrospector for &T
where
    T: SchemaIntrospector + ?Sized,
{
    async fn list_tables(&self) -> Result<BTreeSet<String>, DriftErr> {
        (**self).list_tables().await
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<Column>, DriftErr> {
        (**self).list_columns(table).await
    }

    async fn list_foreign_key_constraints(&self) -> Result<Vec<Constraint>, DriftErr> {
        (**self).list_foreign_key_constraints().await
    }
}

/// A point-in-time copy of everything the checker reads from the catalog
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tables: BTreeMap<String, Vec<Column>>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl SchemaSnapshot {
    /// Read the whole schema through `introspector`
    pub async fn capture<I>(introspector: &I) -> Result<Self, DriftErr>
    where
        I: SchemaIntrospector + ?Sized,
    {
        let mut tables = BTreeMap::new();
        for table in introspector.list_tables().await? {
            let columns = introspector.list_columns(&table).await?;
            tables.insert(table, columns);
        }
        let constraints = introspector.list_foreign_key_constraints().await?;
        Ok(Self {
            tables,
            constraints,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, DriftErr> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DriftErr> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
