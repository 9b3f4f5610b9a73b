use super::{Column, Constraint, SchemaIntrospector};
use crate::{CheckerConfig, DriftErr, RetryPolicy};
use async_trait::async_trait;
use sea_query::{
    Alias, Cond, Expr, Func, Iden, JoinType, MysqlQueryBuilder, Order, Query, SelectStatement,
};
use sea_query_binder::SqlxBinder;
use sqlx::{
    MySqlPool, Row,
    mysql::{MySqlPoolOptions, MySqlRow},
};
use std::{collections::BTreeSet, future::Future, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

#[derive(Iden)]
#[iden = "information_schema"]
struct InformationSchema;

#[derive(Iden)]
enum Tables {
    Table,
    TableSchema,
    TableName,
}

#[derive(Iden)]
enum Columns {
    Table,
    TableSchema,
    TableName,
    ColumnName,
    ColumnDefault,
    IsNullable,
    DataType,
    CharacterMaximumLength,
    CharacterSetName,
    CollationName,
    ColumnType,
    ColumnKey,
    Extra,
    IsGenerated,
    OrdinalPosition,
}

#[derive(Iden)]
enum KeyColumnUsage {
    Table,
    ConstraintSchema,
    ConstraintName,
    TableName,
    ColumnName,
    ReferencedTableSchema,
    ReferencedTableName,
    ReferencedColumnName,
}

#[derive(Iden)]
enum ReferentialConstraints {
    Table,
    ConstraintSchema,
    ConstraintName,
    UpdateRule,
    DeleteRule,
}

/// Reads one schema of a MySQL or MariaDB catalog through `information_schema`
#[derive(Debug, Clone)]
pub struct MySqlIntrospector {
    pool: MySqlPool,
    schema: String,
    query_timeout: Duration,
    retry: RetryPolicy,
}

impl MySqlIntrospector {
    pub fn accepts(url: &str) -> bool {
        url.starts_with("mysql://")
    }

    /// Connect, retrying transport failures with backoff.
    ///
    /// The schema is `config.schema`, else the database named in the URL.
    pub async fn connect(url: &str, config: &CheckerConfig) -> Result<Self, DriftErr> {
        let schema = match &config.schema {
            Some(schema) => schema.clone(),
            None => database_name(url)?,
        };
        let retry = config.retry_policy();
        let query_timeout = config.query_timeout();
        let max_connections = u32::try_from(config.concurrency).unwrap_or(u32::MAX);

        let pool = with_retry(retry, "connect", || async move {
            MySqlPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(query_timeout)
                .connect(url)
                .await
                .map_err(DriftErr::from)
        })
        .await
        .map_err(|err| match err {
            DriftErr::Query(msg) => DriftErr::Conn(msg),
            err => err,
        })?;
        info!(schema, "connected");

        Ok(Self {
            pool,
            schema,
            query_timeout,
            retry,
        })
    }

    pub fn from_sqlx_mysql_pool(pool: MySqlPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
            query_timeout: Duration::from_secs(30),
            retry: RetryPolicy {
                retries: 0,
                backoff: Duration::ZERO,
            },
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn get_mysql_connection_pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn fetch_all(
        &self,
        query: &'static str,
        stmt: &SelectStatement,
    ) -> Result<Vec<MySqlRow>, DriftErr> {
        let (pool, timeout) = (&self.pool, self.query_timeout);
        with_retry(self.retry, query, || {
            let (sql, values) = stmt.build_sqlx(MysqlQueryBuilder);
            debug!(query, "{sql}");
            async move {
                let rows = sqlx::query_with(&sql, values).fetch_all(pool);
                match tokio::time::timeout(timeout, rows).await {
                    Ok(rows) => rows.map_err(DriftErr::from),
                    Err(_) => Err(DriftErr::Timeout {
                        query,
                        elapsed: timeout,
                    }),
                }
            }
        })
        .await
    }
}

#[async_trait]
impl SchemaIntrospector for MySqlIntrospector {
    async fn list_tables(&self) -> Result<BTreeSet<String>, DriftErr> {
        let stmt = Query::select()
            .expr_as(Expr::col(Tables::TableName), Tables::TableName)
            .from((InformationSchema, Tables::Table))
            .and_where(Expr::col(Tables::TableSchema).eq(self.schema.as_str()))
            .to_owned();

        self.fetch_all("list_tables", &stmt)
            .await?
            .iter()
            .map(|row| row.try_get("table_name").map_err(DriftErr::from))
            .collect()
    }

    async fn list_columns(&self, table: &str) -> Result<Vec<Column>, DriftErr> {
        let stmt = Query::select()
            .expr_as(Expr::col(Columns::ColumnName), Columns::ColumnName)
            .expr_as(Expr::col(Columns::ColumnDefault), Columns::ColumnDefault)
            .expr_as(Expr::col(Columns::IsNullable), Columns::IsNullable)
            .expr_as(Expr::col(Columns::DataType), Columns::DataType)
            .expr_as(
                Func::cast_as(
                    Expr::col(Columns::CharacterMaximumLength),
                    Alias::new("SIGNED"),
                ),
                Columns::CharacterMaximumLength,
            )
            .expr_as(Expr::col(Columns::CharacterSetName), Columns::CharacterSetName)
            .expr_as(Expr::col(Columns::CollationName), Columns::CollationName)
            .expr_as(Expr::col(Columns::ColumnType), Columns::ColumnType)
            .expr_as(Expr::col(Columns::ColumnKey), Columns::ColumnKey)
            .expr_as(Expr::col(Columns::Extra), Columns::Extra)
            .expr_as(Expr::col(Columns::IsGenerated), Columns::IsGenerated)
            .from((InformationSchema, Columns::Table))
            .and_where(Expr::col(Columns::TableSchema).eq(self.schema.as_str()))
            .and_where(Expr::col(Columns::TableName).eq(table))
            .order_by(Columns::OrdinalPosition, Order::Asc)
            .to_owned();

        self.fetch_all("list_columns", &stmt)
            .await?
            .iter()
            .map(column_from_row)
            .collect()
    }

    async fn list_foreign_key_constraints(&self) -> Result<Vec<Constraint>, DriftErr> {
        let kcu = Alias::new("kcu");
        let rc = Alias::new("rc");
        let stmt = Query::select()
            .expr_as(
                Expr::col((kcu.clone(), KeyColumnUsage::ConstraintName)),
                KeyColumnUsage::ConstraintName,
            )
            .expr_as(
                Expr::col((kcu.clone(), KeyColumnUsage::TableName)),
                KeyColumnUsage::TableName,
            )
            .expr_as(
                Expr::col((kcu.clone(), KeyColumnUsage::ColumnName)),
                KeyColumnUsage::ColumnName,
            )
            .expr_as(
                Expr::col((kcu.clone(), KeyColumnUsage::ReferencedTableName)),
                KeyColumnUsage::ReferencedTableName,
            )
            .expr_as(
                Expr::col((kcu.clone(), KeyColumnUsage::ReferencedColumnName)),
                KeyColumnUsage::ReferencedColumnName,
            )
            .expr_as(
                Expr::col((rc.clone(), ReferentialConstraints::UpdateRule)),
                ReferentialConstraints::UpdateRule,
            )
            .expr_as(
                Expr::col((rc.clone(), ReferentialConstraints::DeleteRule)),
                ReferentialConstraints::DeleteRule,
            )
            .from_as((InformationSchema, KeyColumnUsage::Table), kcu.clone())
            .join_as(
                JoinType::InnerJoin,
                (InformationSchema, ReferentialConstraints::Table),
                rc.clone(),
                Cond::all()
                    .add(
                        Expr::col((kcu.clone(), KeyColumnUsage::ConstraintName))
                            .equals((rc.clone(), ReferentialConstraints::ConstraintName)),
                    )
                    .add(
                        Expr::col((kcu.clone(), KeyColumnUsage::ConstraintSchema))
                            .equals((rc.clone(), ReferentialConstraints::ConstraintSchema)),
                    ),
            )
            .and_where(
                Expr::col((kcu.clone(), KeyColumnUsage::ConstraintSchema)).eq(self.schema.as_str()),
            )
            .and_where(
                Expr::col((kcu.clone(), KeyColumnUsage::ReferencedTableSchema))
                    .eq(self.schema.as_str()),
            )
            .and_where(Expr::col((kcu.clone(), KeyColumnUsage::ReferencedColumnName)).is_not_null())
            .order_by((kcu, KeyColumnUsage::ColumnName), Order::Asc)
            .to_owned();

        self.fetch_all("list_foreign_key_constraints", &stmt)
            .await?
            .iter()
            .map(constraint_from_row)
            .collect()
    }
}

fn column_from_row(row: &MySqlRow) -> Result<Column, DriftErr> {
    let max_length: Option<i64> = row.try_get("character_maximum_length")?;
    Ok(Column {
        name: row.try_get("column_name")?,
        default: row.try_get("column_default")?,
        nullable: row.try_get::<String, _>("is_nullable")? == "YES",
        data_type: row.try_get("data_type")?,
        max_length: max_length.and_then(|len| u64::try_from(len).ok()),
        charset: row.try_get("character_set_name")?,
        collation: row.try_get("collation_name")?,
        column_type: row.try_get("column_type")?,
        key: row
            .try_get::<Option<String>, _>("column_key")?
            .unwrap_or_default(),
        extra: row.try_get::<Option<String>, _>("extra")?.unwrap_or_default(),
        generated: row.try_get("is_generated")?,
    })
}

fn constraint_from_row(row: &MySqlRow) -> Result<Constraint, DriftErr> {
    Ok(Constraint {
        name: row.try_get("constraint_name")?,
        table: row.try_get("table_name")?,
        column: row.try_get("column_name")?,
        referenced_table: row.try_get("referenced_table_name")?,
        referenced_column: row.try_get("referenced_column_name")?,
        update_rule: row.try_get("update_rule")?,
        delete_rule: row.try_get("delete_rule")?,
    })
}

/// The database named by the path of a connection URL
fn database_name(url: &str) -> Result<String, DriftErr> {
    let url = Url::parse(url).map_err(|e| DriftErr::Config(format!("invalid database url: {e}")))?;
    url.path_segments()
        .and_then(|mut segments| segments.next())
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| DriftErr::Config("database url has no database name".to_owned()))
}

/// Run `op`, retrying fatal failures up to `policy.retries` times
async fn with_retry<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, DriftErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DriftErr>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if err.is_fatal() && attempt < policy.retries => {
                let delay = policy.delay(attempt);
                attempt += 1;
                warn!(%err, attempt, ?delay, "{what} failed, retrying");
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}
