//! PostgreSQL storage backend built on sqlx
//!
//! Tables and columns arrive at runtime as strings, so statements are
//! assembled dynamically: identifiers are validated before interpolation
//! and every value goes through a bind parameter. Column values are decoded
//! into JSON values by Postgres type name.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Pool, Postgres, Row, TypeInfo};
use tracing::debug;

use super::{validate_identifier, Storage, StorageError, StorageResult};

/// Connection settings for [`PostgresStorage`].
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

impl PostgresConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            max_connections: 10,
            acquire_timeout_seconds: 30,
        }
    }

    /// Read the connection URL from `DATABASE_URL`.
    pub fn from_env() -> StorageResult<Self> {
        std::env::var("DATABASE_URL")
            .map(|url| Self::new(&url))
            .map_err(|_| StorageError::Connection("DATABASE_URL is not set".to_string()))
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout(mut self, seconds: u64) -> Self {
        self.acquire_timeout_seconds = seconds;
        self
    }
}

/// PostgreSQL-backed row store.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: Pool<Postgres>,
}

impl PostgresStorage {
    pub async fn connect(config: PostgresConfig) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                StorageError::Connection(format!("failed to create PostgreSQL pool: {}", e))
            })?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool, e.g. one whose connections are scoped to a
    /// caller-managed transaction.
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn insert(
        &self,
        table: &str,
        key: &str,
        attributes: &Map<String, Value>,
    ) -> StorageResult<Value> {
        validate_identifier(table)?;
        validate_identifier(key)?;
        for column in attributes.keys() {
            validate_identifier(column)?;
        }

        let sql = if attributes.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, key)
        } else {
            let columns: Vec<&str> = attributes.keys().map(String::as_str).collect();
            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| format!("${}", i)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
                table,
                columns.join(", "),
                placeholders.join(", "),
                key
            )
        };

        let mut query = sqlx::query(&sql);
        for value in attributes.values() {
            query = bind_value(query, value);
        }

        let row = query.fetch_one(&self.pool).await?;
        let id = decode_column(&row, 0)?;
        debug!(table, id = %id, "inserted row");
        Ok(id)
    }

    async fn update(
        &self,
        table: &str,
        key: &str,
        id: &Value,
        attributes: &Map<String, Value>,
    ) -> StorageResult<()> {
        if attributes.is_empty() {
            return Ok(());
        }
        validate_identifier(table)?;
        validate_identifier(key)?;
        for column in attributes.keys() {
            validate_identifier(column)?;
        }

        let assignments: Vec<String> = attributes
            .keys()
            .enumerate()
            .map(|(i, column)| format!("{} = ${}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ${}",
            table,
            assignments.join(", "),
            key,
            attributes.len() + 1
        );

        let mut query = sqlx::query(&sql);
        for value in attributes.values() {
            query = bind_value(query, value);
        }
        query = bind_value(query, id);

        query.execute(&self.pool).await?;
        debug!(table, id = %id, "updated row");
        Ok(())
    }

    async fn find_by_id(
        &self,
        table: &str,
        key: &str,
        id: &Value,
    ) -> StorageResult<Option<Map<String, Value>>> {
        validate_identifier(table)?;
        validate_identifier(key)?;

        let sql = format!("SELECT * FROM {} WHERE {} = $1", table, key);
        let row = bind_value(sqlx::query(&sql), id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row_to_map(&row)).transpose()
    }

    async fn find_many(
        &self,
        table: &str,
        filter: &Map<String, Value>,
    ) -> StorageResult<Vec<Map<String, Value>>> {
        validate_identifier(table)?;
        for column in filter.keys() {
            validate_identifier(column)?;
        }

        let sql = if filter.is_empty() {
            format!("SELECT * FROM {}", table)
        } else {
            let conditions: Vec<String> = filter
                .keys()
                .enumerate()
                .map(|(i, column)| format!("{} = ${}", column, i + 1))
                .collect();
            format!("SELECT * FROM {} WHERE {}", table, conditions.join(" AND "))
        };

        let mut query = sqlx::query(&sql);
        for value in filter.values() {
            query = bind_value(query, value);
        }

        let rows = query.fetch_all(&self.pool).await?;
        debug!(table, count = rows.len(), "fetched rows");
        rows.iter().map(row_to_map).collect()
    }

    async fn insert_pivot(
        &self,
        table: &str,
        left_key: &str,
        left_id: &Value,
        right_key: &str,
        right_id: &Value,
    ) -> StorageResult<()> {
        validate_identifier(table)?;
        validate_identifier(left_key)?;
        validate_identifier(right_key)?;

        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES ($1, $2)",
            table, left_key, right_key
        );
        let query = bind_value(bind_value(sqlx::query(&sql), left_id), right_id);
        query.execute(&self.pool).await?;

        debug!(table, left = %left_id, right = %right_id, "inserted pivot row");
        Ok(())
    }
}

/// Bind one JSON value as the matching Postgres parameter type. Composite
/// values go through JSONB.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        composite @ (Value::Array(_) | Value::Object(_)) => query.bind(composite.clone()),
    }
}

fn row_to_map(row: &PgRow) -> StorageResult<Map<String, Value>> {
    let mut map = Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), decode_column(row, index)?);
    }
    Ok(map)
}

/// Decode one column into a JSON value by Postgres type name. Types with no
/// JSON-native shape fall back to their text form; anything undecodable
/// becomes null.
fn decode_column(row: &PgRow, index: usize) -> StorageResult<Value> {
    let column = row
        .columns()
        .get(index)
        .ok_or_else(|| StorageError::Query(format!("column index {} out of range", index)))?;

    let decoded = match column.type_info().name() {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)?
            .map(|v| Value::Number(v.into())),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)?
            .map(|v| Value::Number(v.into())),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)?
            .map(|v| Value::Number(v.into())),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .and_then(|v| Number::from_f64(f64::from(v)))
            .map(Value::Number),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)?
            .and_then(Number::from_f64)
            .map(Value::Number),
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(index)?.map(Value::String)
        }
        "UUID" => row
            .try_get::<Option<uuid::Uuid>, _>(index)?
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)?
            .map(|v| Value::String(v.to_rfc3339())),
        "TIMESTAMP" => row
            .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
            .map(|v| Value::String(v.to_string())),
        "DATE" => row
            .try_get::<Option<chrono::NaiveDate>, _>(index)?
            .map(|v| Value::String(v.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String),
    };

    Ok(decoded.unwrap_or(Value::Null))
}
