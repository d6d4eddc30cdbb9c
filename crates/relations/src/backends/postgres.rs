//! PostgreSQL Backend Implementation
//!
//! Runs compiled queries over a `sqlx` pool and converts result rows into
//! JSON maps keyed by column name.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Column, PgPool, Postgres, Row as SqlxRow, TypeInfo, ValueRef};
use uuid::Uuid;

use super::core::{DatabaseConnection, Row};
use crate::error::{ModelError, ModelResult};
use crate::query::SqlQuery;

/// PostgreSQL connection over a shared pool
#[derive(Debug, Clone)]
pub struct PostgresConnection {
    pool: Arc<PgPool>,
}

impl PostgresConnection {
    /// Wrap an existing pool
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Connect a new pool
    pub async fn connect(database_url: &str, max_connections: u32) -> ModelResult<Self> {
        if !database_url.starts_with("postgresql://") && !database_url.starts_with("postgres://") {
            return Err(ModelError::Configuration(
                "Invalid PostgreSQL URL scheme".to_string(),
            ));
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| ModelError::Database(format!("Failed to create PostgreSQL pool: {}", e)))?;

        Ok(Self::new(Arc::new(pool)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DatabaseConnection for PostgresConnection {
    async fn fetch_all(&self, query: &SqlQuery) -> ModelResult<Vec<Row>> {
        let mut prepared = sqlx::query(&query.sql);
        for binding in &query.bindings {
            prepared = bind_json_value(prepared, binding);
        }

        let rows = prepared
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| ModelError::Database(format!("Query fetch failed: {}", e)))?;

        rows.iter().map(row_to_json).collect()
    }

    async fn execute(&self, query: &SqlQuery) -> ModelResult<u64> {
        let mut prepared = sqlx::query(&query.sql);
        for binding in &query.bindings {
            prepared = bind_json_value(prepared, binding);
        }

        let result = prepared
            .execute(&*self.pool)
            .await
            .map_err(|e| ModelError::Database(format!("Query execution failed: {}", e)))?;

        Ok(result.rows_affected())
    }
}

/// Parameter type a JSON binding is sent as
#[derive(Debug, PartialEq)]
enum BindValue<'v> {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Uuid(Uuid),
    Text(&'v str),
    Json(&'v JsonValue),
}

impl<'v> BindValue<'v> {
    // UUID-shaped strings bind as uuid
    fn classify(value: &'v JsonValue) -> Self {
        match value {
            JsonValue::Null => BindValue::Null,
            JsonValue::Bool(b) => BindValue::Bool(*b),
            JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => BindValue::Integer(i),
                (None, Some(f)) => BindValue::Float(f),
                (None, None) => BindValue::Json(value),
            },
            JsonValue::String(s) => match Uuid::parse_str(s) {
                Ok(uuid) => BindValue::Uuid(uuid),
                Err(_) => BindValue::Text(s),
            },
            other => BindValue::Json(other),
        }
    }
}

/// Bind a JSON value to a sqlx query
fn bind_json_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &JsonValue,
) -> Query<'q, Postgres, PgArguments> {
    match BindValue::classify(value) {
        BindValue::Null => query.bind(Option::<String>::None),
        BindValue::Bool(b) => query.bind(b),
        BindValue::Integer(i) => query.bind(i),
        BindValue::Float(f) => query.bind(f),
        BindValue::Uuid(uuid) => query.bind(uuid),
        BindValue::Text(s) => query.bind(s.to_string()),
        BindValue::Json(other) => query.bind(other.clone()),
    }
}

/// Convert a PostgreSQL row into a JSON map
fn row_to_json(row: &PgRow) -> ModelResult<Row> {
    let mut map = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        map.insert(column.name().to_string(), column_to_json(row, index)?);
    }
    Ok(map)
}

fn column_to_json(row: &PgRow, index: usize) -> ModelResult<JsonValue> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(JsonValue::Null);
    }

    let type_name = row.columns()[index].type_info().name().to_string();
    let value = match type_name.as_str() {
        "BOOL" => JsonValue::Bool(row.try_get(index)?),
        "INT2" => JsonValue::from(row.try_get::<i16, _>(index)?),
        "INT4" => JsonValue::from(row.try_get::<i32, _>(index)?),
        "INT8" => JsonValue::from(row.try_get::<i64, _>(index)?),
        "FLOAT4" => JsonValue::from(row.try_get::<f32, _>(index)? as f64),
        "FLOAT8" => JsonValue::from(row.try_get::<f64, _>(index)?),
        "UUID" => JsonValue::String(row.try_get::<Uuid, _>(index)?.to_string()),
        "TIMESTAMPTZ" => {
            JsonValue::String(row.try_get::<chrono::DateTime<chrono::Utc>, _>(index)?.to_rfc3339())
        }
        "TIMESTAMP" => JsonValue::String(row.try_get::<chrono::NaiveDateTime, _>(index)?.to_string()),
        "DATE" => JsonValue::String(row.try_get::<chrono::NaiveDate, _>(index)?.to_string()),
        "TIME" => JsonValue::String(row.try_get::<chrono::NaiveTime, _>(index)?.to_string()),
        "JSON" | "JSONB" => row.try_get::<JsonValue, _>(index)?,
        _ => {
            // Fallback: try to get as string
            let value: String = row.try_get(index).map_err(|e| {
                ModelError::Database(format!(
                    "Failed to get value as string for unknown type '{}': {}",
                    type_name, e
                ))
            })?;
            JsonValue::String(value)
        }
    };

    Ok(value)
}
