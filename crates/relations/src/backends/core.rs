//! Core Database Backend Traits
//!
//! Relations never talk to a driver directly. Every query goes through a
//! [`QueryClient`] selected from a [`Database`] by the ambient
//! [`QueryOptions`], so a preload cannot drift to another connection.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::config::{PreloadConfig, RelationsConfig};
use crate::error::{ModelError, ModelResult};
use crate::model::QueryOptions;
use crate::query::{QueryBuilder, SqlQuery};

/// A result row keyed by output column name
pub type Row = Map<String, JsonValue>;

/// Abstract database connection trait
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Execute a query and return the result rows
    async fn fetch_all(&self, query: &SqlQuery) -> ModelResult<Vec<Row>>;

    /// Execute a statement and return the affected rows count
    async fn execute(&self, query: &SqlQuery) -> ModelResult<u64>;
}

/// Named connection manager
#[derive(Clone)]
pub struct Database {
    connections: Arc<DashMap<String, Arc<dyn DatabaseConnection>>>,
    config: RelationsConfig,
}

impl Database {
    /// Create an empty manager with the default configuration
    pub fn new() -> Self {
        Self::with_config(RelationsConfig::default())
    }

    /// Create an empty manager with an explicit configuration
    pub fn with_config(config: RelationsConfig) -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Register a connection under a name (builder style)
    pub fn with_connection<C>(self, name: &str, connection: C) -> Self
    where
        C: DatabaseConnection + 'static,
    {
        self.register(name, Arc::new(connection));
        self
    }

    /// Register or replace a shared connection
    pub fn register(&self, name: &str, connection: Arc<dyn DatabaseConnection>) {
        self.connections.insert(name.to_string(), connection);
    }

    /// Whether a connection name is registered
    pub fn has_connection(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    pub fn config(&self) -> &RelationsConfig {
        &self.config
    }

    pub fn preload_config(&self) -> &PreloadConfig {
        &self.config.preload
    }

    /// Select the connection named by the options, or the default one
    pub fn client(&self, options: &QueryOptions) -> ModelResult<QueryClient> {
        let name = options
            .connection
            .as_deref()
            .unwrap_or(&self.config.default_connection);

        let connection = self
            .connections
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ModelError::UnknownConnection(name.to_string()))?;

        Ok(QueryClient {
            connection_name: name.to_string(),
            connection,
            options: options.clone(),
        })
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.connections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("Database")
            .field("connections", &names)
            .field("config", &self.config)
            .finish()
    }
}

/// A connection paired with the query options it was selected by
#[derive(Clone)]
pub struct QueryClient {
    connection_name: String,
    connection: Arc<dyn DatabaseConnection>,
    options: QueryOptions,
}

impl QueryClient {
    pub fn connection_name(&self) -> &str {
        &self.connection_name
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Compile and run a SELECT
    pub async fn fetch_all(&self, query: &QueryBuilder) -> ModelResult<Vec<Row>> {
        let compiled = query.to_sql_with_params();
        debug!(
            connection = %self.connection_name,
            bindings = compiled.bindings.len(),
            sql = %compiled.sql,
            "fetch"
        );
        self.connection.fetch_all(&compiled).await
    }

    /// Compile and run an INSERT
    pub async fn execute(&self, query: &QueryBuilder) -> ModelResult<u64> {
        let compiled = query.to_sql_with_params();
        debug!(
            connection = %self.connection_name,
            bindings = compiled.bindings.len(),
            sql = %compiled.sql,
            "execute"
        );
        self.connection.execute(&compiled).await
    }
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("connection_name", &self.connection_name)
            .field("options", &self.options)
            .finish()
    }
}
