//! Model Query - root query over a model with preloads

use std::sync::Arc;

use serde_json::Value;

use super::instance::ModelInstance;
use super::options::QueryOptions;
use super::registry::ModelRegistry;
use super::schema::ModelSchema;
use crate::backends::Database;
use crate::error::ModelResult;
use crate::loading::{PreloadTree, Preloader};
use crate::query::QueryBuilder;
use crate::relationships::RelationQueryBuilder;

/// Root query that hydrates instances and runs their preloads
#[derive(Debug, Clone)]
pub struct ModelQuery {
    schema: Arc<ModelSchema>,
    registry: ModelRegistry,
    query: QueryBuilder,
    options: QueryOptions,
    preloader: Preloader,
}

impl ModelQuery {
    pub fn new(schema: Arc<ModelSchema>, registry: ModelRegistry) -> Self {
        let query = QueryBuilder::table(schema.table());
        Self {
            schema,
            registry,
            query,
            options: QueryOptions::default(),
            preloader: Preloader::new(),
        }
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    pub fn select(mut self, fields: &str) -> Self {
        self.query = self.query.select(fields);
        self
    }

    pub fn where_eq<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.query = self.query.where_eq(column, value);
        self
    }

    pub fn where_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.query = self.query.where_in(column, values);
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.query = self.query.where_null(column);
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.query = self.query.order_by(column);
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.query = self.query.order_by_desc(column);
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.query = self.query.limit(count);
        self
    }

    pub fn offset(mut self, count: i64) -> Self {
        self.query = self.query.offset(count);
        self
    }

    /// Run on a named connection, including every preload query
    pub fn connection(mut self, name: &str) -> Self {
        self.options.connection = Some(name.to_string());
        self
    }

    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn query_options(&self) -> &QueryOptions {
        &self.options
    }

    /// Preload a dotted relation path
    pub fn preload(mut self, path: &str) -> Self {
        self.preloader = self.preloader.preload(path);
        self
    }

    /// Preload a dotted relation path, refining the leaf relation's query
    pub fn preload_with<F>(mut self, path: &str, scope: F) -> Self
    where
        F: Fn(RelationQueryBuilder) -> RelationQueryBuilder + Send + Sync + 'static,
    {
        self.preloader = self.preloader.preload_with(path, scope);
        self
    }

    pub fn preload_tree(&self) -> &PreloadTree {
        self.preloader.tree()
    }

    pub fn to_sql(&self) -> String {
        self.query.to_sql()
    }

    /// Run the root query, hydrate it, then run the preloads
    pub async fn fetch(self, db: &Database) -> ModelResult<Vec<ModelInstance>> {
        let client = db.client(&self.options)?;
        let rows = client.fetch_all(&self.query).await?;

        let mut instances: Vec<ModelInstance> = rows
            .into_iter()
            .map(|row| ModelInstance::hydrate(&self.schema, row, &self.options))
            .collect();

        self.preloader
            .run(&self.schema, &self.registry, &mut instances, db)
            .await?;

        Ok(instances)
    }

    pub async fn first(self, db: &Database) -> ModelResult<Option<ModelInstance>> {
        let mut instances = self.limit(1).fetch(db).await?;
        Ok(if instances.is_empty() {
            None
        } else {
            Some(instances.swap_remove(0))
        })
    }
}
