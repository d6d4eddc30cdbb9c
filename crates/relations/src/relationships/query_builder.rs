//! Relation Query Builder - a query scoped to the rows of one or many parents
//!
//! The relation's joins and key filters are applied when the builder is
//! created. Callers (including preload scopes) can only add clauses on top.

use std::sync::Arc;

use serde_json::Value;

use super::metadata::GroupKey;
use crate::backends::QueryClient;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInstance, ModelSchema};
use crate::query::{QueryBuilder, SqlQuery};

/// Caller-supplied refinement of a relation query
pub type RelationScope = Arc<dyn Fn(RelationQueryBuilder) -> RelationQueryBuilder + Send + Sync>;

/// Whether the builder targets one parent or a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationQueryMode {
    ScopedToOne,
    ScopedToMany,
}

#[derive(Debug, Clone)]
pub struct RelationQueryBuilder {
    relation: String,
    related: Arc<ModelSchema>,
    query: QueryBuilder,
    client: QueryClient,
    mode: RelationQueryMode,
    group_key: Option<GroupKey>,
}

impl RelationQueryBuilder {
    pub(crate) fn new(
        relation: &str,
        related: Arc<ModelSchema>,
        query: QueryBuilder,
        client: QueryClient,
        mode: RelationQueryMode,
        group_key: Option<GroupKey>,
    ) -> Self {
        Self {
            relation: relation.to_string(),
            related,
            query,
            client,
            mode,
            group_key,
        }
    }

    pub fn relation_name(&self) -> &str {
        &self.relation
    }

    pub fn related(&self) -> &Arc<ModelSchema> {
        &self.related
    }

    pub fn mode(&self) -> RelationQueryMode {
        self.mode
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    /// Read-only view of the underlying query
    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    pub fn to_sql(&self) -> String {
        self.query.to_sql()
    }

    pub fn to_sql_with_params(&self) -> SqlQuery {
        self.query.to_sql_with_params()
    }

    pub fn select(mut self, fields: &str) -> Self {
        self.query = self.query.select(fields);
        self
    }

    pub fn where_eq<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.query = self.query.where_eq(column, value);
        self
    }

    pub fn where_ne<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.query = self.query.where_ne(column, value);
        self
    }

    pub fn where_gt<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.query = self.query.where_gt(column, value);
        self
    }

    pub fn where_lt<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.query = self.query.where_lt(column, value);
        self
    }

    pub fn where_like(mut self, column: &str, pattern: &str) -> Self {
        self.query = self.query.where_like(column, pattern);
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

    pub fn where_not_null(mut self, column: &str) -> Self {
        self.query = self.query.where_not_null(column);
        self
    }

    pub fn where_raw(mut self, condition: &str) -> Self {
        self.query = self.query.where_raw(condition);
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

    /// Apply an optional scope callback
    pub fn apply_scope(self, scope: Option<&RelationScope>) -> Self {
        match scope {
            Some(scope) => scope(self),
            None => self,
        }
    }

    /// Fail if the batch grouping column was excluded by the selection
    pub fn ensure_group_key_selected(&self) -> ModelResult<()> {
        match &self.group_key {
            Some(group_key) if !self.query.selects_column(self.related.table(), group_key.output_column()) => {
                Err(ModelError::MissingSelectedKey {
                    relation: self.relation.clone(),
                    key: group_key.output_column().to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Execute and hydrate related instances with the client's options
    pub async fn fetch(self) -> ModelResult<Vec<ModelInstance>> {
        self.ensure_group_key_selected()?;

        let rows = self.client.fetch_all(&self.query).await?;
        Ok(rows
            .into_iter()
            .map(|row| ModelInstance::hydrate(&self.related, row, self.client.options()))
            .collect())
    }

    /// Execute and return the first related instance
    pub async fn first(self) -> ModelResult<Option<ModelInstance>> {
        let mut instances = self.limit(1).fetch().await?;
        Ok(if instances.is_empty() {
            None
        } else {
            Some(instances.swap_remove(0))
        })
    }
}
