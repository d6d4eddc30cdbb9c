//! Model Registry - resolves related model references by name

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::query::ModelQuery;
use super::schema::ModelSchema;
use crate::error::{ModelError, ModelResult};

/// Shared, cloneable map of model name to schema
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Arc<DashMap<String, Arc<ModelSchema>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, replacing any schema with the same name
    pub fn register(&self, schema: ModelSchema) -> Arc<ModelSchema> {
        let schema = Arc::new(schema);
        debug!(model = schema.name(), table = schema.table(), "model registered");
        self.models.insert(schema.name().to_string(), Arc::clone(&schema));
        schema
    }

    pub fn get(&self, name: &str) -> ModelResult<Arc<ModelSchema>> {
        self.models
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Boot every relation of a model
    pub fn boot(&self, name: &str) -> ModelResult<()> {
        let schema = self.get(name)?;
        for relation in schema.relations() {
            relation.contract().boot(&schema, self)?;
        }
        Ok(())
    }

    /// Boot every relation of every registered model
    pub fn boot_all(&self) -> ModelResult<()> {
        let names: Vec<String> = self.models.iter().map(|entry| entry.key().clone()).collect();
        for name in names {
            self.boot(&name)?;
        }
        Ok(())
    }

    /// Start a root query over a registered model
    pub fn query(&self, name: &str) -> ModelResult<ModelQuery> {
        Ok(ModelQuery::new(self.get(name)?, self.clone()))
    }
}
