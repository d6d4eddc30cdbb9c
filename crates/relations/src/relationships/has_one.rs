//! HasOne Relationship - parent model has one related model

use once_cell::sync::OnceCell;
use serde_json::Value;

use super::has_many::{resolve_direct, save_child};
use super::metadata::{RelationDefinition, RelationType};
use super::options::HasOneOptions;
use super::traits::RelationContract;
use crate::backends::Database;
use crate::error::ModelResult;
use crate::model::{ModelInstance, ModelRegistry, ModelSchema};

#[derive(Debug)]
pub struct HasOne {
    name: String,
    options: HasOneOptions,
    definition: OnceCell<RelationDefinition>,
}

impl HasOne {
    pub fn new(name: &str, options: HasOneOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
            definition: OnceCell::new(),
        }
    }

    pub async fn save(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        parent: &ModelInstance,
        child: &mut ModelInstance,
        db: &Database,
    ) -> ModelResult<()> {
        let definition = self.boot(owner, registry)?;
        save_child(definition, registry, parent, child, db).await
    }

    pub async fn create(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        parent: &ModelInstance,
        attributes: Value,
        db: &Database,
    ) -> ModelResult<ModelInstance> {
        let definition = self.boot(owner, registry)?;
        let related = registry.get(&definition.related_model)?;
        let mut child = ModelInstance::from_attributes(&related, attributes);
        save_child(definition, registry, parent, &mut child, db).await?;
        Ok(child)
    }
}

impl RelationContract for HasOne {
    fn name(&self) -> &str {
        &self.name
    }

    fn relation_type(&self) -> RelationType {
        RelationType::HasOne
    }

    fn related_model(&self) -> &str {
        &self.options.related_model
    }

    fn boot(&self, owner: &ModelSchema, registry: &ModelRegistry) -> ModelResult<&RelationDefinition> {
        self.definition.get_or_try_init(|| {
            resolve_direct(owner, registry, &self.name, &self.options, RelationType::HasOne)
        })
    }

    fn is_booted(&self) -> bool {
        self.definition.get().is_some()
    }
}
