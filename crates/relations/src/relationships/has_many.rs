//! HasMany Relationship - parent model has many related models

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use super::keys::{parent_key_value, resolve_foreign_key, resolve_local_key};
use super::metadata::{RelationDefinition, RelationType};
use super::options::HasManyOptions;
use super::traits::RelationContract;
use crate::backends::Database;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInstance, ModelRegistry, ModelSchema};

#[derive(Debug)]
pub struct HasMany {
    name: String,
    options: HasManyOptions,
    definition: OnceCell<RelationDefinition>,
}

impl HasMany {
    pub fn new(name: &str, options: HasManyOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
            definition: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &HasManyOptions {
        &self.options
    }

    /// Set the child's foreign key from the parent and insert it
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

    /// Build a child from raw attributes, then save it
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

impl RelationContract for HasMany {
    fn name(&self) -> &str {
        &self.name
    }

    fn relation_type(&self) -> RelationType {
        RelationType::HasMany
    }

    fn related_model(&self) -> &str {
        &self.options.related_model
    }

    fn boot(&self, owner: &ModelSchema, registry: &ModelRegistry) -> ModelResult<&RelationDefinition> {
        self.definition.get_or_try_init(|| {
            resolve_direct(owner, registry, &self.name, &self.options, RelationType::HasMany)
        })
    }

    fn is_booted(&self) -> bool {
        self.definition.get().is_some()
    }
}

/// Key resolution shared by `hasOne` and `hasMany`: both keep the foreign key on the related model
pub(crate) fn resolve_direct(
    owner: &ModelSchema,
    registry: &ModelRegistry,
    name: &str,
    options: &HasManyOptions,
    relation_type: RelationType,
) -> ModelResult<RelationDefinition> {
    let related = registry.get(&options.related_model)?;

    let local_key = resolve_local_key(owner, name, options.local_key.as_deref(), owner.primary_key())?;
    let default_foreign_key = owner
        .naming()
        .relation_foreign_key(owner.name(), owner.primary_key());
    let foreign_key = resolve_foreign_key(
        &related,
        name,
        options.foreign_key.as_deref(),
        &default_foreign_key,
    )?;

    debug!(
        model = owner.name(),
        relation = name,
        kind = %relation_type,
        local_key = %local_key.attribute,
        foreign_key = %foreign_key.attribute,
        "relation booted"
    );

    Ok(RelationDefinition {
        relation_name: name.to_string(),
        relation_type,
        related_model: related.name().to_string(),
        related_table: related.table().to_string(),
        local_key,
        foreign_key,
        pivot: None,
        through: None,
    })
}

pub(crate) async fn save_child(
    definition: &RelationDefinition,
    registry: &ModelRegistry,
    parent: &ModelInstance,
    child: &mut ModelInstance,
    db: &Database,
) -> ModelResult<()> {
    let related = registry.get(&definition.related_model)?;
    let value = parent_key_value(parent, &definition.relation_name, &definition.local_key)?
        .ok_or_else(|| ModelError::MissingLocalKeyValue {
            model: parent.model_name().to_string(),
            relation: definition.relation_name.clone(),
            key: definition.local_key.attribute.clone(),
        })?;

    child.set_attribute(&definition.foreign_key.attribute, value.to_json());
    child.set_options(parent.options().clone());

    let client = db.client(parent.options())?;
    client.execute(&child.insert_query(&related)).await?;
    child.mark_persisted();
    Ok(())
}
