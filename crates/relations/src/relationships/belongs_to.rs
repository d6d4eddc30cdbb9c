//! BelongsTo Relationship - child model belongs to a parent model
//!
//! The foreign key lives on the declaring model and references the related
//! model's local key, so batches are scoped by the declaring rows' foreign
//! key values and grouped by the related key.

use once_cell::sync::OnceCell;
use tracing::debug;

use super::keys::{resolve_foreign_key, resolve_local_key};
use super::metadata::{GroupKey, KeyPair, RelationDefinition, RelationType};
use super::options::BelongsToOptions;
use super::traits::RelationContract;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInstance, ModelRegistry, ModelSchema, Preloaded};

#[derive(Debug)]
pub struct BelongsTo {
    name: String,
    options: BelongsToOptions,
    definition: OnceCell<RelationDefinition>,
}

impl BelongsTo {
    pub fn new(name: &str, options: BelongsToOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
            definition: OnceCell::new(),
        }
    }

    /// Point `child` at `parent` in memory; nothing is written
    pub fn associate(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        child: &mut ModelInstance,
        parent: &ModelInstance,
    ) -> ModelResult<()> {
        let definition = self.boot(owner, registry)?;
        let value = parent
            .attribute(&definition.local_key.attribute)
            .cloned()
            .ok_or_else(|| ModelError::MissingLocalKeyValue {
                model: parent.model_name().to_string(),
                relation: self.name.clone(),
                key: definition.local_key.attribute.clone(),
            })?;

        child.set_attribute(&definition.foreign_key.attribute, value);
        child.set_related(&self.name, Preloaded::One(Some(Box::new(parent.clone()))));
        Ok(())
    }

    /// Clear the foreign key in memory
    pub fn dissociate(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        child: &mut ModelInstance,
    ) -> ModelResult<()> {
        let definition = self.boot(owner, registry)?;
        child.set_attribute(&definition.foreign_key.attribute, serde_json::Value::Null);
        child.set_related(&self.name, Preloaded::One(None));
        Ok(())
    }
}

impl RelationContract for BelongsTo {
    fn name(&self) -> &str {
        &self.name
    }

    fn relation_type(&self) -> RelationType {
        RelationType::BelongsTo
    }

    fn related_model(&self) -> &str {
        &self.options.related_model
    }

    fn boot(&self, owner: &ModelSchema, registry: &ModelRegistry) -> ModelResult<&RelationDefinition> {
        self.definition.get_or_try_init(|| {
            let related = registry.get(&self.options.related_model)?;

            let local_key = resolve_local_key(
                &related,
                &self.name,
                self.options.local_key.as_deref(),
                related.primary_key(),
            )?;
            let default_foreign_key = owner
                .naming()
                .relation_foreign_key(related.name(), related.primary_key());
            let foreign_key = resolve_foreign_key(
                owner,
                &self.name,
                self.options.foreign_key.as_deref(),
                &default_foreign_key,
            )?;

            debug!(
                model = owner.name(),
                relation = %self.name,
                kind = "belongsTo",
                local_key = %local_key.attribute,
                foreign_key = %foreign_key.attribute,
                "relation booted"
            );

            Ok(RelationDefinition {
                relation_name: self.name.clone(),
                relation_type: RelationType::BelongsTo,
                related_model: related.name().to_string(),
                related_table: related.table().to_string(),
                local_key,
                foreign_key,
                pivot: None,
                through: None,
            })
        })
    }

    fn is_booted(&self) -> bool {
        self.definition.get().is_some()
    }

    fn parent_key<'d>(&self, definition: &'d RelationDefinition) -> &'d KeyPair {
        &definition.foreign_key
    }

    fn scope_column(&self, definition: &RelationDefinition) -> String {
        definition.local_key.qualified(&definition.related_table)
    }

    fn group_key(&self, definition: &RelationDefinition) -> GroupKey {
        GroupKey::Attribute(definition.local_key.clone())
    }
}
