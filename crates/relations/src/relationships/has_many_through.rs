//! HasManyThrough Relationship - parent has many related rows via an intermediate model
//!
//! ```text
//! countries.id (local_key)       <- users.country_id (foreign_key)
//! users.id (through_local_key)   <- posts.user_id (through_foreign_key)
//! ```
//!
//! The join to the through table is part of the base query, so any scoping
//! filter narrows an already joined universe. Each row also selects the
//! through table's foreign key as `through_<column>`, which is what a batch
//! is grouped by.
//!
//! The relation is read-only: a related row has no single foreign key that
//! points at the declaring model.

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use super::keys::{resolve_foreign_key, resolve_local_key};
use super::metadata::{GroupKey, RelationDefinition, RelationType, ThroughDefinition};
use super::options::HasManyThroughOptions;
use super::traits::RelationContract;
use crate::backends::Database;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInstance, ModelRegistry, ModelSchema};
use crate::query::QueryBuilder;

#[derive(Debug)]
pub struct HasManyThrough {
    name: String,
    options: HasManyThroughOptions,
    definition: OnceCell<RelationDefinition>,
}

impl HasManyThrough {
    pub fn new(name: &str, options: HasManyThroughOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
            definition: OnceCell::new(),
        }
    }

    pub fn through_model(&self) -> &str {
        &self.options.through_model
    }

    /// Always fails with `RelationSaveUnsupported`
    pub async fn save(
        &self,
        _owner: &ModelSchema,
        _registry: &ModelRegistry,
        _parent: &ModelInstance,
        _child: &mut ModelInstance,
        _db: &Database,
    ) -> ModelResult<()> {
        Err(self.save_unsupported())
    }

    /// Always fails with `RelationSaveUnsupported`
    pub async fn create(
        &self,
        _owner: &ModelSchema,
        _registry: &ModelRegistry,
        _parent: &ModelInstance,
        _attributes: Value,
        _db: &Database,
    ) -> ModelResult<ModelInstance> {
        Err(self.save_unsupported())
    }

    fn save_unsupported(&self) -> ModelError {
        ModelError::RelationSaveUnsupported {
            relation: self.name.clone(),
            kind: RelationType::HasManyThrough.to_string(),
        }
    }

    fn through_alias(definition: &RelationDefinition) -> String {
        format!("through_{}", definition.foreign_key.column)
    }
}

impl RelationContract for HasManyThrough {
    fn name(&self) -> &str {
        &self.name
    }

    fn relation_type(&self) -> RelationType {
        RelationType::HasManyThrough
    }

    fn related_model(&self) -> &str {
        &self.options.related_model
    }

    fn boot(&self, owner: &ModelSchema, registry: &ModelRegistry) -> ModelResult<&RelationDefinition> {
        self.definition.get_or_try_init(|| {
            let related = registry.get(&self.options.related_model)?;
            let through = registry.get(&self.options.through_model)?;
            let naming = owner.naming();

            let local_key = resolve_local_key(
                owner,
                &self.name,
                self.options.local_key.as_deref(),
                owner.primary_key(),
            )?;
            let default_foreign_key = naming.relation_foreign_key(owner.name(), owner.primary_key());
            let foreign_key = resolve_foreign_key(
                &through,
                &self.name,
                self.options.foreign_key.as_deref(),
                &default_foreign_key,
            )?;
            let through_local_key = resolve_local_key(
                &through,
                &self.name,
                self.options.through_local_key.as_deref(),
                through.primary_key(),
            )?;
            let default_through_foreign_key =
                naming.relation_foreign_key(through.name(), through.primary_key());
            let through_foreign_key = resolve_foreign_key(
                &related,
                &self.name,
                self.options.through_foreign_key.as_deref(),
                &default_through_foreign_key,
            )?;

            debug!(
                model = owner.name(),
                relation = %self.name,
                kind = "hasManyThrough",
                local_key = %local_key.attribute,
                foreign_key = %foreign_key.attribute,
                through_local_key = %through_local_key.attribute,
                through_foreign_key = %through_foreign_key.attribute,
                "relation booted"
            );

            Ok(RelationDefinition {
                relation_name: self.name.clone(),
                relation_type: RelationType::HasManyThrough,
                related_model: related.name().to_string(),
                related_table: related.table().to_string(),
                local_key,
                foreign_key,
                pivot: None,
                through: Some(ThroughDefinition {
                    through_model: through.name().to_string(),
                    through_table: through.table().to_string(),
                    through_local_key,
                    through_foreign_key,
                }),
            })
        })
    }

    fn is_booted(&self) -> bool {
        self.definition.get().is_some()
    }

    fn base_query(&self, definition: &RelationDefinition) -> QueryBuilder {
        let related = &definition.related_table;
        let query = QueryBuilder::table(related).select(&format!("{}.*", related));

        match &definition.through {
            Some(through) => query
                .select(&format!(
                    "{} AS {}",
                    definition.foreign_key.qualified(&through.through_table),
                    Self::through_alias(definition)
                ))
                .join(
                    &through.through_table,
                    &through.through_local_key.qualified(&through.through_table),
                    &through.through_foreign_key.qualified(related),
                ),
            None => query,
        }
    }

    fn scope_column(&self, definition: &RelationDefinition) -> String {
        match &definition.through {
            Some(through) => definition.foreign_key.qualified(&through.through_table),
            None => definition.foreign_key.qualified(&definition.related_table),
        }
    }

    fn group_key(&self, definition: &RelationDefinition) -> GroupKey {
        GroupKey::Extra(Self::through_alias(definition))
    }
}
