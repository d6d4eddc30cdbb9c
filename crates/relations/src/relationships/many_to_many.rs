//! ManyToMany Relationship - related rows joined through a pivot table
//!
//! Each fetched row carries both pivot columns as `pivot_<column>` aliases.
//! Batches are grouped by the alias of the pivot column that references the
//! declaring model.

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use super::keys::{parent_key_value, resolve_foreign_key, resolve_local_key};
use super::metadata::{GroupKey, PivotDefinition, RelationDefinition, RelationType};
use super::options::ManyToManyOptions;
use super::traits::RelationContract;
use crate::backends::Database;
use crate::error::{ModelError, ModelResult};
use crate::model::{ModelInstance, ModelRegistry, ModelSchema};
use crate::query::QueryBuilder;
use crate::security::validate_identifier;
use crate::value::KeyValue;

#[derive(Debug)]
pub struct ManyToMany {
    name: String,
    options: ManyToManyOptions,
    definition: OnceCell<RelationDefinition>,
}

impl ManyToMany {
    pub fn new(name: &str, options: ManyToManyOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
            definition: OnceCell::new(),
        }
    }

    fn pivot<'d>(&self, definition: &'d RelationDefinition) -> ModelResult<&'d PivotDefinition> {
        definition
            .pivot
            .as_ref()
            .ok_or_else(|| ModelError::Schema(format!("Relation '{}' has no pivot table", self.name)))
    }

    /// Insert one pivot row per related key
    pub async fn attach<K>(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        parent: &ModelInstance,
        related_ids: Vec<K>,
        db: &Database,
    ) -> ModelResult<u64>
    where
        K: Into<KeyValue>,
    {
        let definition = self.boot(owner, registry)?;
        let pivot = self.pivot(definition)?;
        let parent_value = parent_key_value(parent, &self.name, &definition.local_key)?
            .ok_or_else(|| ModelError::MissingLocalKeyValue {
                model: parent.model_name().to_string(),
                relation: self.name.clone(),
                key: definition.local_key.attribute.clone(),
            })?;

        let client = db.client(parent.options())?;
        let mut inserted = 0;
        for related_id in related_ids {
            let related_id: KeyValue = related_id.into();
            let query = QueryBuilder::new()
                .insert_into(&pivot.table)
                .set(&pivot.foreign_key, parent_value.clone())
                .set(&pivot.related_foreign_key, related_id);
            inserted += client.execute(&query).await?;
        }
        Ok(inserted)
    }

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
            kind: RelationType::ManyToMany.to_string(),
        }
    }
}

impl RelationContract for ManyToMany {
    fn name(&self) -> &str {
        &self.name
    }

    fn relation_type(&self) -> RelationType {
        RelationType::ManyToMany
    }

    fn related_model(&self) -> &str {
        &self.options.related_model
    }

    fn boot(&self, owner: &ModelSchema, registry: &ModelRegistry) -> ModelResult<&RelationDefinition> {
        self.definition.get_or_try_init(|| {
            let related = registry.get(&self.options.related_model)?;
            let naming = owner.naming();

            let local_key = resolve_local_key(
                owner,
                &self.name,
                self.options.local_key.as_deref(),
                owner.primary_key(),
            )?;
            let related_key = resolve_foreign_key(
                &related,
                &self.name,
                self.options.related_key.as_deref(),
                related.primary_key(),
            )?;

            let pivot = PivotDefinition {
                table: self
                    .options
                    .pivot_table
                    .clone()
                    .unwrap_or_else(|| naming.relation_pivot_table(owner.name(), related.name())),
                foreign_key: self
                    .options
                    .pivot_foreign_key
                    .clone()
                    .unwrap_or_else(|| naming.relation_pivot_foreign_key(owner.name(), &local_key.attribute)),
                related_foreign_key: self.options.pivot_related_foreign_key.clone().unwrap_or_else(|| {
                    naming.relation_pivot_foreign_key(related.name(), &related_key.attribute)
                }),
                related_key: related_key.clone(),
            };
            validate_identifier(&pivot.table)?;
            validate_identifier(&pivot.foreign_key)?;
            validate_identifier(&pivot.related_foreign_key)?;
            if pivot.foreign_key == pivot.related_foreign_key {
                return Err(ModelError::Schema(format!(
                    "Relation '{}' on '{}' uses '{}' for both pivot columns of '{}'",
                    self.name,
                    owner.name(),
                    pivot.foreign_key,
                    pivot.table
                )));
            }

            debug!(
                model = owner.name(),
                relation = %self.name,
                kind = "manyToMany",
                local_key = %local_key.attribute,
                pivot_table = %pivot.table,
                pivot_foreign_key = %pivot.foreign_key,
                pivot_related_foreign_key = %pivot.related_foreign_key,
                "relation booted"
            );

            Ok(RelationDefinition {
                relation_name: self.name.clone(),
                relation_type: RelationType::ManyToMany,
                related_model: related.name().to_string(),
                related_table: related.table().to_string(),
                local_key,
                foreign_key: related_key,
                pivot: Some(pivot),
                through: None,
            })
        })
    }

    fn is_booted(&self) -> bool {
        self.definition.get().is_some()
    }

    fn base_query(&self, definition: &RelationDefinition) -> QueryBuilder {
        let related = &definition.related_table;
        let query = QueryBuilder::table(related).select(&format!("{}.*", related));

        match &definition.pivot {
            Some(pivot) => query
                .select(&format!(
                    "{table}.{fk} AS pivot_{fk}, {table}.{rfk} AS pivot_{rfk}",
                    table = pivot.table,
                    fk = pivot.foreign_key,
                    rfk = pivot.related_foreign_key,
                ))
                .join(
                    &pivot.table,
                    &pivot.related_key.qualified(related),
                    &format!("{}.{}", pivot.table, pivot.related_foreign_key),
                ),
            None => query,
        }
    }

    fn scope_column(&self, definition: &RelationDefinition) -> String {
        match &definition.pivot {
            Some(pivot) => format!("{}.{}", pivot.table, pivot.foreign_key),
            None => definition.foreign_key.qualified(&definition.related_table),
        }
    }

    fn group_key(&self, definition: &RelationDefinition) -> GroupKey {
        match &definition.pivot {
            Some(pivot) => GroupKey::Extra(format!("pivot_{}", pivot.foreign_key)),
            None => GroupKey::Attribute(definition.foreign_key.clone()),
        }
    }
}
