//! Relationship Traits - the capability contract every relation variant implements

use std::fmt;

use tracing::debug;

use super::keys::{batch_key_values, distinct_bindings, parent_key_value};
use super::metadata::{GroupKey, KeyPair, RelationDefinition, RelationType};
use super::query_builder::{RelationQueryBuilder, RelationQueryMode};
use crate::backends::QueryClient;
use crate::error::ModelResult;
use crate::model::{ModelInstance, ModelRegistry, ModelSchema};
use crate::query::QueryBuilder;
use crate::value::KeyValue;

/// Core relation contract.
///
/// Variants resolve their keys in [`RelationContract::boot`] and describe
/// their query shape through the hook methods. The scoped builders are
/// derived from those hooks and shared by every variant.
pub trait RelationContract: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn relation_type(&self) -> RelationType;

    /// Name of the related model in the registry
    fn related_model(&self) -> &str;

    /// Resolve and cache the relation's keys. Idempotent.
    fn boot(&self, owner: &ModelSchema, registry: &ModelRegistry) -> ModelResult<&RelationDefinition>;

    fn is_booted(&self) -> bool;

    /// Joins and selects that define the universe of related rows
    fn base_query(&self, definition: &RelationDefinition) -> QueryBuilder {
        QueryBuilder::table(&definition.related_table)
    }

    /// Parent attribute whose value scopes the query
    fn parent_key<'d>(&self, definition: &'d RelationDefinition) -> &'d KeyPair {
        &definition.local_key
    }

    /// Qualified column compared against the parent key values
    fn scope_column(&self, definition: &RelationDefinition) -> String {
        definition.foreign_key.qualified(&definition.related_table)
    }

    /// Where a related row carries its parent's key value
    fn group_key(&self, definition: &RelationDefinition) -> GroupKey {
        GroupKey::Attribute(definition.foreign_key.clone())
    }

    /// Builder pre-filtered to one parent's related rows
    fn get_query(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        parent: &ModelInstance,
        client: QueryClient,
    ) -> ModelResult<RelationQueryBuilder> {
        let definition = self.boot(owner, registry)?;
        let related = registry.get(&definition.related_model)?;
        let key = parent_key_value(parent, self.name(), self.parent_key(definition))?;

        let query = scope_to(self.base_query(definition), &self.scope_column(definition), key);
        debug!(relation = self.name(), sql = %query.to_sql(), "relation query built");

        Ok(RelationQueryBuilder::new(
            self.name(),
            related,
            query,
            client,
            RelationQueryMode::ScopedToOne,
            None,
        ))
    }

    /// Builder pre-filtered to the related rows of a batch of parents
    fn get_eager_query(
        &self,
        owner: &ModelSchema,
        registry: &ModelRegistry,
        parents: &[ModelInstance],
        client: QueryClient,
    ) -> ModelResult<RelationQueryBuilder> {
        let definition = self.boot(owner, registry)?;
        let related = registry.get(&definition.related_model)?;
        let keys = batch_key_values(parents, self.name(), self.parent_key(definition))?;

        let query = self
            .base_query(definition)
            .where_in(&self.scope_column(definition), distinct_bindings(&keys));
        debug!(relation = self.name(), parents = parents.len(), sql = %query.to_sql(), "eager relation query built");

        Ok(RelationQueryBuilder::new(
            self.name(),
            related,
            query,
            client,
            RelationQueryMode::ScopedToMany,
            Some(self.group_key(definition)),
        ))
    }
}

/// A null parent key matches no rows
fn scope_to(query: QueryBuilder, column: &str, key: Option<KeyValue>) -> QueryBuilder {
    match key {
        Some(key) => query.where_eq(column, key),
        None => query.where_in::<KeyValue>(column, Vec::new()),
    }
}
