//! Model Instance - a hydrated row with its preloaded relations

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::options::QueryOptions;
use super::registry::ModelRegistry;
use super::schema::ModelSchema;
use crate::backends::{Database, Row};
use crate::error::ModelResult;
use crate::loading::Preloader;
use crate::query::QueryBuilder;
use crate::relationships::RelationQueryBuilder;

/// A loaded relation slot
#[derive(Debug, Clone, PartialEq)]
pub enum Preloaded {
    One(Option<Box<ModelInstance>>),
    Many(Vec<ModelInstance>),
}

impl Preloaded {
    pub fn as_one(&self) -> Option<&ModelInstance> {
        match self {
            Preloaded::One(instance) => instance.as_deref(),
            Preloaded::Many(_) => None,
        }
    }

    pub fn as_many(&self) -> &[ModelInstance] {
        match self {
            Preloaded::Many(instances) => instances,
            Preloaded::One(_) => &[],
        }
    }

    /// Number of loaded instances
    pub fn len(&self) -> usize {
        match self {
            Preloaded::One(instance) => usize::from(instance.is_some()),
            Preloaded::Many(instances) => instances.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &ModelInstance> + '_> {
        match self {
            Preloaded::One(instance) => Box::new(instance.as_deref().into_iter()),
            Preloaded::Many(instances) => Box::new(instances.iter()),
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            Preloaded::One(Some(instance)) => instance.to_json(),
            Preloaded::One(None) => Value::Null,
            Preloaded::Many(instances) => Value::Array(instances.iter().map(ModelInstance::to_json).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInstance {
    model: String,
    attributes: Map<String, Value>,
    extras: Map<String, Value>,
    preloaded: BTreeMap<String, Preloaded>,
    options: QueryOptions,
    persisted: bool,
}

impl ModelInstance {
    /// A new, unsaved instance of a model
    pub fn new(schema: &ModelSchema) -> Self {
        Self {
            model: schema.name().to_string(),
            attributes: Map::new(),
            extras: Map::new(),
            preloaded: BTreeMap::new(),
            options: QueryOptions::default(),
            persisted: false,
        }
    }

    /// A new, unsaved instance from a JSON object keyed by attribute name
    pub fn from_attributes(schema: &ModelSchema, attributes: Value) -> Self {
        let mut instance = Self::new(schema);
        if let Value::Object(map) = attributes {
            instance.attributes = map;
        }
        instance
    }

    /// Turn a fetched row into a persisted instance.
    ///
    /// Declared columns become attributes; every other selected column is kept
    /// as an extra.
    pub fn hydrate(schema: &ModelSchema, row: Row, options: &QueryOptions) -> Self {
        let mut instance = Self::new(schema);
        for (column, value) in row {
            match schema.attribute_for(&column) {
                Some(attribute) => {
                    instance.attributes.insert(attribute.to_string(), value);
                }
                None => {
                    instance.extras.insert(column, value);
                }
            }
        }
        instance.options = options.clone();
        instance.persisted = true;
        instance
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Attribute value; `None` when the attribute was never loaded
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Selected value that is not a declared column (`pivot_*`, `through_*`)
    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extras.get(name)
    }

    pub fn extras(&self) -> &Map<String, Value> {
        &self.extras
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: QueryOptions) {
        self.options = options;
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    pub fn related(&self, name: &str) -> Option<&Preloaded> {
        self.preloaded.get(name)
    }

    pub fn set_related(&mut self, name: &str, value: Preloaded) {
        self.preloaded.insert(name.to_string(), value);
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.preloaded.contains_key(name)
    }

    /// Names of the loaded relation slots
    pub fn loaded_relations(&self) -> impl Iterator<Item = &str> {
        self.preloaded.keys().map(String::as_str)
    }

    /// Attributes and loaded relations as one JSON object
    pub fn to_json(&self) -> Value {
        let mut object = self.attributes.clone();
        for (name, preloaded) in &self.preloaded {
            object.insert(name.clone(), preloaded.to_json());
        }
        Value::Object(object)
    }

    /// Convert into a typed struct through serde
    pub fn deserialize<T: DeserializeOwned>(&self) -> ModelResult<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }

    /// INSERT of every declared attribute that is set
    pub fn insert_query(&self, schema: &ModelSchema) -> QueryBuilder {
        schema
            .columns()
            .iter()
            .filter_map(|c| self.attributes.get(&c.attribute).map(|v| (c.column.as_str(), v)))
            .fold(QueryBuilder::new().insert_into(schema.table()), |query, (column, value)| {
                query.set(column, value.clone())
            })
    }

    /// Query over one relation of this instance, scoped to its rows
    pub fn related_query(
        &self,
        registry: &ModelRegistry,
        relation: &str,
        db: &Database,
    ) -> ModelResult<RelationQueryBuilder> {
        let schema = registry.get(&self.model)?;
        let client = db.client(&self.options)?;
        schema
            .require_relation(relation)?
            .contract()
            .get_query(&schema, registry, self, client)
    }

    /// Load a (dotted) relation path onto this instance
    pub async fn load(&mut self, registry: &ModelRegistry, path: &str, db: &Database) -> ModelResult<()> {
        let schema = registry.get(&self.model)?;
        Preloader::new()
            .preload(path)
            .run(&schema, registry, std::slice::from_mut(self), db)
            .await?;
        Ok(())
    }
}
