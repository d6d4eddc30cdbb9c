//! Relationship Metadata - resolved key sets produced when a relation boots

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::model::ModelInstance;

/// Defines the type of relationship between models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationType {
    /// One-to-one relationship (hasOne)
    HasOne,
    /// One-to-many relationship (hasMany)
    HasMany,
    /// Many-to-one relationship (belongsTo)
    BelongsTo,
    /// Many-to-many relationship through a pivot table
    ManyToMany,
    /// One-to-many relationship across an intermediate model
    HasManyThrough,
}

impl RelationType {
    /// Returns true if this relationship returns a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany | Self::HasManyThrough)
    }

    /// Returns true if this relationship requires a pivot table
    pub fn requires_pivot(self) -> bool {
        matches!(self, Self::ManyToMany)
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationType::HasOne => "hasOne",
            RelationType::HasMany => "hasMany",
            RelationType::BelongsTo => "belongsTo",
            RelationType::ManyToMany => "manyToMany",
            RelationType::HasManyThrough => "hasManyThrough",
        };
        write!(f, "{}", name)
    }
}

/// An attribute name together with its storage column (the adapter key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyPair {
    pub attribute: String,
    pub column: String,
}

impl KeyPair {
    pub fn new(attribute: &str, column: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            column: column.to_string(),
        }
    }

    /// `table.column`
    pub fn qualified(&self, table: &str) -> String {
        format!("{}.{}", table, self.column)
    }
}

/// Pivot table keys of a many-to-many relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotDefinition {
    pub table: String,
    /// Pivot column referencing the declaring model
    pub foreign_key: String,
    /// Pivot column referencing the related model
    pub related_foreign_key: String,
    /// Key on the related model referenced by `related_foreign_key`
    pub related_key: KeyPair,
}

/// Intermediate model keys of a has-many-through relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThroughDefinition {
    pub through_model: String,
    pub through_table: String,
    /// The through model's own key (the via key)
    pub through_local_key: KeyPair,
    /// Column on the related model referencing the through model (the via foreign key)
    pub through_foreign_key: KeyPair,
}

/// Fully resolved relation, immutable once booted.
///
/// `local_key` and `foreign_key` keep the naming of the relation kind:
/// for `BelongsTo` the foreign key lives on the declaring model, and for
/// `HasManyThrough` it lives on the through model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationDefinition {
    pub relation_name: String,
    pub relation_type: RelationType,
    pub related_model: String,
    pub related_table: String,
    pub local_key: KeyPair,
    pub foreign_key: KeyPair,
    pub pivot: Option<PivotDefinition>,
    pub through: Option<ThroughDefinition>,
}

/// Where a fetched related row carries the value it is grouped by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    /// A declared attribute of the related model
    Attribute(KeyPair),
    /// A selected alias that is not a model attribute (`pivot_*`, `through_*`)
    Extra(String),
}

impl GroupKey {
    /// Name of the column in the result rows
    pub fn output_column(&self) -> &str {
        match self {
            GroupKey::Attribute(key) => &key.column,
            GroupKey::Extra(alias) => alias,
        }
    }

    /// Value on a hydrated instance; `None` when the column was not selected
    pub fn value_of<'a>(&self, instance: &'a ModelInstance) -> Option<&'a Value> {
        match self {
            GroupKey::Attribute(key) => instance.attribute(&key.attribute),
            GroupKey::Extra(alias) => instance.extra(alias),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_type_properties() {
        assert!(RelationType::HasMany.is_collection());
        assert!(RelationType::HasManyThrough.is_collection());
        assert!(!RelationType::BelongsTo.is_collection());
        assert!(RelationType::ManyToMany.requires_pivot());
        assert_eq!(RelationType::HasManyThrough.to_string(), "hasManyThrough");
    }

    #[test]
    fn test_key_pair_qualified() {
        let key = KeyPair::new("userId", "user_id");
        assert_eq!(key.qualified("posts"), "posts.user_id");
    }

    #[test]
    fn test_group_key_output_column() {
        assert_eq!(GroupKey::Attribute(KeyPair::new("userId", "user_id")).output_column(), "user_id");
        assert_eq!(GroupKey::Extra("pivot_user_id".to_string()).output_column(), "pivot_user_id");
    }
}
