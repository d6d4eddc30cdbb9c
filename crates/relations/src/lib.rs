//! # elif-relations: Relation Mapping for elif.rs
//!
//! Declares relations between dynamic models (has-one, has-many,
//! belongs-to, many-to-many and has-many-through), builds the SQL that
//! scopes them to one parent or a batch of parents, and preloads dotted
//! relation trees depth by depth with one query per relation per depth.
//!
//! Every query runs on the connection named by the [`QueryOptions`] of the
//! root query, including the queries of nested preloads.

pub mod backends;
pub mod config;
pub mod error;
pub mod loading;
pub mod model;
pub mod naming;
pub mod query;
pub mod relationships;
pub mod security;
pub mod value;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export core types
pub use backends::{Database, DatabaseConnection, PostgresConnection, QueryClient, Row};
pub use config::{PreloadConfig, RelationsConfig};
pub use error::{ModelError, ModelResult};
pub use loading::{PreloadNode, PreloadStats, PreloadTree, Preloader};
pub use model::{ModelInstance, ModelQuery, ModelRegistry, ModelSchema, ModelSchemaBuilder, Preloaded, QueryOptions};
pub use naming::{CamelCaseNamingStrategy, NamingStrategy};
pub use query::{QueryBuilder, SqlQuery};
pub use relationships::{
    BelongsTo, GroupKey, HasMany, HasManyThrough, HasOne, KeyPair, ManyToMany, Relation, RelationContract,
    RelationDefinition, RelationQueryBuilder, RelationType,
};
pub use value::KeyValue;
