//! Model System - dynamic model schemas and hydrated instances
//!
//! - `schema`: declared columns and relations, built once per model
//! - `registry`: resolves related model references by name
//! - `instance`: hydrated rows with their preloaded relation slots
//! - `query`: root queries that hydrate and preload
//! - `options`: ambient query options

pub mod instance;
pub mod options;
pub mod query;
pub mod registry;
pub mod schema;

pub use instance::{ModelInstance, Preloaded};
pub use options::QueryOptions;
pub use query::ModelQuery;
pub use registry::ModelRegistry;
pub use schema::{ColumnDefinition, ModelSchema, ModelSchemaBuilder};
