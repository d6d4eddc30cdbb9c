//! Relationships Module - relation variants, key resolution and relation queries

pub mod traits;
pub mod has_one;
pub mod has_many;
pub mod belongs_to;
pub mod many_to_many;
pub mod has_many_through;
pub mod relation;
pub mod options;

pub mod metadata;
pub mod keys;
pub mod query_builder;
pub mod grouper;

#[cfg(test)]
mod many_to_many_tests;
#[cfg(test)]
mod has_many_through_tests;

// Re-export main types
pub use traits::RelationContract;
pub use has_one::HasOne;
pub use has_many::HasMany;
pub use belongs_to::BelongsTo;
pub use many_to_many::ManyToMany;
pub use has_many_through::HasManyThrough;
pub use relation::Relation;
pub use options::*;

pub use metadata::*;
pub use query_builder::{RelationQueryBuilder, RelationQueryMode, RelationScope};
pub use grouper::GroupedResult;
