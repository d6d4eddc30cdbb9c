//! Query Builder Module - fluent SQL builder used by models and relations

pub mod builder;
pub mod dml;
pub mod sql_generation;
pub mod types;
pub mod where_clause;

pub use builder::QueryBuilder;
pub use types::{Comparison, Condition, Join, JoinKind, Sort, SqlQuery, Statement};
