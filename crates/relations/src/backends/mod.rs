//! Database Backend Abstractions
//!
//! An async connection trait, the named connection manager and the sqlx
//! PostgreSQL implementation.

pub mod core;
pub mod postgres;

pub use core::{Database, DatabaseConnection, QueryClient, Row};
pub use postgres::PostgresConnection;
