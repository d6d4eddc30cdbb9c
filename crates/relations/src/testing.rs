//! In-memory connection for tests
//!
//! `RecordingConnection` answers every SELECT with the canned rows of the
//! queried table and records each statement it receives. Clones made with
//! [`RecordingConnection::named`] share the same rows and log, so a single
//! recorder can stand behind several connection names.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::backends::{DatabaseConnection, Row};
use crate::error::{ModelError, ModelResult};
use crate::query::SqlQuery;

/// A statement received by a recording connection
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    pub connection: String,
    pub sql: String,
    pub bindings: Vec<Value>,
}

#[derive(Default)]
struct RecordingState {
    rows: DashMap<String, Vec<Row>>,
    failures: DashMap<String, String>,
    log: Mutex<Vec<RecordedQuery>>,
}

/// In-memory `DatabaseConnection` that records every query
#[derive(Clone)]
pub struct RecordingConnection {
    name: String,
    state: Arc<RecordingState>,
}

impl RecordingConnection {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(RecordingState::default()),
        }
    }

    /// A handle under another connection name sharing rows and log
    pub fn named(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::clone(&self.state),
        }
    }

    /// Canned rows returned for every SELECT on `table`
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.set_rows(table, rows);
        self
    }

    pub fn set_rows(&self, table: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|row| match row {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.state.rows.insert(table.to_string(), rows);
    }

    /// Make every statement on `table` fail with a database error
    pub fn fail_on(&self, table: &str, message: &str) {
        self.state.failures.insert(table.to_string(), message.to_string());
    }

    /// Every statement received so far, in order
    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.log().clone()
    }

    /// Statements whose target table is `table`
    pub fn queries_for(&self, table: &str) -> Vec<RecordedQuery> {
        self.log()
            .iter()
            .filter(|q| SqlQuery::new(q.sql.clone(), Vec::new()).target_table() == Some(table))
            .cloned()
            .collect()
    }

    pub fn query_count(&self) -> usize {
        self.log().len()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    fn log(&self) -> MutexGuard<'_, Vec<RecordedQuery>> {
        self.state.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, query: &SqlQuery) -> ModelResult<Option<String>> {
        self.log().push(RecordedQuery {
            connection: self.name.clone(),
            sql: query.sql.clone(),
            bindings: query.bindings.clone(),
        });

        let table = query.target_table().map(str::to_string);
        if let Some(table) = &table {
            if let Some(message) = self.state.failures.get(table) {
                return Err(ModelError::Database(message.value().clone()));
            }
        }
        Ok(table)
    }
}

#[async_trait]
impl DatabaseConnection for RecordingConnection {
    async fn fetch_all(&self, query: &SqlQuery) -> ModelResult<Vec<Row>> {
        let rows = match self.record(query)? {
            Some(table) => self
                .state
                .rows
                .get(&table)
                .map(|rows| rows.value().clone())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        Ok(rows)
    }

    async fn execute(&self, query: &SqlQuery) -> ModelResult<u64> {
        self.record(query)?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_answers_with_rows_of_target_table() {
        let connection = RecordingConnection::new("primary")
            .with_rows("posts", vec![json!({"id": 1, "user_id": 1})]);

        let rows = connection
            .fetch_all(&SqlQuery::new("SELECT * FROM posts WHERE posts.user_id = $1", vec![json!(1)]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        let empty = connection
            .fetch_all(&SqlQuery::new("SELECT * FROM comments", vec![]))
            .await
            .unwrap();
        assert!(empty.is_empty());
        assert_eq!(connection.query_count(), 2);
    }

    #[tokio::test]
    async fn test_named_handles_share_the_log() {
        let primary = RecordingConnection::new("primary");
        let secondary = primary.named("secondary");

        secondary
            .fetch_all(&SqlQuery::new("SELECT * FROM users", vec![]))
            .await
            .unwrap();

        let queries = primary.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].connection, "secondary");
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let connection = RecordingConnection::new("primary");
        connection.fail_on("posts", "connection reset");

        let result = connection
            .fetch_all(&SqlQuery::new("SELECT * FROM posts", vec![]))
            .await;
        assert_eq!(result, Err(ModelError::Database("connection reset".to_string())));
        assert_eq!(connection.queries_for("posts").len(), 1);
    }
}
