//! Query Builder INSERT statements

use super::builder::QueryBuilder;
use super::types::Statement;
use serde_json::Value;

impl QueryBuilder {
    /// Turn the builder into `INSERT INTO table`
    pub fn insert_into(mut self, table: &str) -> Self {
        self.statement = Statement::Insert;
        self.table = Some(table.to_string());
        self
    }

    /// Column value for the INSERT, in call order
    pub fn set<T: Into<Value>>(mut self, column: &str, value: T) -> Self {
        self.values.push((column.to_string(), value.into()));
        self
    }
}
