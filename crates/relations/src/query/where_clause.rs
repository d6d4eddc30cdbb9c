//! Query Builder WHERE conditions

use super::builder::QueryBuilder;
use super::types::{Comparison, Condition};
use serde_json::Value;

impl QueryBuilder {
    fn compare(mut self, column: &str, comparison: Comparison, value: Value) -> Self {
        self.conditions.push(Condition::Compare {
            column: column.to_string(),
            comparison,
            value,
        });
        self
    }

    /// `column = value`; a null value renders as `IS NULL`
    pub fn where_eq<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Eq, value.into())
    }

    pub fn where_ne<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Ne, value.into())
    }

    pub fn where_gt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Gt, value.into())
    }

    pub fn where_lt<T: Into<Value>>(self, column: &str, value: T) -> Self {
        self.compare(column, Comparison::Lt, value.into())
    }

    pub fn where_like(self, column: &str, pattern: &str) -> Self {
        self.compare(column, Comparison::Like, Value::String(pattern.to_string()))
    }

    /// `column IN (...)`; an empty list matches nothing
    pub fn where_in<T: Into<Value>>(mut self, column: &str, values: Vec<T>) -> Self {
        self.conditions.push(Condition::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn where_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::Null {
            column: column.to_string(),
            negated: false,
        });
        self
    }

    pub fn where_not_null(mut self, column: &str) -> Self {
        self.conditions.push(Condition::Null {
            column: column.to_string(),
            negated: true,
        });
        self
    }

    /// Raw condition, inserted as written
    pub fn where_raw(mut self, condition: &str) -> Self {
        self.conditions.push(Condition::Raw(condition.to_string()));
        self
    }
}
