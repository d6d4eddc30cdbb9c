//! Query Builder - fluent SELECT and INSERT construction
//!
//! Every method takes the builder by value and returns it, so relation
//! queries can be refined by any number of chained calls. Clauses only ever
//! accumulate; nothing removes a clause once it is added.

use super::types::{Condition, Join, JoinKind, Sort, Statement};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    pub(crate) statement: Statement,
    pub(crate) table: Option<String>,
    pub(crate) fields: Vec<String>,
    pub(crate) joins: Vec<Join>,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) sorts: Vec<Sort>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
    pub(crate) values: Vec<(String, Value)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A SELECT over `table`
    pub fn table(table: &str) -> Self {
        Self::new().from(table)
    }

    pub fn from(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// Add comma separated SELECT fields; no fields means `*`
    pub fn select(mut self, fields: &str) -> Self {
        self.fields.extend(
            fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        );
        self
    }

    /// Add `INNER JOIN table ON left = right`
    pub fn join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinKind::Inner, table, left, right)
    }

    /// Add `LEFT JOIN table ON left = right`
    pub fn left_join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinKind::Left, table, left, right)
    }

    fn push_join(mut self, kind: JoinKind, table: &str, left: &str, right: &str) -> Self {
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        });
        self
    }

    pub fn order_by(self, column: &str) -> Self {
        self.push_sort(column, false)
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.push_sort(column, true)
    }

    fn push_sort(mut self, column: &str, descending: bool) -> Self {
        self.sorts.push(Sort {
            column: column.to_string(),
            descending,
        });
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn offset(mut self, count: i64) -> Self {
        self.offset = Some(count);
        self
    }

    /// Whether a column would be present in this query's result rows.
    ///
    /// `column` is the bare output column name. It is present when nothing is
    /// selected explicitly, or when a field is `*`, `{table}.*`, the column,
    /// its qualified form or an alias to it.
    pub fn selects_column(&self, table: &str, column: &str) -> bool {
        if self.fields.is_empty() {
            return true;
        }

        let wildcard = format!("{}.*", table);
        let qualified = format!("{}.{}", table, column);
        let alias = format!(" as {}", column.to_lowercase());

        self.fields.iter().any(|field| {
            field == "*"
                || *field == wildcard
                || field == column
                || *field == qualified
                || field.to_lowercase().ends_with(&alias)
        })
    }
}
