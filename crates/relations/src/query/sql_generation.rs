//! Query Builder SQL generation
//!
//! One renderer serves both outputs. Values go through a `bind` callback that
//! either records a positional binding or inlines a literal.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::{Comparison, Condition, SqlQuery, Statement};

impl QueryBuilder {
    /// SQL with `$n` placeholders and the bindings in order
    pub fn to_sql_with_params(&self) -> SqlQuery {
        let mut bindings = Vec::new();
        let sql = self.render(&mut |value: &Value| {
            bindings.push(value.clone());
            format!("${}", bindings.len())
        });
        SqlQuery::new(sql, bindings)
    }

    /// SQL with literals inlined, for logging and comparisons
    pub fn to_sql(&self) -> String {
        self.render(&mut format_value)
    }

    fn render(&self, bind: &mut dyn FnMut(&Value) -> String) -> String {
        match self.statement {
            Statement::Select => self.render_select(bind),
            Statement::Insert => self.render_insert(bind),
        }
    }

    fn render_select(&self, bind: &mut dyn FnMut(&Value) -> String) -> String {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.join(", ")
        };
        let mut sql = format!("SELECT {}", fields);

        if let Some(table) = &self.table {
            sql.push_str(" FROM ");
            sql.push_str(table);
        }

        for join in &self.joins {
            sql.push_str(&format!(
                " {} {} ON {} = {}",
                join.kind.as_sql(),
                join.table,
                join.left,
                join.right
            ));
        }

        if !self.conditions.is_empty() {
            let conditions: Vec<String> = self
                .conditions
                .iter()
                .map(|condition| render_condition(condition, bind))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if !self.sorts.is_empty() {
            let sorts: Vec<String> = self
                .sorts
                .iter()
                .map(|sort| format!("{} {}", sort.column, if sort.descending { "DESC" } else { "ASC" }))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&sorts.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        sql
    }

    fn render_insert(&self, bind: &mut dyn FnMut(&Value) -> String) -> String {
        let table = self.table.as_deref().unwrap_or_default();
        if self.values.is_empty() {
            return format!("INSERT INTO {} DEFAULT VALUES", table);
        }

        let columns: Vec<&str> = self.values.iter().map(|(column, _)| column.as_str()).collect();
        let values: Vec<String> = self
            .values
            .iter()
            .map(|(_, value)| match value {
                Value::Null => "NULL".to_string(),
                value => bind(value),
            })
            .collect();
        format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), values.join(", "))
    }
}

fn render_condition(condition: &Condition, bind: &mut dyn FnMut(&Value) -> String) -> String {
    match condition {
        Condition::Raw(raw) => format!("({})", raw),
        Condition::Null { column, negated: false } => format!("{} IS NULL", column),
        Condition::Null { column, negated: true } => format!("{} IS NOT NULL", column),
        Condition::In { values, .. } if values.is_empty() => "1 = 0".to_string(),
        Condition::In { column, values } => {
            let values: Vec<String> = values.iter().map(|value| bind(value)).collect();
            format!("{} IN ({})", column, values.join(", "))
        }
        Condition::Compare {
            column,
            comparison: Comparison::Eq,
            value: Value::Null,
        } => format!("{} IS NULL", column),
        Condition::Compare {
            column,
            comparison: Comparison::Ne,
            value: Value::Null,
        } => format!("{} IS NOT NULL", column),
        Condition::Compare {
            column,
            comparison,
            value,
        } => format!("{} {} {}", column, comparison.as_sql(), bind(value)),
    }
}

/// Inline a value as a SQL literal
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "NULL".to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_select_defaults_to_star() {
        let query = QueryBuilder::table("posts").where_eq("posts.user_id", 1);
        assert_eq!(query.to_sql(), "SELECT * FROM posts WHERE posts.user_id = 1");
    }

    #[test]
    fn test_select_with_join_and_params() {
        let query = QueryBuilder::table("posts")
            .select("posts.*, users.country_id AS through_country_id")
            .join("users", "users.id", "posts.user_id")
            .where_in("users.country_id", vec![1, 2])
            .order_by("posts.id");

        let compiled = query.to_sql_with_params();
        assert_eq!(
            compiled.sql,
            "SELECT posts.*, users.country_id AS through_country_id FROM posts \
             INNER JOIN users ON users.id = posts.user_id \
             WHERE users.country_id IN ($1, $2) ORDER BY posts.id ASC"
        );
        assert_eq!(compiled.bindings, vec![json!(1), json!(2)]);
        assert_eq!(compiled.target_table(), Some("posts"));
    }

    #[test]
    fn test_empty_in_never_matches() {
        let query = QueryBuilder::table("posts").where_in::<i64>("posts.user_id", vec![]);
        assert_eq!(query.to_sql(), "SELECT * FROM posts WHERE 1 = 0");
        assert!(query.to_sql_with_params().bindings.is_empty());
    }

    #[test]
    fn test_null_comparisons() {
        let query = QueryBuilder::table("posts")
            .where_eq("user_id", Value::Null)
            .where_not_null("title")
            .left_join("users", "users.id", "posts.user_id");
        assert_eq!(
            query.to_sql(),
            "SELECT * FROM posts LEFT JOIN users ON users.id = posts.user_id \
             WHERE user_id IS NULL AND title IS NOT NULL"
        );
    }

    #[test]
    fn test_range_and_raw_conditions() {
        let compiled = QueryBuilder::table("posts")
            .where_gt("id", 10)
            .where_lt("id", 20)
            .where_raw("published = true")
            .where_null("deleted_at")
            .to_sql_with_params();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM posts WHERE id > $1 AND id < $2 AND (published = true) AND deleted_at IS NULL"
        );
        assert_eq!(compiled.bindings, vec![json!(10), json!(20)]);
    }

    #[test]
    fn test_raw_conditions_are_grouped() {
        let query = QueryBuilder::table("posts")
            .where_eq("posts.user_id", 1)
            .where_raw("title = 'x' OR 1 = 1");
        assert_eq!(
            query.to_sql(),
            "SELECT * FROM posts WHERE posts.user_id = 1 AND (title = 'x' OR 1 = 1)"
        );
    }

    #[test]
    fn test_not_equal_null_renders_is_not_null() {
        let query = QueryBuilder::table("posts").where_ne("deleted_at", Value::Null);
        assert_eq!(query.to_sql(), "SELECT * FROM posts WHERE deleted_at IS NOT NULL");
        assert!(query.to_sql_with_params().bindings.is_empty());

        let query = QueryBuilder::table("posts").where_gt("score", Value::Null);
        assert_eq!(query.to_sql(), "SELECT * FROM posts WHERE score > NULL");
    }

    #[test]
    fn test_string_values_are_escaped() {
        let query = QueryBuilder::table("users").where_eq("name", "O'Brien");
        assert_eq!(query.to_sql(), "SELECT * FROM users WHERE name = 'O''Brien'");
    }

    #[test]
    fn test_insert_with_params() {
        let compiled = QueryBuilder::new()
            .insert_into("posts")
            .set("title", "Hello")
            .set("user_id", 7)
            .set("body", Value::Null)
            .to_sql_with_params();

        assert_eq!(
            compiled.sql,
            "INSERT INTO posts (title, user_id, body) VALUES ($1, $2, NULL)"
        );
        assert_eq!(compiled.bindings, vec![json!("Hello"), json!(7)]);
        assert_eq!(compiled.target_table(), Some("posts"));
    }

    #[test]
    fn test_limit_and_offset() {
        let query = QueryBuilder::table("comments").order_by_desc("id").limit(10).offset(20);
        assert_eq!(query.to_sql(), "SELECT * FROM comments ORDER BY id DESC LIMIT 10 OFFSET 20");
    }

    #[test]
    fn test_selects_column() {
        let query = QueryBuilder::table("posts");
        assert!(query.selects_column("posts", "user_id"));

        let narrowed = QueryBuilder::table("posts").select("title");
        assert!(!narrowed.selects_column("posts", "user_id"));

        let qualified = QueryBuilder::table("posts").select("posts.user_id, title");
        assert!(qualified.selects_column("posts", "user_id"));

        let aliased = QueryBuilder::table("posts").select("users.country_id AS through_country_id");
        assert!(aliased.selects_column("posts", "through_country_id"));
    }
}
