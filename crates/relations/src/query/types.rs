//! Query Builder Types - clauses held by a `QueryBuilder`

use serde::Serialize;
use serde_json::Value;

/// Binary comparison in a WHERE condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    Gt,
    Lt,
    Like,
}

impl Comparison {
    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Like => "LIKE",
        }
    }
}

/// One WHERE condition; conditions are joined with AND
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        comparison: Comparison,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    Null {
        column: String,
        negated: bool,
    },
    /// Inserted verbatim
    Raw(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// `{kind} {table} ON {left} = {right}`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Statement {
    #[default]
    Select,
    Insert,
}

/// Compiled SQL together with its positional bindings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// The table named by the INSERT INTO or first FROM clause
    pub(crate) fn target_table(&self) -> Option<&str> {
        let sql = self.sql.as_str();
        let rest = match sql.strip_prefix("INSERT INTO ") {
            Some(rest) => rest,
            None => &sql[sql.find(" FROM ")? + " FROM ".len()..],
        };
        rest.split_whitespace().next()
    }
}
