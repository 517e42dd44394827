//! SQL condition algebra.
//!
//! A condition constrains a column expression (the join variable). `Where`
//! conditions carry inner-joined tables plus the predicates linking them;
//! they are flattened into the enclosing query, or wrapped in `EXISTS` where
//! flattening would change the meaning (disjunction, negation).

use semstore_query::data::format_number;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A value in the relational store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    /// Object id of an entity.
    Id(u64),
    Number(f64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Id(id) => write!(f, "{id}"),
            SqlValue::Number(n) => f.write_str(&format_number(*n)),
            SqlValue::Text(s) => f.write_str(&quote(s)),
            SqlValue::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

/// Quote `text` as an SQL string literal.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Translate a `*`/`?` wildcard pattern into a `LIKE` pattern using `\` as
/// escape character. Existing `\`, `%` and `_` are escaped first.
pub fn like_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '*' => out.push('%'),
            '?' => out.push('_'),
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SqlKind {
    True,
    False,
    /// Inner joins (`table AS alias`) and the predicates over them.
    Where {
        joins: Vec<String>,
        predicates: Vec<String>,
    },
    /// A boolean expression over columns already in scope.
    Filter { expr: String },
    /// The join variable equals `value`; `joins`/`predicates` may add
    /// further conditions.
    Singleton {
        value: SqlValue,
        joins: Vec<String>,
        predicates: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlCondition {
    pub kind: SqlKind,
    /// Tables the condition reads.
    pub join_tables: BTreeSet<String>,
    /// `LEFT JOIN` clauses keyed by the alias they introduce; they never
    /// remove rows.
    pub weak_joins: BTreeMap<String, String>,
    /// Column to order the join variable by, when ordering was requested.
    pub order_by_column: Option<String>,
    /// Sort key to order column, for every sort key reached so far.
    pub order_columns: BTreeMap<String, String>,
}

impl SqlCondition {
    fn with_kind(kind: SqlKind) -> Self {
        Self {
            kind,
            join_tables: BTreeSet::new(),
            weak_joins: BTreeMap::new(),
            order_by_column: None,
            order_columns: BTreeMap::new(),
        }
    }

    pub fn new_true() -> Self {
        Self::with_kind(SqlKind::True)
    }

    pub fn new_false() -> Self {
        Self::with_kind(SqlKind::False)
    }

    pub fn new_where(joins: Vec<String>, predicates: Vec<String>) -> Self {
        Self::with_kind(SqlKind::Where { joins, predicates })
    }

    pub fn new_filter(expr: impl Into<String>) -> Self {
        Self::with_kind(SqlKind::Filter { expr: expr.into() })
    }

    pub fn new_singleton(value: SqlValue) -> Self {
        Self::with_kind(SqlKind::Singleton {
            value,
            joins: Vec::new(),
            predicates: Vec::new(),
        })
    }

    pub fn is_true(&self) -> bool {
        matches!(self.kind, SqlKind::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self.kind, SqlKind::False)
    }

    /// The condition as one boolean expression on `join_variable`, with its
    /// joins folded into an `EXISTS` subquery.
    pub fn to_predicate(&self, join_variable: &str) -> String {
        match &self.kind {
            SqlKind::True => "1 = 1".to_string(),
            SqlKind::False => "1 = 0".to_string(),
            SqlKind::Filter { expr } => expr.clone(),
            SqlKind::Where { joins, predicates } => exists(joins, predicates),
            SqlKind::Singleton {
                value,
                joins,
                predicates,
            } => {
                let mut predicates = predicates.clone();
                predicates.push(format!("{join_variable} = {value}"));
                exists(joins, &predicates)
            }
        }
    }

    pub(crate) fn absorb_dependencies(&mut self, other: &SqlCondition) {
        self.join_tables.extend(other.join_tables.iter().cloned());
        self.weak_joins
            .extend(other.weak_joins.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

fn exists(joins: &[String], predicates: &[String]) -> String {
    let predicate = if predicates.is_empty() {
        "1 = 1".to_string()
    } else {
        predicates.join(" AND ")
    };
    if joins.is_empty() {
        predicate
    } else {
        format!("EXISTS (SELECT 1 FROM {} WHERE {predicate})", joins.join(", "))
    }
}
