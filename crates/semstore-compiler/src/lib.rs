//! Semstore query compiler
//!
//! Lowers pruned [`Description`] trees into backend conditions:
//!
//! ```text
//! Description ──feature gate──► prune ──► ConditionBuilder ──► Condition ──render──► query text
//!                                          ├── sparql::SparqlConditionBuilder (graph patterns)
//!                                          └── sql::SqlConditionBuilder      (join fragments)
//! ```
//!
//! Both backends share the same contract: the caller names the join variable
//! a condition constrains, builders only allocate fresh variables for inner
//! sub-descriptions, and data-level problems (cycles, unsupported
//! comparisons) land in an error log instead of aborting compilation.

pub mod guard;
pub mod sparql;
pub mod sql;

pub use guard::{CircularReferenceGuard, ReferenceMark};
pub use sparql::{Sparql, SparqlCondition};
pub use sql::{Sql, SqlCondition};

use semstore_query::{Description, QueryConfig, QueryStore, SortDirection};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One `ORDER BY` entry of a compiled query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Backend variable (SPARQL) or column expression (SQL).
    pub variable: String,
    pub direction: SortDirection,
}

/// Result of compiling one query.
#[derive(Debug, Clone, Serialize)]
pub struct Compiled<C> {
    pub condition: C,
    /// User-facing problems found while compiling.
    pub errors: Vec<String>,
    /// Query text of every sub-description dropped by the pruner.
    pub pruned: Vec<String>,
    pub order_by: Vec<OrderBy>,
}

/// Compiles one query to completion; instances are not reused.
pub trait ConditionBuilder {
    type Condition;

    /// Compile `description` against the result variable, then add the
    /// ordering data for sort keys the description never reached.
    fn build_root(&mut self, description: &Description) -> Self::Condition;

    fn order_by(&self, condition: &Self::Condition) -> Vec<OrderBy>;

    fn into_errors(self) -> Vec<String>;
}

/// A condition backend.
pub trait Backend {
    type Condition: Clone + fmt::Debug;
    type Builder<'a>: ConditionBuilder<Condition = Self::Condition>;

    fn builder<'a>(store: &'a dyn QueryStore, config: &'a QueryConfig) -> Self::Builder<'a>;

    /// The condition matching nothing.
    fn unsatisfiable() -> Self::Condition;
}

/// Gate, prune and compile `description` for backend `B`.
pub fn compile<B: Backend>(
    description: &Description,
    store: &dyn QueryStore,
    config: &QueryConfig,
) -> Compiled<B::Condition> {
    let disabled = description
        .query_features()
        .missing_from(config.allowed_features);
    if !disabled.is_empty() {
        let message = format!("query uses disabled features: {disabled}");
        tracing::warn!(query = %description, "{message}");
        return Compiled {
            condition: B::unsatisfiable(),
            errors: vec![message],
            pruned: Vec::new(),
            order_by: Vec::new(),
        };
    }

    let outcome = description.prune(config.max_query_size, config.max_query_depth);
    if !outcome.log.is_empty() {
        tracing::debug!(
            dropped = outcome.log.len(),
            max_size = config.max_query_size,
            max_depth = config.max_query_depth,
            "query exceeded its budget"
        );
    }

    let mut builder = B::builder(store, config);
    let condition = builder.build_root(&outcome.description);
    let order_by = builder.order_by(&condition);
    let errors = builder.into_errors();
    Compiled {
        condition,
        errors,
        pruned: outcome.log,
        order_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semstore_query::{EntityRef, MemoryStore, QueryFeatures};

    #[test]
    fn disabled_features_yield_unsatisfiable_condition() {
        let store = MemoryStore::new();
        let config = QueryConfig {
            allowed_features: QueryFeatures::CATEGORY | QueryFeatures::CONJUNCTION,
            ..QueryConfig::default()
        };
        let d = Description::or([
            Description::concept(EntityRef::concept("Rivers")),
            Description::class(EntityRef::category("City")),
        ]);
        let compiled = compile::<Sparql>(&d, &store, &config);
        assert!(compiled.condition.is_false());
        assert_eq!(
            compiled.errors,
            vec!["query uses disabled features: concept, disjunction".to_string()]
        );
    }

    #[test]
    fn pruned_parts_are_reported() {
        let store = MemoryStore::new();
        let config = QueryConfig {
            max_query_size: 1,
            ..QueryConfig::default()
        };
        let d = Description::and([
            Description::namespace(0),
            Description::class(EntityRef::category("City")),
        ]);
        let compiled = compile::<Sql>(&d, &store, &config);
        assert_eq!(compiled.pruned, vec!["[[Category:City]]".to_string()]);
        assert!(compiled.errors.is_empty());
    }

    #[test]
    fn order_by_serializes_with_uppercase_direction() {
        let order = OrderBy {
            variable: "?v1".into(),
            direction: SortDirection::Desc,
        };
        let json = serde_json::to_string(&order).unwrap();
        assert_eq!(json, r#"{"variable":"?v1","direction":"DESC"}"#);
        assert_eq!(serde_json::from_str::<OrderBy>(&json).unwrap(), order);
    }
}
