//! Triple-store backend: descriptions to SPARQL graph patterns.
//!
//! Entities live under the `wiki:` prefix, properties under `property:` and
//! the store vocabulary (namespaces, sort keys) under `swivt:`. The root join
//! variable is `?result`; inner variables are `?v1`, `?v2`, ...

mod builder;
mod class;
mod condition;
mod junction;
mod property;
mod render;
mod term;
mod value;

pub use builder::{SparqlConditionBuilder, RESULT_VARIABLE};
pub use condition::{SparqlCondition, SparqlKind, FALSE_PATTERN};
pub use junction::rename_variable;
pub use render::render_select;
pub use term::{encode_local_name, like_pattern_to_regex, string_literal, Vocabulary};

use crate::Backend;
use semstore_query::{QueryConfig, QueryStore};

/// The SPARQL backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sparql;

impl Backend for Sparql {
    type Condition = SparqlCondition;
    type Builder<'a> = SparqlConditionBuilder<'a>;

    fn builder<'a>(store: &'a dyn QueryStore, config: &'a QueryConfig) -> Self::Builder<'a> {
        SparqlConditionBuilder::new(store, config)
    }

    fn unsatisfiable() -> SparqlCondition {
        SparqlCondition::new_false()
    }
}
