//! Relational backend: descriptions to SQL join fragments.
//!
//! The schema is the object id table (`smw_object_ids`), the class
//! membership table (`smw_fpt_inst`) and one property table per value kind
//! (`smw_di_wikipage`, `smw_di_blob`, `smw_di_number`, `smw_di_bool`,
//! `smw_di_uri`), each with `s_id`, `p_id` and a value column.

mod builder;
mod condition;
mod junction;
mod leaf;
mod render;

pub use builder::{property_table, value_column, SqlConditionBuilder, INSTANCE_TABLE, OBJECT_IDS, ROOT_COLUMN};
pub use condition::{like_pattern, quote, SqlCondition, SqlKind, SqlValue};
pub use render::render_select;

use crate::Backend;
use semstore_query::{QueryConfig, QueryStore};

/// The SQL backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sql;

impl Backend for Sql {
    type Condition = SqlCondition;
    type Builder<'a> = SqlConditionBuilder<'a>;

    fn builder<'a>(store: &'a dyn QueryStore, config: &'a QueryConfig) -> Self::Builder<'a> {
        SqlConditionBuilder::new(store, config)
    }

    fn unsatisfiable() -> SqlCondition {
        SqlCondition::new_false()
    }
}
