//! Orchestrator of the SQL lowering.
//!
//! Join variables are column expressions (`t0.smw_id`, `t3.o_id`, ...);
//! every table a condition joins gets a fresh alias `tN`. The root alias
//! `t0` always ranges over the object id table.

use super::condition::SqlCondition;
use crate::guard::CircularReferenceGuard;
use crate::{ConditionBuilder, OrderBy};
use semstore_query::{
    ConceptDescription, Description, NamespaceDescription, PropertyRef, QueryConfig, QueryStore,
    SortDirection, ValueKind,
};
use std::collections::BTreeSet;

/// Object id registry: `smw_id`, `smw_namespace`, `smw_sortkey`.
pub const OBJECT_IDS: &str = "smw_object_ids";
/// Class membership: `s_id` is an instance of `o_id`.
pub const INSTANCE_TABLE: &str = "smw_fpt_inst";
/// Column holding the result ids.
pub const ROOT_COLUMN: &str = "t0.smw_id";

/// Property value table for values of `kind`.
pub fn property_table(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Page => "smw_di_wikipage",
        ValueKind::Blob => "smw_di_blob",
        ValueKind::Number => "smw_di_number",
        ValueKind::Boolean => "smw_di_bool",
        ValueKind::Uri => "smw_di_uri",
    }
}

/// Value column of a property table.
pub fn value_column(kind: ValueKind) -> &'static str {
    if kind == ValueKind::Page {
        "o_id"
    } else {
        "o_value"
    }
}

pub struct SqlConditionBuilder<'a> {
    pub(super) store: &'a dyn QueryStore,
    pub(super) config: &'a QueryConfig,
    pub(super) sort_keys: Vec<(String, SortDirection)>,
    pub(super) bound_sort_keys: BTreeSet<String>,
    pub(super) errors: Vec<String>,
    guard: CircularReferenceGuard,
    alias_counter: usize,
}

impl<'a> SqlConditionBuilder<'a> {
    pub fn new(store: &'a dyn QueryStore, config: &'a QueryConfig) -> Self {
        Self {
            store,
            config,
            sort_keys: store.sort_keys(),
            bound_sort_keys: BTreeSet::new(),
            errors: Vec::new(),
            guard: CircularReferenceGuard::new(config.max_recursion_depth),
            alias_counter: 0,
        }
    }

    /// Allocate a fresh table alias (`t1`, `t2`, ...).
    pub fn next_alias(&mut self) -> String {
        self.alias_counter += 1;
        format!("t{}", self.alias_counter)
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn guard(&self) -> &CircularReferenceGuard {
        &self.guard
    }

    /// Compile `description` as a condition on the column `join_variable`.
    pub fn build_condition(
        &mut self,
        description: &Description,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SqlCondition {
        match description {
            Description::Thing(t) if t.negated => SqlCondition::new_false(),
            Description::Thing(_) => self.new_true_condition(join_variable, order_by),
            Description::Value(v) => self.value_condition(v, description, join_variable, order_by),
            Description::Class(c) => self.class_condition(c, join_variable, order_by),
            Description::Namespace(n) => self.namespace_condition(n, join_variable, order_by),
            Description::Concept(c) => self.concept_condition(c, description, join_variable, order_by),
            Description::SomeProperty(p) => self.property_condition(p, join_variable, order_by),
            Description::Conjunction(c) => self.conjunction_condition(c, join_variable, order_by),
            Description::Disjunction(d) => self.disjunction_condition(d, join_variable, order_by),
        }
    }

    pub fn new_true_condition(&mut self, join_variable: &str, order_by: Option<&PropertyRef>) -> SqlCondition {
        let mut condition = SqlCondition::new_true();
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, None);
        condition
    }

    pub(super) fn sort_key_pending(&self, key: &str) -> bool {
        self.sort_keys.iter().any(|(k, _)| k == key) && !self.bound_sort_keys.contains(key)
    }

    // ------------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------------

    pub fn add_order_by_data_for_property(
        &mut self,
        condition: &mut SqlCondition,
        column: &str,
        order_by: Option<&PropertyRef>,
        kind: Option<ValueKind>,
    ) {
        let Some(property) = order_by else {
            return;
        };
        let kind = kind.unwrap_or_else(|| self.store.property_kind(property));
        self.add_order_by_data(condition, column, kind);
    }

    /// Make `condition` expose a column to order `column` by. Page ids sort
    /// by the sort key of their object id row, reached through a left join.
    pub fn add_order_by_data(&mut self, condition: &mut SqlCondition, column: &str, kind: ValueKind) {
        if kind == ValueKind::Page {
            let alias = self.next_alias();
            condition.weak_joins.insert(
                alias.clone(),
                format!("LEFT JOIN {OBJECT_IDS} AS {alias} ON {alias}.smw_id = {column}"),
            );
            condition.join_tables.insert(OBJECT_IDS.to_string());
            condition.order_by_column = Some(format!("{alias}.smw_sortkey"));
        } else {
            condition.order_by_column = Some(column.to_string());
        }
    }

    /// Left-join the values of sort keys the query never reached.
    pub fn add_missing_order_by_conditions(&mut self, condition: &mut SqlCondition) {
        for (key, _) in self.sort_keys.clone() {
            if condition.order_columns.contains_key(&key) {
                continue;
            }
            if key.is_empty() {
                self.add_order_by_data(condition, ROOT_COLUMN, ValueKind::Page);
                if let Some(column) = condition.order_by_column.clone() {
                    condition.order_columns.insert(key, column);
                }
                continue;
            }
            let property = PropertyRef::new(key.clone());
            let Some(property_id) = self.store.backend_identifier(&property.entity()) else {
                tracing::debug!(sort_key = %key, "sort key has no backend identifier");
                continue;
            };
            let kind = self.store.property_kind(&property);
            let table = property_table(kind);
            let alias = self.next_alias();
            condition.weak_joins.insert(
                alias.clone(),
                format!(
                    "LEFT JOIN {table} AS {alias} ON {alias}.s_id = {ROOT_COLUMN} AND {alias}.p_id = {property_id}"
                ),
            );
            condition.join_tables.insert(table.to_string());
            let value = format!("{alias}.{}", value_column(kind));
            let mut order = SqlCondition::new_true();
            self.add_order_by_data(&mut order, &value, kind);
            condition.absorb_dependencies(&order);
            if let Some(column) = order.order_by_column {
                condition.order_columns.insert(key, column);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Namespace and concept
    // ------------------------------------------------------------------------

    fn namespace_condition(
        &mut self,
        namespace: &NamespaceDescription,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SqlCondition {
        let alias = self.next_alias();
        let mut condition = SqlCondition::new_where(
            vec![format!("{OBJECT_IDS} AS {alias}")],
            vec![
                format!("{alias}.smw_id = {join_variable}"),
                format!("{alias}.smw_namespace = {}", namespace.namespace),
            ],
        );
        condition.join_tables.insert(OBJECT_IDS.to_string());
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(ValueKind::Page));
        condition
    }

    fn concept_condition(
        &mut self,
        concept: &ConceptDescription,
        description: &Description,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SqlCondition {
        let Some(definition) = self.store.resolve_concept(&concept.concept) else {
            return SqlCondition::new_false();
        };
        let key = description.fingerprint();
        let _mark = self.guard.mark(&key);
        if self.guard.is_circular(&key) {
            let message = format!("circular query condition: {}", description.query_string(false));
            tracing::warn!(concept = %concept.concept.prefixed_text(), "{message}");
            self.errors.push(message);
            return SqlCondition::new_false();
        }
        self.build_condition(&definition, join_variable, order_by)
    }
}

impl ConditionBuilder for SqlConditionBuilder<'_> {
    type Condition = SqlCondition;

    fn build_root(&mut self, description: &Description) -> SqlCondition {
        let mut condition = self.build_condition(description, ROOT_COLUMN, None);
        self.add_missing_order_by_conditions(&mut condition);
        condition
    }

    fn order_by(&self, condition: &SqlCondition) -> Vec<OrderBy> {
        self.sort_keys
            .iter()
            .filter_map(|(key, direction)| {
                condition.order_columns.get(key).map(|column| OrderBy {
                    variable: column.clone(),
                    direction: *direction,
                })
            })
            .collect()
    }

    fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::SqlKind;
    use semstore_query::{EntityRef, MemoryStore};

    #[test]
    fn namespace_joins_object_ids() {
        let store = MemoryStore::new();
        let config = QueryConfig::default();
        let mut builder = SqlConditionBuilder::new(&store, &config);
        let c = builder.build_condition(&Description::namespace(0), ROOT_COLUMN, None);
        assert_eq!(
            c.kind,
            SqlKind::Where {
                joins: vec!["smw_object_ids AS t1".into()],
                predicates: vec!["t1.smw_id = t0.smw_id".into(), "t1.smw_namespace = 0".into()],
            }
        );
        assert!(builder.errors().is_empty());
    }

    #[test]
    fn mutual_concepts_report_one_cycle() {
        let mut store = MemoryStore::new();
        let a = EntityRef::concept("A");
        let b = EntityRef::concept("B");
        store
            .define_concept(a.clone(), Description::concept(b.clone()))
            .define_concept(b, Description::concept(a.clone()));
        let config = QueryConfig::default();
        let mut builder = SqlConditionBuilder::new(&store, &config);
        assert!(builder.build_condition(&Description::concept(a), ROOT_COLUMN, None).is_false());
        assert_eq!(builder.errors(), ["circular query condition: [[Concept:A]]"]);
        assert!(builder.guard().is_idle());
    }

    #[test]
    fn missing_property_sort_key_is_left_joined() {
        let mut store = MemoryStore::new();
        let id = store.register(PropertyRef::new("Population").entity());
        store
            .add_sort_key("Population", SortDirection::Desc)
            .set_property_kind("Population", ValueKind::Number);
        let config = QueryConfig::default();
        let mut builder = SqlConditionBuilder::new(&store, &config);
        let c = builder.build_root(&Description::thing());
        assert_eq!(
            c.weak_joins.get("t1").map(String::as_str),
            Some(format!("LEFT JOIN smw_di_number AS t1 ON t1.s_id = t0.smw_id AND t1.p_id = {id}").as_str())
        );
        assert_eq!(
            builder.order_by(&c),
            vec![OrderBy {
                variable: "t1.o_value".into(),
                direction: SortDirection::Desc,
            }]
        );
    }
}
