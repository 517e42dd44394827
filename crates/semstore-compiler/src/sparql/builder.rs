//! Orchestrator of the SPARQL lowering.
//!
//! [`SparqlConditionBuilder::build_condition`] dispatches every description
//! variant to its builder; the variant builders live in the sibling modules
//! (`class`, `property`, `value`, `junction`). Shared state is limited to the
//! fresh-variable counter, the error log, the sort keys and the cycle guard.

use super::condition::SparqlCondition;
use super::term::Vocabulary;
use crate::guard::CircularReferenceGuard;
use crate::{ConditionBuilder, OrderBy};
use semstore_query::{
    ConceptDescription, Description, NamespaceDescription, PropertyRef, QueryConfig, QueryStore,
    SortDirection, ValueKind,
};
use std::collections::BTreeSet;

/// Variable bound to the query results.
pub const RESULT_VARIABLE: &str = "result";

pub struct SparqlConditionBuilder<'a> {
    pub(super) store: &'a dyn QueryStore,
    pub(super) config: &'a QueryConfig,
    pub(super) vocabulary: Vocabulary,
    pub(super) sort_keys: Vec<(String, SortDirection)>,
    /// Sort keys that already have an order variable somewhere in the query.
    pub(super) bound_sort_keys: BTreeSet<String>,
    pub(super) errors: Vec<String>,
    guard: CircularReferenceGuard,
    variable_counter: usize,
}

impl<'a> SparqlConditionBuilder<'a> {
    pub fn new(store: &'a dyn QueryStore, config: &'a QueryConfig) -> Self {
        Self {
            store,
            config,
            vocabulary: Vocabulary::new(&config.sparql),
            sort_keys: store.sort_keys(),
            bound_sort_keys: BTreeSet::new(),
            errors: Vec::new(),
            guard: CircularReferenceGuard::new(config.max_recursion_depth),
            variable_counter: 0,
        }
    }

    /// Allocate a fresh variable name (`v1`, `v2`, ...).
    pub fn next_variable(&mut self) -> String {
        self.variable_counter += 1;
        format!("v{}", self.variable_counter)
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn guard(&self) -> &CircularReferenceGuard {
        &self.guard
    }

    /// Compile `description` as a condition on `join_variable`.
    ///
    /// `order_by` names the property whose values `join_variable` holds when
    /// the query is sorted by that property.
    pub fn build_condition(
        &mut self,
        description: &Description,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        match description {
            Description::Thing(t) if t.negated => SparqlCondition::new_false(),
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

    pub fn new_true_condition(&self, join_variable: &str, order_by: Option<&PropertyRef>) -> SparqlCondition {
        let mut condition = SparqlCondition::new_true();
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, None);
        condition
    }

    /// Record the prefix declaration `prefix` on `condition`.
    pub(super) fn declare(&self, condition: &mut SparqlCondition, prefix: &str) {
        if let Some(uri) = self.vocabulary.namespace_uri(prefix) {
            condition.namespaces.insert(prefix.to_string(), uri);
        }
    }

    /// Whether `key` is a sort key that has no order variable yet.
    pub(super) fn sort_key_pending(&self, key: &str) -> bool {
        self.sort_keys.iter().any(|(k, _)| k == key) && !self.bound_sort_keys.contains(key)
    }

    // ------------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------------

    /// Add ordering data when the query sorts by `order_by`. `kind` defaults
    /// to the property's declared value kind.
    pub fn add_order_by_data_for_property(
        &self,
        condition: &mut SparqlCondition,
        main_variable: &str,
        order_by: Option<&PropertyRef>,
        kind: Option<ValueKind>,
    ) {
        let Some(property) = order_by else {
            return;
        };
        let kind = kind.unwrap_or_else(|| self.store.property_kind(property));
        self.add_order_by_data(condition, main_variable, kind);
    }

    /// Make `condition` expose a variable to order `main_variable` by. Pages
    /// sort by their sort key, bound through a weak condition.
    pub fn add_order_by_data(&self, condition: &mut SparqlCondition, main_variable: &str, kind: ValueKind) {
        if kind == ValueKind::Page {
            let sort_variable = format!("{main_variable}sk");
            condition.weak_conditions.insert(
                sort_variable.clone(),
                format!("?{main_variable} swivt:wikiPageSortKey ?{sort_variable} .\n"),
            );
            self.declare(condition, "swivt");
            condition.order_by_variable = Some(sort_variable);
        } else {
            condition.order_by_variable = Some(main_variable.to_string());
        }
    }

    /// Bind order variables for sort keys the query itself never reached.
    pub fn add_missing_order_by_conditions(&mut self, condition: &mut SparqlCondition) {
        for (key, _) in self.sort_keys.clone() {
            if condition.order_variables.contains_key(&key) {
                continue;
            }
            if key.is_empty() {
                self.add_order_by_data(condition, RESULT_VARIABLE, ValueKind::Page);
                if let Some(variable) = condition.order_by_variable.clone() {
                    condition.order_variables.insert(key, variable);
                }
                continue;
            }
            self.bound_sort_keys.remove(&key);
            let aux = Description::some_property(PropertyRef::new(key.clone()), Description::thing());
            let aux_condition = self.build_condition(&aux, RESULT_VARIABLE, None);
            let Some(variable) = aux_condition.order_variables.get(&key).cloned() else {
                tracing::debug!(sort_key = %key, "sort key produced no order variable");
                continue;
            };
            condition.weak_conditions.insert(
                variable.clone(),
                format!("{}{}", aux_condition.weak_condition_string(), aux_condition.pattern()),
            );
            condition.namespaces.extend(aux_condition.namespaces);
            condition.order_variables.insert(key, variable);
        }
    }

    // ------------------------------------------------------------------------
    // Namespace and concept
    // ------------------------------------------------------------------------

    fn namespace_condition(
        &self,
        namespace: &NamespaceDescription,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        let pattern = format!(
            "{{ ?{join_variable} swivt:wikiNamespace \"{}\"^^xsd:integer . }}\n",
            namespace.namespace
        );
        let mut condition = SparqlCondition::new_where(pattern, true);
        self.declare(&mut condition, "swivt");
        self.declare(&mut condition, "xsd");
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(ValueKind::Page));
        condition
    }

    fn concept_condition(
        &mut self,
        concept: &ConceptDescription,
        description: &Description,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        let Some(definition) = self.store.resolve_concept(&concept.concept) else {
            return SparqlCondition::new_false();
        };
        let key = description.fingerprint();
        let _mark = self.guard.mark(&key);
        if self.guard.is_circular(&key) {
            let message = format!("circular query condition: {}", description.query_string(false));
            tracing::warn!(concept = %concept.concept.prefixed_text(), "{message}");
            self.errors.push(message);
            return SparqlCondition::new_false();
        }
        self.build_condition(&definition, join_variable, order_by)
    }
}

impl ConditionBuilder for SparqlConditionBuilder<'_> {
    type Condition = SparqlCondition;

    fn build_root(&mut self, description: &Description) -> SparqlCondition {
        let mut condition = self.build_condition(description, RESULT_VARIABLE, None);
        self.add_missing_order_by_conditions(&mut condition);
        condition
    }

    fn order_by(&self, condition: &SparqlCondition) -> Vec<OrderBy> {
        self.sort_keys
            .iter()
            .filter_map(|(key, direction)| {
                condition.order_variables.get(key).map(|variable| OrderBy {
                    variable: format!("?{variable}"),
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
    use crate::sparql::SparqlKind;
    use semstore_query::{EntityRef, MemoryStore};

    #[test]
    fn variables_are_fresh_per_builder() {
        let store = MemoryStore::new();
        let config = QueryConfig::default();
        let mut builder = SparqlConditionBuilder::new(&store, &config);
        assert_eq!(builder.next_variable(), "v1");
        assert_eq!(builder.next_variable(), "v2");
        let mut other = SparqlConditionBuilder::new(&store, &config);
        assert_eq!(other.next_variable(), "v1");
    }

    #[test]
    fn namespace_is_a_safe_where_condition() {
        let store = MemoryStore::new();
        let config = QueryConfig::default();
        let mut builder = SparqlConditionBuilder::new(&store, &config);
        let c = builder.build_condition(&Description::namespace(14), "result", None);
        assert_eq!(
            c.kind,
            SparqlKind::Where {
                pattern: "{ ?result swivt:wikiNamespace \"14\"^^xsd:integer . }\n".into(),
                safe: true,
            }
        );
        assert!(c.namespaces.contains_key("swivt"));
    }

    #[test]
    fn unknown_concept_is_false_without_error() {
        let store = MemoryStore::new();
        let config = QueryConfig::default();
        let mut builder = SparqlConditionBuilder::new(&store, &config);
        let c = builder.build_condition(&Description::concept(EntityRef::concept("Nope")), "result", None);
        assert!(c.is_false());
        assert!(builder.errors().is_empty());
    }

    #[test]
    fn self_referencing_concept_reports_one_cycle() {
        let mut store = MemoryStore::new();
        let a = EntityRef::concept("A");
        store.define_concept(a.clone(), Description::concept(a.clone()));
        let config = QueryConfig::default();
        let mut builder = SparqlConditionBuilder::new(&store, &config);

        let c = builder.build_condition(&Description::concept(a), "result", None);
        assert!(c.is_false());
        assert_eq!(builder.errors(), ["circular query condition: [[Concept:A]]"]);
        assert!(builder.guard().is_idle());
    }

    #[test]
    fn sort_by_result_uses_page_sort_key() {
        let mut store = MemoryStore::new();
        store.add_sort_key("", SortDirection::Desc);
        let config = QueryConfig::default();
        let mut builder = SparqlConditionBuilder::new(&store, &config);
        let c = builder.build_root(&Description::class(EntityRef::category("City")));
        assert_eq!(c.order_variables.get("").map(String::as_str), Some("resultsk"));
        assert_eq!(
            builder.order_by(&c),
            vec![OrderBy {
                variable: "?resultsk".into(),
                direction: SortDirection::Desc,
            }]
        );
    }
}
