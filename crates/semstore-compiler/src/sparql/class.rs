use super::builder::SparqlConditionBuilder;
use super::condition::SparqlCondition;
use semstore_query::{ClassDescription, PropertyRef, ValueKind};

impl SparqlConditionBuilder<'_> {
    /// Class membership. Several classes share one pattern with an `IN`
    /// filter on the class variable instead of a union.
    pub(super) fn class_condition(
        &mut self,
        class: &ClassDescription,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        let predicate = self.type_path(class);
        let follows_subclasses = predicate.contains("rdfs:");
        let terms: Vec<String> = class
            .classes()
            .iter()
            .map(|c| self.vocabulary.entity(c))
            .collect();
        let pattern = match terms.as_slice() {
            [single] => format!("?{join_variable} {predicate} {single} ."),
            _ => {
                let class_variable = self.next_variable();
                format!(
                    "?{join_variable} {predicate} ?{class_variable} . FILTER( ?{class_variable} IN ({}) )",
                    terms.join(", ")
                )
            }
        };

        let mut condition = if class.is_negated() {
            SparqlCondition::new_filter(format!("NOT EXISTS {{ {pattern} }}"))
        } else {
            SparqlCondition::new_where(format!("{{ {pattern} }}\n"), true)
        };
        self.declare(&mut condition, "rdf");
        self.declare(&mut condition, "wiki");
        if follows_subclasses {
            self.declare(&mut condition, "rdfs");
        }
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(ValueKind::Page));
        condition
    }

    /// Path from an instance to its classes. A depth of zero asks for direct
    /// members only and a bounded depth follows at most that many subclass
    /// steps. A zero ceiling disables hierarchy inference altogether.
    fn type_path(&self, class: &ClassDescription) -> String {
        if self.config.subcategory_depth_ceiling == 0 {
            return "rdf:type".to_string();
        }
        match class.hierarchy_depth() {
            None => "rdf:type/rdfs:subClassOf*".to_string(),
            Some(depth) => {
                let steps = self.config.clamp_hierarchy_depth(depth) as usize;
                format!("rdf:type{}", "/rdfs:subClassOf?".repeat(steps))
            }
        }
    }
}
