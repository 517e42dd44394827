use super::builder::SparqlConditionBuilder;
use super::condition::{SparqlCondition, SparqlKind};
use semstore_query::{Description, PropertyRef, SomeProperty, ValueKind};

impl SparqlConditionBuilder<'_> {
    /// Existential property restriction.
    ///
    /// The inner description is compiled against a fresh variable. A bare
    /// singleton result is substituted for that variable. Inverse properties
    /// swap subject and object around the forward predicate.
    pub(super) fn property_condition(
        &mut self,
        restriction: &SomeProperty,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        let property = restriction.property();
        let predicate = self.vocabulary.property(&property.non_inverse());
        let subject = format!("?{join_variable}");

        if matches!(restriction.description(), Description::Thing(t) if t.negated) {
            let any = format!("?{}", self.next_variable());
            let triple = triple(property, &subject, &predicate, &any);
            let mut condition = SparqlCondition::new_filter(format!("NOT EXISTS {{ {triple}}}"));
            self.declare(&mut condition, "property");
            return condition;
        }

        let inner_order_by = self
            .sort_key_pending(&property.key)
            .then(|| property.clone());
        let inner_variable = self.next_variable();
        let inner = self.build_condition(restriction.description(), &inner_variable, inner_order_by.as_ref());

        let substitute = match &inner.kind {
            SparqlKind::False => return SparqlCondition::new_false(),
            SparqlKind::Singleton { element, pattern, .. }
                if pattern.is_empty() && inner.weak_conditions.is_empty() && inner_order_by.is_none() =>
            {
                Some(element.clone())
            }
            _ => None,
        };

        let object = substitute
            .clone()
            .unwrap_or_else(|| format!("?{inner_variable}"));
        // Inner text shares the group of the triple: its filters may only
        // test the inner variable where the triple binds it.
        let mut pattern = triple(property, &subject, &predicate, &object);
        if substitute.is_none() {
            pattern.push_str(&inner.pattern());
            if let SparqlKind::Singleton { element, .. } = &inner.kind {
                pattern.push_str(&format!("FILTER( ?{inner_variable} = {element} )\n"));
            }
            pattern.push_str(&inner.weak_condition_string());
        }

        let mut condition = SparqlCondition::new_where(pattern, true);
        condition.namespaces = inner.namespaces.clone();
        condition.order_variables = inner.order_variables.clone();
        self.declare(&mut condition, "property");
        if inner_order_by.is_some() {
            if let Some(variable) = &inner.order_by_variable {
                condition
                    .order_variables
                    .insert(property.key.clone(), variable.clone());
                self.bound_sort_keys.insert(property.key.clone());
            }
        }
        self.add_order_by_data_for_property(&mut condition, join_variable, order_by, Some(ValueKind::Page));
        condition
    }
}

fn triple(property: &PropertyRef, subject: &str, predicate: &str, object: &str) -> String {
    if property.is_inverse() {
        format!("{object} {predicate} {subject} .\n")
    } else {
        format!("{subject} {predicate} {object} .\n")
    }
}
