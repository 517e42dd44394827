use super::builder::SqlConditionBuilder;
use super::condition::{SqlCondition, SqlKind, SqlValue};
use semstore_query::{Conjunction, Disjunction, PropertyRef};

impl SqlConditionBuilder<'_> {
    /// Joins and predicates of all parts are concatenated; singletons must
    /// agree on their value.
    pub(super) fn conjunction_condition(
        &mut self,
        conjunction: &Conjunction,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SqlCondition {
        match conjunction.parts() {
            [] => return self.new_true_condition(join_variable, order_by),
            [single] => return self.build_condition(single, join_variable, order_by),
            _ => {}
        }

        let mut joins: Vec<String> = Vec::new();
        let mut predicates: Vec<String> = Vec::new();
        let mut singleton: Option<SqlValue> = None;
        let mut merged = SqlCondition::new_true();

        for part in conjunction.parts() {
            let sub = self.build_condition(part, join_variable, None);
            match &sub.kind {
                SqlKind::False => return SqlCondition::new_false(),
                SqlKind::True => {}
                SqlKind::Where {
                    joins: j,
                    predicates: p,
                } => {
                    joins.extend(j.iter().cloned());
                    predicates.extend(p.iter().cloned());
                }
                SqlKind::Filter { expr } => predicates.push(expr.clone()),
                SqlKind::Singleton {
                    value,
                    joins: j,
                    predicates: p,
                } => {
                    if singleton.as_ref().is_some_and(|known| known != value) {
                        return SqlCondition::new_false();
                    }
                    singleton = Some(value.clone());
                    joins.extend(j.iter().cloned());
                    predicates.extend(p.iter().cloned());
                }
            }
            merged.absorb_dependencies(&sub);
            merged.order_columns.extend(sub.order_columns);
        }

        merged.kind = match singleton {
            Some(value) => SqlKind::Singleton {
                value,
                joins,
                predicates,
            },
            None if joins.is_empty() && predicates.is_empty() => SqlKind::True,
            None if joins.is_empty() => SqlKind::Filter {
                expr: predicates.join(" AND "),
            },
            None => SqlKind::Where { joins, predicates },
        };
        self.add_order_by_data_for_property(&mut merged, join_variable, order_by, None);
        merged
    }

    /// Every surviving part becomes one self-contained predicate, OR-ed into
    /// a filter. Left joins of the parts are dropped along with their order
    /// columns, since they cannot reach into the `EXISTS` subqueries.
    pub(super) fn disjunction_condition(
        &mut self,
        disjunction: &Disjunction,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SqlCondition {
        if disjunction.is_trivially_true() {
            return self.new_true_condition(join_variable, order_by);
        }
        match disjunction.parts() {
            [] => return SqlCondition::new_false(),
            [single] => return self.build_condition(single, join_variable, order_by),
            _ => {}
        }

        let mut terms: Vec<String> = Vec::new();
        let mut merged = SqlCondition::new_true();
        for part in disjunction.parts() {
            let sub = self.build_condition(part, join_variable, None);
            match &sub.kind {
                SqlKind::False => continue,
                SqlKind::True => return self.new_true_condition(join_variable, order_by),
                _ => terms.push(sub.to_predicate(join_variable)),
            }
            merged.join_tables.extend(sub.join_tables);
        }

        merged.kind = match terms.as_slice() {
            [] => return SqlCondition::new_false(),
            [single] => SqlKind::Filter { expr: single.clone() },
            _ => SqlKind::Filter {
                expr: terms
                    .iter()
                    .map(|t| format!("({t})"))
                    .collect::<Vec<_>>()
                    .join(" OR "),
            },
        };
        self.add_order_by_data_for_property(&mut merged, join_variable, order_by, None);
        merged
    }
}
