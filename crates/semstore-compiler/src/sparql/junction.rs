use super::builder::SparqlConditionBuilder;
use super::condition::{SparqlCondition, SparqlKind};
use regex::{Captures, Regex};
use semstore_query::{Conjunction, Disjunction, PropertyRef};
use std::sync::OnceLock;

impl SparqlConditionBuilder<'_> {
    /// All parts constrain the same variable. Patterns are concatenated,
    /// filters AND-ed; singletons must agree on their element.
    pub(super) fn conjunction_condition(
        &mut self,
        conjunction: &Conjunction,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        match conjunction.parts() {
            [] => return self.new_true_condition(join_variable, order_by),
            [single] => return self.build_condition(single, join_variable, order_by),
            _ => {}
        }

        let mut pattern = String::new();
        let mut filters: Vec<String> = Vec::new();
        let mut singleton: Option<String> = None;
        let mut safe = false;
        let mut merged = SparqlCondition::new_true();

        for part in conjunction.parts() {
            let sub = self.build_condition(part, join_variable, None);
            match &sub.kind {
                SparqlKind::False => return SparqlCondition::new_false(),
                SparqlKind::True => {}
                SparqlKind::Where { pattern: p, safe: s } => {
                    safe |= *s;
                    pattern.push_str(p);
                }
                SparqlKind::Filter { expr } => filters.push(expr.clone()),
                SparqlKind::Singleton {
                    element,
                    pattern: p,
                    safe: s,
                } => {
                    if singleton.as_ref().is_some_and(|known| known != element) {
                        return SparqlCondition::new_false();
                    }
                    singleton = Some(element.clone());
                    safe |= *s;
                    pattern.push_str(p);
                }
            }
            merged.absorb_dependencies(&sub);
            merged.order_variables.extend(sub.order_variables);
        }

        let filter = filters.join(" && ");
        let with_filter = |mut pattern: String| {
            if !filter.is_empty() {
                pattern.push_str(&format!("FILTER( {filter} )\n"));
            }
            pattern
        };
        merged.kind = if let Some(element) = singleton {
            SparqlKind::Singleton {
                element,
                pattern: with_filter(pattern),
                safe,
            }
        } else if pattern.is_empty() && filter.is_empty() {
            SparqlKind::True
        } else if pattern.is_empty() {
            SparqlKind::Filter { expr: filter.clone() }
        } else {
            SparqlKind::Where {
                pattern: with_filter(pattern),
                safe,
            }
        };
        self.add_order_by_data_for_property(&mut merged, join_variable, order_by, None);
        merged
    }

    /// At least one part holds. Parts binding the join variable become
    /// union branches; filters are OR-ed, and parts that test the variable
    /// without binding it join them as `EXISTS` filters. When both kinds
    /// occur, the union is bound to a fresh variable inside an `OPTIONAL` and
    /// equated back through the filter.
    pub(super) fn disjunction_condition(
        &mut self,
        disjunction: &Disjunction,
        join_variable: &str,
        order_by: Option<&PropertyRef>,
    ) -> SparqlCondition {
        if disjunction.is_trivially_true() {
            return self.new_true_condition(join_variable, order_by);
        }
        match disjunction.parts() {
            [] => return SparqlCondition::new_false(),
            [single] => return self.build_condition(single, join_variable, order_by),
            _ => {}
        }

        let mut branches: Vec<String> = Vec::new();
        let mut filters: Vec<String> = Vec::new();
        let mut merged = SparqlCondition::new_true();

        for part in disjunction.parts() {
            let sub = self.build_condition(part, join_variable, None);
            match &sub.kind {
                SparqlKind::False => continue,
                SparqlKind::True => return self.new_true_condition(join_variable, order_by),
                SparqlKind::Filter { expr } => {
                    filters.push(expr.clone());
                    merged.absorb_dependencies(&sub);
                    continue;
                }
                SparqlKind::Singleton { element, pattern, .. } if pattern.is_empty() => {
                    filters.push(format!("?{join_variable} = {element}"));
                    merged.absorb_dependencies(&sub);
                    continue;
                }
                SparqlKind::Where { .. } | SparqlKind::Singleton { .. } => {}
            }
            // Optional patterns stay inside the part: filters of a branch
            // only see what the branch binds.
            let mut group = sub.pattern();
            if let SparqlKind::Singleton { element, .. } = &sub.kind {
                group.push_str(&format!("FILTER( ?{join_variable} = {element} )\n"));
            }
            group.push_str(&sub.weak_condition_string());
            if sub.is_safe() {
                branches.push(format!("{{\n{group}}}"));
            } else {
                filters.push(format!("EXISTS {{\n{group}}}"));
            }
            merged.namespaces.extend(sub.namespaces);
        }

        let union = branches.join(" UNION ");
        let filter = filters.join(" || ");
        merged.kind = if union.is_empty() && filter.is_empty() {
            SparqlKind::False
        } else if union.is_empty() {
            SparqlKind::Filter { expr: filter }
        } else if filter.is_empty() {
            SparqlKind::Where {
                pattern: union,
                safe: true,
            }
        } else {
            let sub_variable = self.next_variable();
            let union = rename_variable(&union, join_variable, &sub_variable);
            SparqlKind::Where {
                pattern: format!(
                    "OPTIONAL {{ {union} }}\n FILTER( {filter} || ?{join_variable} = ?{sub_variable} )\n"
                ),
                safe: false,
            }
        };
        if merged.is_false() {
            return merged;
        }
        self.add_order_by_data_for_property(&mut merged, join_variable, order_by, None);
        merged
    }
}

/// Replace every occurrence of the variable `?from` in `text` by `?to`,
/// leaving longer names that merely start with `from` alone.
pub fn rename_variable(text: &str, from: &str, to: &str) -> String {
    static VARIABLE: OnceLock<Regex> = OnceLock::new();
    let variable = VARIABLE.get_or_init(|| Regex::new(r"\?([A-Za-z0-9_]+)").expect("valid regex"));
    variable
        .replace_all(text, |caps: &Captures| {
            if &caps[1] == from {
                format!("?{to}")
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
