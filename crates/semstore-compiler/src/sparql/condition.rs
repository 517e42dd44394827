//! SPARQL condition algebra.

use serde::Serialize;
use std::collections::BTreeMap;

/// Pattern used for a condition that can never match.
pub const FALSE_PATTERN: &str = "<http://www.example.org> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/2002/07/owl#nothing> .\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SparqlKind {
    /// No restriction.
    True,
    /// Matches nothing.
    False,
    /// A group graph pattern binding the join variable. `safe` patterns bind
    /// the variable to wiki pages on their own.
    Where { pattern: String, safe: bool },
    /// A boolean expression over already bound variables.
    Filter { expr: String },
    /// The join variable denotes exactly `element` (a SPARQL term). `pattern`
    /// holds extra conditions on it, possibly empty.
    Singleton {
        element: String,
        pattern: String,
        safe: bool,
    },
}

/// A compiled SPARQL condition on one join variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SparqlCondition {
    pub kind: SparqlKind,
    /// Prefix declarations (`wiki`, `swivt`, ...) the condition relies on.
    pub namespaces: BTreeMap<String, String>,
    /// Optional patterns keyed by the variable they bind; they never remove
    /// rows.
    pub weak_conditions: BTreeMap<String, String>,
    /// Variable holding the value to order by, when ordering was requested.
    pub order_by_variable: Option<String>,
    /// Sort key to order variable, for every sort key reached so far.
    pub order_variables: BTreeMap<String, String>,
}

impl SparqlCondition {
    fn with_kind(kind: SparqlKind) -> Self {
        Self {
            kind,
            namespaces: BTreeMap::new(),
            weak_conditions: BTreeMap::new(),
            order_by_variable: None,
            order_variables: BTreeMap::new(),
        }
    }

    pub fn new_true() -> Self {
        Self::with_kind(SparqlKind::True)
    }

    pub fn new_false() -> Self {
        Self::with_kind(SparqlKind::False)
    }

    pub fn new_where(pattern: impl Into<String>, safe: bool) -> Self {
        Self::with_kind(SparqlKind::Where {
            pattern: pattern.into(),
            safe,
        })
    }

    pub fn new_filter(expr: impl Into<String>) -> Self {
        Self::with_kind(SparqlKind::Filter { expr: expr.into() })
    }

    pub fn new_singleton(element: impl Into<String>, pattern: impl Into<String>, safe: bool) -> Self {
        Self::with_kind(SparqlKind::Singleton {
            element: element.into(),
            pattern: pattern.into(),
            safe,
        })
    }

    pub fn is_true(&self) -> bool {
        matches!(self.kind, SparqlKind::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self.kind, SparqlKind::False)
    }

    /// Whether the condition alone guarantees its join variable is bound to
    /// a wiki page.
    pub fn is_safe(&self) -> bool {
        match &self.kind {
            SparqlKind::True | SparqlKind::Filter { .. } => false,
            SparqlKind::False => true,
            SparqlKind::Where { safe, .. } | SparqlKind::Singleton { safe, .. } => *safe,
        }
    }

    /// The condition as group graph pattern text.
    pub fn pattern(&self) -> String {
        match &self.kind {
            SparqlKind::True => String::new(),
            SparqlKind::False => FALSE_PATTERN.to_string(),
            SparqlKind::Where { pattern, .. } | SparqlKind::Singleton { pattern, .. } => pattern.clone(),
            SparqlKind::Filter { expr } => format!("FILTER( {expr} )\n"),
        }
    }

    pub fn weak_condition_string(&self) -> String {
        self.weak_conditions
            .values()
            .map(|c| format!("OPTIONAL {{ {c}}}\n"))
            .collect()
    }

    /// Carry over the dependencies of a sub-condition.
    pub(crate) fn absorb_dependencies(&mut self, other: &SparqlCondition) {
        self.namespaces
            .extend(other.namespaces.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.weak_conditions
            .extend(other.weak_conditions.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_renders_as_filter_clause() {
        let c = SparqlCondition::new_filter("?x > 5");
        assert_eq!(c.pattern(), "FILTER( ?x > 5 )\n");
        assert!(!c.is_safe());
    }

    #[test]
    fn weak_conditions_render_optional() {
        let mut c = SparqlCondition::new_true();
        c.weak_conditions
            .insert("xsk".into(), "?x swivt:wikiPageSortKey ?xsk .\n".into());
        assert_eq!(
            c.weak_condition_string(),
            "OPTIONAL { ?x swivt:wikiPageSortKey ?xsk .\n}\n"
        );
    }

    #[test]
    fn false_condition_has_unmatchable_pattern() {
        let c = SparqlCondition::new_false();
        assert!(c.is_false());
        assert!(c.pattern().contains("owl#nothing"));
    }
}
