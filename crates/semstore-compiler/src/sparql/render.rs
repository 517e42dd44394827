use super::builder::RESULT_VARIABLE;
use super::condition::{SparqlCondition, SparqlKind};
use super::term::SWIVT;
use crate::Compiled;
use std::fmt::Write as _;

/// Render a complete `SELECT` query for a compiled condition.
///
/// Unsafe conditions get a `swivt:page` anchor so the result variable is
/// always bound to a wiki page.
pub fn render_select(compiled: &Compiled<SparqlCondition>, limit: Option<usize>, offset: usize) -> String {
    let condition = &compiled.condition;
    let mut namespaces = condition.namespaces.clone();
    let mut body = String::new();
    if !condition.is_safe() {
        namespaces.insert("swivt".to_string(), SWIVT.to_string());
        let _ = writeln!(body, "?{RESULT_VARIABLE} swivt:page ?url .");
    }
    body.push_str(&condition.pattern());
    if let SparqlKind::Singleton { element, .. } = &condition.kind {
        let _ = writeln!(body, "FILTER( ?{RESULT_VARIABLE} = {element} )");
    }
    body.push_str(&condition.weak_condition_string());

    let mut query = String::new();
    for (prefix, uri) in &namespaces {
        let _ = writeln!(query, "PREFIX {prefix}: <{uri}>");
    }
    let _ = write!(query, "SELECT DISTINCT ?{RESULT_VARIABLE} WHERE {{\n{body}}}");
    if !compiled.order_by.is_empty() {
        query.push_str("\nORDER BY");
        for order in &compiled.order_by {
            let _ = write!(query, " {}({})", order.direction.as_str(), order.variable);
        }
    }
    if let Some(limit) = limit {
        let _ = write!(query, "\nLIMIT {limit}");
    }
    if offset > 0 {
        let _ = write!(query, "\nOFFSET {offset}");
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, OrderBy, Sparql};
    use semstore_query::{Description, EntityRef, MemoryStore, QueryConfig, SortDirection};

    #[test]
    fn safe_condition_renders_without_anchor() {
        let store = MemoryStore::new();
        let config = QueryConfig {
            subcategory_depth_ceiling: 0,
            ..QueryConfig::default()
        };
        let compiled = compile::<Sparql>(&Description::class(EntityRef::category("City")), &store, &config);
        assert_eq!(
            render_select(&compiled, Some(10), 0),
            "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>\n\
             PREFIX wiki: <http://example.org/id/>\n\
             SELECT DISTINCT ?result WHERE {\n\
             { ?result rdf:type wiki:Category-3ACity . }\n\
             }\nLIMIT 10"
        );
    }

    #[test]
    fn unsafe_condition_is_anchored_and_ordered() {
        let mut compiled = compile::<Sparql>(&Description::thing(), &MemoryStore::new(), &QueryConfig::default());
        compiled.order_by.push(OrderBy {
            variable: "?resultsk".into(),
            direction: SortDirection::Asc,
        });
        let text = render_select(&compiled, None, 20);
        assert!(text.contains("PREFIX swivt: <http://semantic-mediawiki.org/swivt/1.0#>"));
        assert!(text.contains("?result swivt:page ?url .\n"));
        assert!(text.ends_with("}\nORDER BY ASC(?resultsk)\nOFFSET 20"));
    }
}
