//! Integration tests for the complete query pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Config (JSON) → Description → prune → SPARQL text
//! - Config (JSON) → Description → prune → SQL text
//!
//! Run with: cargo test --test integration_tests

use semstore_compiler::{compile, sparql, sql, Sparql, Sql};
use semstore_query::{
    Comparator, DataItem, Description, EntityRef, MemoryStore, PrintRequest, PropertyRef,
    QueryConfig, SortDirection, ValueKind,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A small wiki: cities, capitals, countries and a population property.
fn wiki() -> MemoryStore {
    let mut store = MemoryStore::new();
    for entity in [
        EntityRef::category("City"),
        EntityRef::category("Capital"),
        EntityRef::page("France"),
        EntityRef::page("Germany"),
        PropertyRef::new("Located in").entity(),
        PropertyRef::new("Population").entity(),
    ] {
        store.register(entity);
    }
    store
        .add_subclass(EntityRef::category("City"), EntityRef::category("Capital"))
        .set_property_kind("Population", ValueKind::Number)
        .define_concept(
            EntityRef::concept("Large cities"),
            Description::and([
                Description::class(EntityRef::category("City")),
                Description::some_property(
                    PropertyRef::new("Population"),
                    Description::value(DataItem::Number(1_000_000.0), Comparator::Geq),
                ),
            ]),
        );
    store
}

/// Large cities in France or Germany.
fn large_cities_in_france_or_germany() -> Description {
    Description::and([
        Description::concept(EntityRef::concept("Large cities")),
        Description::some_property(
            PropertyRef::new("Located in"),
            Description::or([
                Description::value(DataItem::Page(EntityRef::page("France")), Comparator::Eq),
                Description::value(DataItem::Page(EntityRef::page("Germany")), Comparator::Eq),
            ]),
        ),
    ])
    .with_print_request(PrintRequest::property(PropertyRef::new("Population")))
}

fn config_from_json(value: serde_json::Value) -> QueryConfig {
    QueryConfig::from_json_str(&value.to_string()).expect("config should parse")
}

// ============================================================================
// SPARQL
// ============================================================================

#[test]
fn test_sparql_pipeline() {
    init_tracing();
    let mut store = wiki();
    store.add_sort_key("Population", SortDirection::Desc);
    let config = config_from_json(serde_json::json!({
        "sparql": { "wiki_base_uri": "http://wiki.example/id/" }
    }));

    let compiled = compile::<Sparql>(&large_cities_in_france_or_germany(), &store, &config);
    assert!(compiled.errors.is_empty(), "{:?}", compiled.errors);
    assert!(compiled.pruned.is_empty());

    let text = sparql::render_select(&compiled, Some(20), 0);
    assert!(text.contains("PREFIX wiki: <http://wiki.example/id/>"), "{text}");
    assert!(text.contains("PREFIX property: <http://wiki.example/id/Property-3A>"), "{text}");
    assert!(text.contains("rdf:type/rdfs:subClassOf* wiki:Category-3ACity"), "{text}");
    assert!(text.contains("?result property:Population ?v1 ."), "{text}");
    assert!(text.contains("?v2 = wiki:France || ?v2 = wiki:Germany"), "{text}");
    assert!(text.ends_with("ORDER BY DESC(?v1)\nLIMIT 20"), "{text}");
}

// ============================================================================
// SQL
// ============================================================================

#[test]
fn test_sql_pipeline() {
    init_tracing();
    let store = wiki();
    let config = QueryConfig::default();
    let ids = |entity: EntityRef| store.ids[&entity];

    let compiled = compile::<Sql>(&large_cities_in_france_or_germany(), &store, &config);
    assert!(compiled.errors.is_empty(), "{:?}", compiled.errors);

    let text = sql::render_select(&compiled, Some(20), 40);
    let classes = format!(
        "IN ({}, {})",
        ids(EntityRef::category("City")),
        ids(EntityRef::category("Capital"))
    );
    assert!(text.contains(&classes), "{text}");
    assert!(text.contains("CROSS JOIN smw_di_number AS"), "{text}");
    assert!(text.contains(">= 1000000"), "{text}");
    let countries = format!("= {}) OR (", ids(EntityRef::page("France")));
    assert!(text.contains(&countries), "{text}");
    assert!(text.ends_with("LIMIT 20\nOFFSET 40"), "{text}");
}

// ============================================================================
// Limits and failures
// ============================================================================

#[test]
fn test_budget_pruning_is_reported_not_fatal() {
    init_tracing();
    let config = config_from_json(serde_json::json!({ "max_query_size": 2 }));
    let compiled = compile::<Sparql>(&large_cities_in_france_or_germany(), &wiki(), &config);
    assert!(!compiled.pruned.is_empty());
    assert!(compiled.errors.is_empty());
}

#[test]
fn test_disabled_features_reject_the_query() {
    init_tracing();
    // property | category | namespace | conjunction
    let config = config_from_json(serde_json::json!({ "allowed_features": 27 }));
    let d = large_cities_in_france_or_germany();

    let compiled = compile::<Sql>(&d, &wiki(), &config);
    assert!(compiled.condition.is_false());
    assert_eq!(
        compiled.errors,
        vec!["query uses disabled features: concept, disjunction".to_string()]
    );
    assert!(sql::render_select(&compiled, None, 0).ends_with("WHERE 1 = 0"));
}

#[test]
fn test_unknown_entities_compile_to_empty_results() {
    init_tracing();
    let d = Description::some_property(
        PropertyRef::new("Twinned with"),
        Description::value(DataItem::Page(EntityRef::page("Atlantis")), Comparator::Eq),
    );
    let compiled = compile::<Sql>(&d, &wiki(), &QueryConfig::default());
    assert!(compiled.condition.is_false());
    assert!(compiled.errors.is_empty());

    // The triple store needs no ids, so the same query stays satisfiable there.
    let compiled = compile::<Sparql>(&d, &wiki(), &QueryConfig::default());
    assert!(!compiled.condition.is_false());
}

#[test]
fn test_compiled_query_explains_as_json() {
    init_tracing();
    let compiled = compile::<Sql>(&large_cities_in_france_or_germany(), &wiki(), &QueryConfig::default());
    let explain = serde_json::to_value(&compiled).expect("compiled query should serialize");
    assert_eq!(explain["condition"]["kind"]["kind"], "where");
    assert_eq!(explain["errors"], serde_json::json!([]));
    assert!(explain["condition"]["join_tables"]
        .as_array()
        .is_some_and(|tables| tables.iter().any(|t| t == "smw_fpt_inst")));
}
