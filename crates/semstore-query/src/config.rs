//! Query configuration.
//!
//! Configuration is always passed explicitly; nothing in this workspace reads
//! ambient/global settings.

use crate::features::QueryFeatures;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Limits and switches that shape how queries are pruned and compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Upper bound for the class hierarchy depth a class description may request.
    pub subcategory_depth_ceiling: u32,
    /// Maximal query size (cost units) kept by the pruner.
    pub max_query_size: usize,
    /// Maximal property nesting depth kept by the pruner.
    pub max_query_depth: usize,
    /// How often one concept may be entered on a single resolution path
    /// before it is considered circular.
    pub max_recursion_depth: usize,
    /// Constructs queries may use.
    pub allowed_features: QueryFeatures,
    pub sparql: SparqlConfig,
}

/// Settings for the triple-store backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparqlConfig {
    /// Base IRI under which entities are exported (`wiki:` prefix).
    pub wiki_base_uri: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            subcategory_depth_ceiling: 10,
            max_query_size: 16,
            max_query_depth: 4,
            max_recursion_depth: 1,
            allowed_features: QueryFeatures::ALL,
            sparql: SparqlConfig::default(),
        }
    }
}

impl Default for SparqlConfig {
    fn default() -> Self {
        Self {
            wiki_base_uri: "http://example.org/id/".to_string(),
        }
    }
}

impl QueryConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse query config")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read query config {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Clamp a requested class hierarchy depth to the configured ceiling.
    pub fn clamp_hierarchy_depth(&self, depth: u32) -> u32 {
        depth.min(self.subcategory_depth_ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = QueryConfig::from_json_str(r#"{ "max_query_size": 3 }"#).unwrap();
        assert_eq!(config.max_query_size, 3);
        assert_eq!(config.max_query_depth, 4);
        assert_eq!(config.allowed_features, QueryFeatures::ALL);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = QueryConfig::from_json_str("{ nope").unwrap_err();
        assert!(err.to_string().contains("failed to parse query config"));
    }

    #[test]
    fn config_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("query.json");
        std::fs::write(
            &path,
            r#"{ "allowed_features": 3, "sparql": { "wiki_base_uri": "http://wiki.test/id/" } }"#,
        )
        .unwrap();
        let config = QueryConfig::from_path(&path).unwrap();
        assert_eq!(config.allowed_features, QueryFeatures::PROPERTY | QueryFeatures::CATEGORY);
        assert_eq!(config.sparql.wiki_base_uri, "http://wiki.test/id/");

        let err = QueryConfig::from_path(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read query config"), "{err}");
    }

    #[test]
    fn hierarchy_depth_is_clamped() {
        let config = QueryConfig {
            subcategory_depth_ceiling: 2,
            ..QueryConfig::default()
        };
        assert_eq!(config.clamp_hierarchy_depth(5), 2);
        assert_eq!(config.clamp_hierarchy_depth(1), 1);
    }
}
