//! SPARQL terms for entities, properties and literals.
//!
//! Entity and property names are exported as prefixed names: every character
//! outside `[A-Za-z0-9_]` is written as `-XX` per UTF-8 byte, so the local
//! part is always a valid prefixed-name local part.

use semstore_query::data::format_number;
use semstore_query::{DataItem, EntityRef, PropertyRef, SparqlConfig};
use std::fmt::Write as _;

pub const SWIVT: &str = "http://semantic-mediawiki.org/swivt/1.0#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Escape a name into a prefixed-name local part.
pub fn encode_local_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(&mut out, "-{:02X}", b);
            }
        }
    }
    out
}

/// Write `uri` as an IRI reference, percent-encoding the characters an
/// `IRIREF` may not contain.
pub fn iri_ref(uri: &str) -> String {
    let mut out = String::with_capacity(uri.len() + 2);
    out.push('<');
    for c in uri.chars() {
        if c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(&mut out, "%{:02X}", b);
            }
        } else {
            out.push(c);
        }
    }
    out.push('>');
    out
}

/// Quote `text` as a SPARQL string literal.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Characters escaped in XPath regular expressions.
const REGEX_META: &[char] = &['\\', '^', '$', '.', '|', '+', '(', ')', '[', ']', '{', '}', '-'];

/// Translate a `*`/`?` wildcard pattern into an anchored regular expression.
///
/// Regex metacharacters are escaped before the wildcards are remapped, so
/// `Foo*Bar?` becomes `^Foo.*Bar.$` and a literal `.` stays literal.
pub fn like_pattern_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c if REGEX_META.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

/// Prefixes and term constructors for one wiki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    wiki_base: String,
}

impl Vocabulary {
    pub fn new(config: &SparqlConfig) -> Self {
        Self {
            wiki_base: config.wiki_base_uri.clone(),
        }
    }

    /// Expansion of a prefix used by the compiled patterns.
    pub fn namespace_uri(&self, prefix: &str) -> Option<String> {
        match prefix {
            "wiki" => Some(self.wiki_base.clone()),
            "property" => Some(format!("{}Property-3A", self.wiki_base)),
            "swivt" => Some(SWIVT.to_string()),
            "rdf" => Some(RDF.to_string()),
            "rdfs" => Some(RDFS.to_string()),
            "xsd" => Some(XSD.to_string()),
            _ => None,
        }
    }

    pub fn entity(&self, entity: &EntityRef) -> String {
        let name = entity.prefixed_text().replace(' ', "_");
        format!("wiki:{}", encode_local_name(&name))
    }

    pub fn property(&self, property: &PropertyRef) -> String {
        format!("property:{}", encode_local_name(&property.key.replace(' ', "_")))
    }

    /// Term for a data item and the prefix it needs, if any.
    pub fn data_item(&self, item: &DataItem) -> (String, Option<&'static str>) {
        match item {
            DataItem::Page(page) => (self.entity(page), Some("wiki")),
            DataItem::Blob(s) => (string_literal(s), None),
            DataItem::Number(n) => (
                format!("{}^^xsd:double", string_literal(&format_number(*n))),
                Some("xsd"),
            ),
            DataItem::Boolean(b) => (format!("\"{b}\"^^xsd:boolean"), Some("xsd")),
            DataItem::Uri(uri) => (iri_ref(uri), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_names_escape_non_word_characters() {
        assert_eq!(encode_local_name("Category:Foo"), "Category-3AFoo");
        assert_eq!(encode_local_name("A-B"), "A-2DB");
        assert_eq!(encode_local_name("Zürich"), "Z-C3-BCrich");
    }

    #[test]
    fn like_patterns_escape_then_remap() {
        assert_eq!(like_pattern_to_regex("Foo*Bar?"), "^Foo.*Bar.$");
        assert_eq!(like_pattern_to_regex("a.b*"), "^a\\.b.*$");
    }

    #[test]
    fn entities_use_wiki_prefix() {
        let vocab = Vocabulary::new(&SparqlConfig::default());
        assert_eq!(vocab.entity(&EntityRef::category("Big Company")), "wiki:Category-3ABig_Company");
        assert_eq!(vocab.property(&PropertyRef::new("Located in")), "property:Located_in");
        assert_eq!(
            vocab.namespace_uri("property").as_deref(),
            Some("http://example.org/id/Property-3A")
        );
    }

    #[test]
    fn uris_encode_characters_illegal_in_iris() {
        assert_eq!(iri_ref("http://example.org/a?b=c#d"), "<http://example.org/a?b=c#d>");
        assert_eq!(
            iri_ref("http://example.org/a b>\"c{d}"),
            "<http://example.org/a%20b%3E%22c%7Bd%7D>"
        );
        let vocab = Vocabulary::new(&SparqlConfig::default());
        assert_eq!(
            vocab.data_item(&DataItem::Uri("http://x.org/|^`\\".into())).0,
            "<http://x.org/%7C%5E%60%5C>"
        );
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(string_literal("say \"hi\""), "\"say \\\"hi\\\"\"");
        let vocab = Vocabulary::new(&SparqlConfig::default());
        assert_eq!(vocab.data_item(&DataItem::Number(5.0)).0, "\"5\"^^xsd:double");
    }
}
