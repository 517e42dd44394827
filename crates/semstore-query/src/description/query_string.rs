//! Canonical query text for descriptions.
//!
//! The output is what the query parser accepts, so it doubles as a cache key
//! and as the text echoed back in error messages. `as_value` selects the form
//! used in value position (after `::`), where junctions need explicit
//! `<q>…</q>` grouping.

use super::{
    ClassDescription, ConceptDescription, Conjunction, Description, Disjunction,
    NamespaceDescription, SomeProperty, ThingDescription, ValueDescription,
};
use crate::data::{namespace_name, NS_CATEGORY};

impl Description {
    pub fn query_string(&self, as_value: bool) -> String {
        match self {
            Description::Thing(d) => thing_string(d, as_value),
            Description::Value(d) => value_string(d, as_value),
            Description::Class(d) => class_string(d, as_value),
            Description::Namespace(d) => namespace_string(d, as_value),
            Description::Concept(d) => concept_string(d, as_value),
            Description::SomeProperty(d) => some_property_string(d, as_value),
            Description::Conjunction(d) => conjunction_string(d, as_value),
            Description::Disjunction(d) => disjunction_string(d, as_value),
        }
    }
}

fn grouped(inner: &str, as_value: bool) -> String {
    if as_value {
        format!(" <q>{inner}</q> ")
    } else {
        inner.to_string()
    }
}

fn thing_string(d: &ThingDescription, as_value: bool) -> String {
    match (d.negated, as_value) {
        (false, true) => "+".to_string(),
        (false, false) => String::new(),
        (true, true) => "!+".to_string(),
        (true, false) => "[[!+]]".to_string(),
    }
}

fn value_string(d: &ValueDescription, as_value: bool) -> String {
    let text = format!("{}{}", d.comparator.marker(), d.value.wiki_value());
    if as_value {
        text
    } else {
        format!("[[:{text}]]")
    }
}

fn class_string(d: &ClassDescription, as_value: bool) -> String {
    let mut out = String::from("[[");
    if d.is_negated() {
        out.push('!');
    }
    for (i, class) in d.classes().iter().enumerate() {
        if i == 0 {
            out.push_str(&class.prefixed_text());
        } else {
            out.push_str("||");
            out.push_str(&class.text());
        }
    }
    if let Some(depth) = d.hierarchy_depth() {
        out.push_str(&format!("|+depth={depth}"));
    }
    out.push_str("]]");
    grouped(&out, as_value)
}

fn namespace_string(d: &NamespaceDescription, as_value: bool) -> String {
    let name = namespace_name(d.namespace);
    let text = if d.namespace == NS_CATEGORY || name.is_empty() {
        format!("[[:{name}{}+]]", if name.is_empty() { "" } else { ":" })
    } else {
        format!("[[{name}:+]]")
    };
    grouped(&text, as_value)
}

fn concept_string(d: &ConceptDescription, as_value: bool) -> String {
    grouped(&format!("[[{}]]", d.concept.prefixed_text()), as_value)
}

fn some_property_string(d: &SomeProperty, as_value: bool) -> String {
    let mut chain = d.property().label();
    let mut last = chain.clone();
    let mut inner = d.description();
    while !last.starts_with('-') {
        match inner {
            Description::SomeProperty(next) => {
                last = next.property().label();
                chain.push('.');
                chain.push_str(&last);
                inner = next.description();
            }
            _ => break,
        }
    }
    grouped(&format!("[[{chain}::{}]]", inner.query_string(true)), as_value)
}

fn conjunction_string(d: &Conjunction, as_value: bool) -> String {
    let parts: Vec<String> = d
        .parts()
        .iter()
        .map(|p| p.query_string(false))
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        return if as_value { "+".to_string() } else { String::new() };
    }
    grouped(&parts.join(" "), as_value)
}

fn disjunction_string(d: &Disjunction, as_value: bool) -> String {
    if d.is_trivially_true() {
        return "+".to_string();
    }
    let separator = if as_value { "||" } else { " OR " };
    let parts: Vec<String> = d
        .parts()
        .iter()
        .map(|p| {
            let text = p.query_string(as_value);
            if !as_value && matches!(p, Description::SomeProperty(_)) {
                format!("<q>{text}</q>")
            } else {
                text
            }
        })
        .collect();
    let joined = parts.join(separator);
    if as_value {
        joined
    } else {
        format!(" <q>{joined}</q> ")
    }
}
