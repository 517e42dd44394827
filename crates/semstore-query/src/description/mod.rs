//! The query description algebra.
//!
//! A [`Description`] is the backend-agnostic form of a query: a tree over
//! class membership, property restrictions, value comparisons, namespace
//! filters, concept references, conjunction and disjunction. Trees are built
//! once per query (by the external parser), pruned once and compiled once.
//!
//! Only two nodes have in-place mutators, [`Conjunction`] and
//! [`Disjunction`] (plus [`ClassDescription::merge`] used by the latter).
//! Every mutator invalidates the cached fingerprint of the node it touches.

mod class;
mod conjunction;
mod disjunction;
mod prune;
mod query_string;
mod some_property;

pub use class::ClassDescription;
pub use conjunction::Conjunction;
pub use disjunction::Disjunction;
pub use prune::PruneOutcome;
pub use some_property::SomeProperty;

use crate::data::{Comparator, DataItem, EntityRef, PropertyRef};
use crate::digest::fingerprint_of;
use crate::features::QueryFeatures;
use crate::print_request::PrintRequest;
use std::fmt;
use std::sync::OnceLock;

// ============================================================================
// Fingerprint cache
// ============================================================================

/// Lazily computed fingerprint of a composite node.
///
/// The cache is ignored by equality and reset by every structural mutator.
#[derive(Default)]
pub(crate) struct FingerprintCache(OnceLock<String>);

impl FingerprintCache {
    pub(crate) fn get_or_compute(&self, compute: impl FnOnce() -> String) -> String {
        self.0.get_or_init(compute).clone()
    }

    pub(crate) fn invalidate(&mut self) {
        self.0 = OnceLock::new();
    }
}

impl Clone for FingerprintCache {
    fn clone(&self) -> Self {
        let cell = OnceLock::new();
        if let Some(value) = self.0.get() {
            let _ = cell.set(value.clone());
        }
        Self(cell)
    }
}

impl fmt::Debug for FingerprintCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get() {
            Some(value) => write!(f, "FingerprintCache({value})"),
            None => f.write_str("FingerprintCache(<unset>)"),
        }
    }
}

impl PartialEq for FingerprintCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

// ============================================================================
// Leaf descriptions
// ============================================================================

/// The unconstrained description ("any entity").
///
/// A negated thing means "no value" and only has a meaning directly below a
/// property restriction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThingDescription {
    pub negated: bool,
    pub print_requests: Vec<PrintRequest>,
}

impl ThingDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn negated() -> Self {
        Self {
            negated: true,
            print_requests: Vec::new(),
        }
    }
}

/// A comparison of the described value against a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDescription {
    pub value: DataItem,
    /// Property the value belongs to, when known (used for display and typing).
    pub property: Option<PropertyRef>,
    pub comparator: Comparator,
    pub print_requests: Vec<PrintRequest>,
}

impl ValueDescription {
    pub fn new(value: DataItem, property: Option<PropertyRef>, comparator: Comparator) -> Self {
        Self {
            value,
            property,
            comparator,
            print_requests: Vec::new(),
        }
    }

    pub fn equals(value: DataItem) -> Self {
        Self::new(value, None, Comparator::Eq)
    }

    pub fn is_singleton(&self) -> bool {
        self.comparator == Comparator::Eq
    }
}

/// Restricts the namespace of the described entity.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDescription {
    pub namespace: i32,
    pub print_requests: Vec<PrintRequest>,
}

impl NamespaceDescription {
    pub fn new(namespace: i32) -> Self {
        Self {
            namespace,
            print_requests: Vec::new(),
        }
    }
}

/// Reference to a stored, named query.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptDescription {
    pub concept: EntityRef,
    pub print_requests: Vec<PrintRequest>,
}

impl ConceptDescription {
    pub fn new(concept: EntityRef) -> Self {
        Self {
            concept,
            print_requests: Vec::new(),
        }
    }
}

// ============================================================================
// Description
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Description {
    Thing(ThingDescription),
    Value(ValueDescription),
    Class(ClassDescription),
    Namespace(NamespaceDescription),
    Concept(ConceptDescription),
    SomeProperty(SomeProperty),
    Conjunction(Conjunction),
    Disjunction(Disjunction),
}

impl Description {
    pub fn thing() -> Self {
        Description::Thing(ThingDescription::new())
    }

    pub fn value(value: DataItem, comparator: Comparator) -> Self {
        Description::Value(ValueDescription::new(value, None, comparator))
    }

    pub fn class(class: EntityRef) -> Self {
        Description::Class(ClassDescription::single(class))
    }

    pub fn namespace(namespace: i32) -> Self {
        Description::Namespace(NamespaceDescription::new(namespace))
    }

    pub fn concept(concept: EntityRef) -> Self {
        Description::Concept(ConceptDescription::new(concept))
    }

    pub fn some_property(property: PropertyRef, description: Description) -> Self {
        Description::SomeProperty(SomeProperty::new(property, description))
    }

    pub fn and(parts: impl IntoIterator<Item = Description>) -> Self {
        Description::Conjunction(Conjunction::new(parts))
    }

    pub fn or(parts: impl IntoIterator<Item = Description>) -> Self {
        Description::Disjunction(Disjunction::new(parts))
    }

    /// True for the plain (non-negated) thing description.
    pub fn is_thing(&self) -> bool {
        matches!(self, Description::Thing(t) if !t.negated)
    }

    /// Whether the description denotes at most one value.
    pub fn is_singleton(&self) -> bool {
        match self {
            Description::Value(v) => v.is_singleton(),
            Description::Conjunction(c) => c.parts().iter().any(Description::is_singleton),
            _ => false,
        }
    }

    /// Cost of the description in budget units.
    pub fn size(&self) -> usize {
        match self {
            Description::Thing(_) => 0,
            Description::Value(_) | Description::Namespace(_) | Description::Concept(_) => 1,
            Description::Class(c) => c.size(),
            Description::SomeProperty(p) => p.size(),
            Description::Conjunction(c) => c.size(),
            Description::Disjunction(d) => d.size(),
        }
    }

    /// Property nesting depth.
    pub fn depth(&self) -> usize {
        match self {
            Description::SomeProperty(p) => p.depth(),
            Description::Conjunction(c) => c.depth(),
            Description::Disjunction(d) => d.depth(),
            _ => 0,
        }
    }

    pub fn query_features(&self) -> QueryFeatures {
        match self {
            Description::Thing(_) | Description::Value(_) => QueryFeatures::NONE,
            Description::Class(_) => QueryFeatures::CATEGORY,
            Description::Namespace(_) => QueryFeatures::NAMESPACE,
            Description::Concept(_) => QueryFeatures::CONCEPT,
            Description::SomeProperty(p) => p.query_features(),
            Description::Conjunction(c) => c.query_features(),
            Description::Disjunction(d) => d.query_features(),
        }
    }

    /// Stable content hash, insensitive to print requests and to the order of
    /// junction parts.
    pub fn fingerprint(&self) -> String {
        match self {
            Description::Thing(t) => {
                fingerprint_of("T", [if t.negated { "!+" } else { "+" }])
            }
            Description::Value(v) => {
                let property = match &v.property {
                    Some(p) if p.inverse => format!("-{}", p.key),
                    Some(p) => p.key.clone(),
                    None => String::new(),
                };
                fingerprint_of(
                    "V",
                    [
                        v.comparator.code().to_string(),
                        format!("{:?}", v.value.kind()),
                        v.value.hash(),
                        property,
                    ],
                )
            }
            Description::Class(c) => c.fingerprint(),
            Description::Namespace(n) => fingerprint_of("N", [n.namespace.to_string()]),
            Description::Concept(c) => fingerprint_of("Co", [c.concept.hash()]),
            Description::SomeProperty(p) => p.fingerprint(),
            Description::Conjunction(c) => c.fingerprint(),
            Description::Disjunction(d) => d.fingerprint(),
        }
    }

    pub fn print_requests(&self) -> &[PrintRequest] {
        match self {
            Description::Thing(d) => &d.print_requests,
            Description::Value(d) => &d.print_requests,
            Description::Class(d) => &d.print_requests,
            Description::Namespace(d) => &d.print_requests,
            Description::Concept(d) => &d.print_requests,
            Description::SomeProperty(d) => &d.print_requests,
            Description::Conjunction(d) => &d.print_requests,
            Description::Disjunction(d) => &d.print_requests,
        }
    }

    pub fn print_requests_mut(&mut self) -> &mut Vec<PrintRequest> {
        match self {
            Description::Thing(d) => &mut d.print_requests,
            Description::Value(d) => &mut d.print_requests,
            Description::Class(d) => &mut d.print_requests,
            Description::Namespace(d) => &mut d.print_requests,
            Description::Concept(d) => &mut d.print_requests,
            Description::SomeProperty(d) => &mut d.print_requests,
            Description::Conjunction(d) => &mut d.print_requests,
            Description::Disjunction(d) => &mut d.print_requests,
        }
    }

    pub fn with_print_request(mut self, request: PrintRequest) -> Self {
        self.print_requests_mut().push(request);
        self
    }

    /// Move the print requests out of this node, leaving it without any.
    pub fn take_print_requests(&mut self) -> Vec<PrintRequest> {
        std::mem::take(self.print_requests_mut())
    }
}

impl From<ThingDescription> for Description {
    fn from(d: ThingDescription) -> Self {
        Description::Thing(d)
    }
}

impl From<ValueDescription> for Description {
    fn from(d: ValueDescription) -> Self {
        Description::Value(d)
    }
}

impl From<ClassDescription> for Description {
    fn from(d: ClassDescription) -> Self {
        Description::Class(d)
    }
}

impl From<NamespaceDescription> for Description {
    fn from(d: NamespaceDescription) -> Self {
        Description::Namespace(d)
    }
}

impl From<ConceptDescription> for Description {
    fn from(d: ConceptDescription) -> Self {
        Description::Concept(d)
    }
}

impl From<SomeProperty> for Description {
    fn from(d: SomeProperty) -> Self {
        Description::SomeProperty(d)
    }
}

impl From<Conjunction> for Description {
    fn from(d: Conjunction) -> Self {
        Description::Conjunction(d)
    }
}

impl From<Disjunction> for Description {
    fn from(d: Disjunction) -> Self {
        Description::Disjunction(d)
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.query_string(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::NS_CATEGORY;

    fn population_over(n: f64) -> Description {
        Description::some_property(
            PropertyRef::new("Population"),
            Description::Value(ValueDescription::new(
                DataItem::Number(n),
                Some(PropertyRef::new("Population")),
                Comparator::Geq,
            )),
        )
    }

    #[test]
    fn sizes_and_depths_follow_nesting() {
        let d = Description::and([Description::class(EntityRef::category("City")), population_over(5.0)]);
        assert_eq!(d.size(), 3);
        assert_eq!(d.depth(), 1);
        assert_eq!(Description::thing().size(), 0);
    }

    #[test]
    fn features_are_collected_from_parts() {
        let d = Description::or([Description::namespace(NS_CATEGORY), population_over(1.0)]);
        let f = d.query_features();
        assert!(f.contains(QueryFeatures::DISJUNCTION));
        assert!(f.contains(QueryFeatures::NAMESPACE));
        assert!(f.contains(QueryFeatures::PROPERTY));
        assert!(!f.contains(QueryFeatures::CONCEPT));
    }

    #[test]
    fn value_fingerprint_is_comparator_sensitive() {
        let a = Description::value(DataItem::Number(5.0), Comparator::Leq);
        let b = Description::value(DataItem::Number(5.0), Comparator::Geq);
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
    }

    #[test]
    fn value_fingerprint_distinguishes_types() {
        let a = Description::value(DataItem::Number(5.0), Comparator::Eq);
        let b = Description::value(DataItem::Blob("5".into()), Comparator::Eq);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_print_requests() {
        let plain = Description::class(EntityRef::category("City"));
        let projected = plain.clone().with_print_request(PrintRequest::this(""));
        assert_eq!(plain.fingerprint(), projected.fingerprint());
    }

    #[test]
    fn negated_thing_is_not_thing() {
        let d = Description::Thing(ThingDescription::negated());
        assert!(!d.is_thing());
        assert_ne!(d.fingerprint(), Description::thing().fingerprint());
    }
}
