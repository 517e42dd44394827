use super::{Description, FingerprintCache};
use crate::digest::fingerprint_of;
use crate::features::QueryFeatures;
use crate::print_request::PrintRequest;
use std::collections::BTreeSet;

/// All parts must hold.
///
/// Insertion flattens nested conjunctions, drops the plain thing description
/// and hoists every inserted node's print requests onto the conjunction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conjunction {
    parts: Vec<Description>,
    pub print_requests: Vec<PrintRequest>,
    fingerprint: FingerprintCache,
}

impl Conjunction {
    pub fn new(parts: impl IntoIterator<Item = Description>) -> Self {
        let mut c = Self::default();
        for part in parts {
            c.add(part);
        }
        c
    }

    pub fn add(&mut self, mut description: Description) {
        self.print_requests.extend(description.take_print_requests());
        match description {
            Description::Thing(t) if !t.negated => {}
            Description::Conjunction(inner) => {
                self.parts.extend(inner.parts);
            }
            other => self.parts.push(other),
        }
        self.fingerprint.invalidate();
    }

    /// By-value form of [`Self::add`].
    pub fn with(mut self, description: Description) -> Self {
        self.add(description);
        self
    }

    pub fn parts(&self) -> &[Description] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Description> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn size(&self) -> usize {
        self.parts.iter().map(Description::size).sum()
    }

    pub fn depth(&self) -> usize {
        self.parts.iter().map(Description::depth).max().unwrap_or(0)
    }

    pub fn query_features(&self) -> QueryFeatures {
        self.parts
            .iter()
            .fold(QueryFeatures::CONJUNCTION, |acc, p| acc | p.query_features())
    }

    pub fn fingerprint(&self) -> String {
        self.fingerprint.get_or_compute(|| {
            let parts: BTreeSet<String> = self.parts.iter().map(Description::fingerprint).collect();
            fingerprint_of("C", parts)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{EntityRef, PropertyRef};
    use crate::description::ThingDescription;

    #[test]
    fn thing_is_absorbed() {
        let c = Conjunction::new([Description::thing(), Description::class(EntityRef::category("A"))]);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn negated_thing_is_kept() {
        let c = Conjunction::new([Description::Thing(ThingDescription::negated())]);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn nested_conjunctions_are_flattened() {
        let inner = Description::and([
            Description::class(EntityRef::category("A")),
            Description::class(EntityRef::category("B")),
        ]);
        let c = Conjunction::new([inner, Description::namespace(0)]);
        assert_eq!(c.len(), 3);
        assert!(c.parts().iter().all(|p| !matches!(p, Description::Conjunction(_))));
    }

    #[test]
    fn print_requests_move_to_parent() {
        let part = Description::class(EntityRef::category("A"))
            .with_print_request(PrintRequest::property(PropertyRef::new("Size")));
        let thing = Description::thing().with_print_request(PrintRequest::this("Page"));
        let c = Conjunction::new([part, thing]);
        assert_eq!(c.print_requests.len(), 2);
        assert_eq!(c.print_requests[0].label, "Size");
        assert!(c.parts()[0].print_requests().is_empty());
    }

    #[test]
    fn fingerprint_ignores_part_order() {
        let a = Description::class(EntityRef::category("A"));
        let n = Description::namespace(0);
        let ab = Conjunction::new([a.clone(), n.clone()]);
        let ba = Conjunction::new([n, a]);
        assert_eq!(ab.fingerprint(), ba.fingerprint());
    }

    #[test]
    fn add_invalidates_fingerprint() {
        let mut c = Conjunction::new([Description::namespace(0)]);
        let before = c.fingerprint();
        c.add(Description::namespace(14));
        assert_ne!(before, c.fingerprint());
    }
}
