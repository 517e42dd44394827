use super::{ClassDescription, Description, FingerprintCache};
use crate::digest::fingerprint_of;
use crate::features::QueryFeatures;
use crate::print_request::PrintRequest;
use std::collections::BTreeSet;

/// At least one part must hold.
///
/// Parts are keyed by fingerprint, so inserting an equivalent description
/// twice keeps only the first. Class descriptions are folded into one running
/// accumulator per mergeability group (polarity and hierarchy depth), which
/// makes the result independent of insertion order. Inserting the plain
/// thing description turns the whole disjunction into "true".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Disjunction {
    parts: Vec<Description>,
    keys: Vec<String>,
    /// Indices into `parts` of the class accumulators.
    class_accumulators: Vec<usize>,
    trivially_true: bool,
    pub print_requests: Vec<PrintRequest>,
    fingerprint: FingerprintCache,
}

impl Disjunction {
    pub fn new(parts: impl IntoIterator<Item = Description>) -> Self {
        let mut d = Self::default();
        for part in parts {
            d.add(part);
        }
        d
    }

    pub fn add(&mut self, mut description: Description) {
        self.print_requests.extend(description.take_print_requests());
        if self.trivially_true {
            return;
        }
        match description {
            Description::Thing(t) if !t.negated => self.make_trivially_true(),
            Description::Disjunction(inner) => {
                if inner.trivially_true {
                    self.make_trivially_true();
                } else {
                    for part in inner.parts {
                        self.insert_part(part);
                    }
                }
            }
            other => self.insert_part(other),
        }
        self.fingerprint.invalidate();
    }

    /// By-value form of [`Self::add`].
    pub fn with(mut self, description: Description) -> Self {
        self.add(description);
        self
    }

    fn make_trivially_true(&mut self) {
        self.trivially_true = true;
        self.parts.clear();
        self.keys.clear();
        self.class_accumulators.clear();
    }

    fn insert_part(&mut self, description: Description) {
        if let Description::Class(class) = description {
            self.insert_class(class);
        } else {
            self.insert_keyed(description);
        }
    }

    fn insert_class(&mut self, class: ClassDescription) {
        let target = self.class_accumulators.iter().copied().find(|&idx| {
            matches!(&self.parts[idx], Description::Class(acc) if acc.is_mergeable(&class))
        });
        match target {
            Some(idx) => {
                if let Description::Class(acc) = &mut self.parts[idx] {
                    acc.merge(&class);
                }
                self.keys[idx] = self.parts[idx].fingerprint();
            }
            None => {
                if self.insert_keyed(Description::Class(class)) {
                    self.class_accumulators.push(self.parts.len() - 1);
                }
            }
        }
    }

    /// Returns whether the description was new.
    fn insert_keyed(&mut self, description: Description) -> bool {
        let key = description.fingerprint();
        if self.keys.contains(&key) {
            return false;
        }
        self.keys.push(key);
        self.parts.push(description);
        true
    }

    pub fn is_trivially_true(&self) -> bool {
        self.trivially_true
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
            .fold(QueryFeatures::DISJUNCTION, |acc, p| acc | p.query_features())
    }

    pub fn fingerprint(&self) -> String {
        self.fingerprint.get_or_compute(|| {
            if self.trivially_true {
                return fingerprint_of("D", ["+"]);
            }
            let parts: BTreeSet<&String> = self.keys.iter().collect();
            fingerprint_of("D", parts)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Comparator, DataItem, EntityRef, PropertyRef};

    fn class(name: &str) -> Description {
        Description::class(EntityRef::category(name))
    }

    fn negated_class(name: &str) -> Description {
        Description::Class(ClassDescription::single(EntityRef::category(name)).negate())
    }

    #[test]
    fn thing_makes_disjunction_trivially_true() {
        let mut d = Disjunction::new([class("A"), Description::namespace(0)]);
        d.add(Description::thing());
        assert!(d.is_trivially_true());
        assert!(d.is_empty());
        d.add(class("B"));
        assert!(d.is_empty());
        assert_eq!(d.size(), 0);
    }

    #[test]
    fn nested_disjunctions_are_flattened_and_deduplicated() {
        let v = Description::value(DataItem::Number(1.0), Comparator::Eq);
        let inner = Description::or([v.clone(), Description::namespace(0)]);
        let d = Disjunction::new([v, inner]);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn mergeable_classes_fold_into_one_part() {
        let d = Disjunction::new([class("Company"), class("Nonprofit")]);
        assert_eq!(d.len(), 1);
        match &d.parts()[0] {
            Description::Class(c) => assert_eq!(c.size(), 2),
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn mixed_polarity_classes_stay_apart() {
        let d = Disjunction::new([class("A"), negated_class("B"), class("C")]);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn class_merge_refreshes_fingerprint() {
        let mut d = Disjunction::new([class("A")]);
        let before = d.fingerprint();
        d.add(class("B"));
        assert_ne!(before, d.fingerprint());
        let direct = Disjunction::new([Description::Class(
            ClassDescription::new([EntityRef::category("A"), EntityRef::category("B")]).unwrap(),
        )]);
        assert_eq!(d.fingerprint(), direct.fingerprint());
    }

    #[test]
    fn print_requests_move_even_when_trivially_true() {
        let mut d = Disjunction::new([Description::thing()]);
        d.add(class("A").with_print_request(PrintRequest::property(PropertyRef::new("P"))));
        assert_eq!(d.print_requests.len(), 1);
    }
}
