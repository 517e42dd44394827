use super::{Description, FingerprintCache};
use crate::data::PropertyRef;
use crate::digest::fingerprint_of;
use crate::features::QueryFeatures;
use crate::print_request::PrintRequest;

/// Existential restriction: the property has some value matching the inner
/// description. Property chains nest one `SomeProperty` inside another.
#[derive(Debug, Clone, PartialEq)]
pub struct SomeProperty {
    property: PropertyRef,
    description: Box<Description>,
    pub print_requests: Vec<PrintRequest>,
    fingerprint: FingerprintCache,
}

impl SomeProperty {
    pub fn new(property: PropertyRef, description: Description) -> Self {
        Self {
            property,
            description: Box::new(description),
            print_requests: Vec::new(),
            fingerprint: FingerprintCache::default(),
        }
    }

    /// Build a chain `A.B.C::value` from its property labels.
    pub fn chain(properties: &[PropertyRef], value: Description) -> Description {
        properties
            .iter()
            .rev()
            .fold(value, |inner, p| Description::some_property(p.clone(), inner))
    }

    pub fn property(&self) -> &PropertyRef {
        &self.property
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn size(&self) -> usize {
        1 + self.description.size()
    }

    pub fn depth(&self) -> usize {
        1 + self.description.depth()
    }

    pub fn query_features(&self) -> QueryFeatures {
        QueryFeatures::PROPERTY | self.description.query_features()
    }

    pub fn fingerprint(&self) -> String {
        self.fingerprint.get_or_compute(|| {
            let direction = if self.property.inverse { "-" } else { "" };
            fingerprint_of(
                "S",
                [
                    format!("{direction}{}", self.property.key),
                    self.description.fingerprint(),
                ],
            )
        })
    }
}
