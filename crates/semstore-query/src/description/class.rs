use super::FingerprintCache;
use crate::config::QueryConfig;
use crate::data::{EntityRef, NS_CATEGORY};
use crate::digest::fingerprint_of;
use crate::error::{DescriptionError, Result};
use crate::print_request::PrintRequest;
use std::collections::BTreeSet;

/// Membership in any of a set of classes, optionally negated as a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescription {
    classes: Vec<EntityRef>,
    hierarchy_depth: Option<u32>,
    negated: bool,
    pub print_requests: Vec<PrintRequest>,
    fingerprint: FingerprintCache,
}

impl ClassDescription {
    /// Build from a non-empty set of category entities; duplicates are
    /// dropped, first occurrence order is kept.
    pub fn new(classes: impl IntoIterator<Item = EntityRef>) -> Result<Self> {
        let mut unique: Vec<EntityRef> = Vec::new();
        for class in classes {
            if class.namespace != NS_CATEGORY {
                return Err(DescriptionError::NotAClass(class.prefixed_text()));
            }
            if !unique.contains(&class) {
                unique.push(class);
            }
        }
        if unique.is_empty() {
            return Err(DescriptionError::EmptyClassSet);
        }
        Ok(Self {
            classes: unique,
            hierarchy_depth: None,
            negated: false,
            print_requests: Vec::new(),
            fingerprint: FingerprintCache::default(),
        })
    }

    pub fn single(class: EntityRef) -> Self {
        Self {
            classes: vec![class],
            hierarchy_depth: None,
            negated: false,
            print_requests: Vec::new(),
            fingerprint: FingerprintCache::default(),
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self.fingerprint.invalidate();
        self
    }

    /// Limit how many subclass levels membership is inferred through; the
    /// depth is clamped to the configured ceiling.
    pub fn with_hierarchy_depth(mut self, depth: u32, config: &QueryConfig) -> Self {
        self.hierarchy_depth = Some(config.clamp_hierarchy_depth(depth));
        self.fingerprint.invalidate();
        self
    }

    pub fn classes(&self) -> &[EntityRef] {
        &self.classes
    }

    pub fn hierarchy_depth(&self) -> Option<u32> {
        self.hierarchy_depth
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Two class descriptions merge into one only when they share polarity
    /// and hierarchy depth.
    pub fn is_mergeable(&self, other: &ClassDescription) -> bool {
        self.negated == other.negated && self.hierarchy_depth == other.hierarchy_depth
    }

    /// Union `other`'s classes into `self`. Callers check [`Self::is_mergeable`].
    pub fn merge(&mut self, other: &ClassDescription) {
        for class in &other.classes {
            if !self.classes.contains(class) {
                self.classes.push(class.clone());
            }
        }
        self.fingerprint.invalidate();
    }

    pub fn size(&self) -> usize {
        self.classes.len()
    }

    pub fn fingerprint(&self) -> String {
        self.fingerprint.get_or_compute(|| {
            let hashes: BTreeSet<String> = self.classes.iter().map(EntityRef::hash).collect();
            let mark = if self.negated { "!" } else { "" };
            let depth = self
                .hierarchy_depth
                .map(|d| d.to_string())
                .unwrap_or_default();
            let mut components = vec![mark.to_string(), depth];
            components.extend(hashes);
            fingerprint_of("Cl", components)
        })
    }

    /// Split after `keep` classes; used by the pruner.
    pub(crate) fn split_at(&self, keep: usize) -> (ClassDescription, ClassDescription) {
        let mut head = self.clone();
        let mut tail = self.clone();
        head.classes.truncate(keep);
        tail.classes.drain(..keep);
        head.fingerprint.invalidate();
        tail.fingerprint.invalidate();
        tail.print_requests.clear();
        (head, tail)
    }
}
