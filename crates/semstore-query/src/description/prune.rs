//! Budget enforcement for descriptions.
//!
//! Size is a whole-query resource: siblings draw from one shrinking budget.
//! Depth is a per-path property: every branch starts from the depth budget of
//! its parent. Discarded sub-descriptions are replaced by the thing
//! description (keeping their print requests) and their query text is logged.

use super::{Conjunction, Description, Disjunction, SomeProperty, ThingDescription};
use crate::print_request::PrintRequest;

/// Result of pruning one description.
#[derive(Debug, Clone, PartialEq)]
pub struct PruneOutcome {
    pub description: Description,
    pub remaining_size: usize,
    pub remaining_depth: usize,
    /// Query text of every discarded sub-description, in discovery order.
    pub log: Vec<String>,
}

impl Description {
    /// Prune this description to fit `max_size` and `max_depth`.
    pub fn prune(&self, max_size: usize, max_depth: usize) -> PruneOutcome {
        match self {
            Description::Conjunction(c) => prune_conjunction(self, c, max_size, max_depth),
            Description::Disjunction(d) => prune_disjunction(self, d, max_size, max_depth),
            Description::SomeProperty(p) => prune_some_property(self, p, max_size, max_depth),
            Description::Class(c) => {
                let size = c.size();
                if max_size >= size {
                    kept(self.clone(), max_size - size, max_depth)
                } else if max_size == 0 {
                    discarded(self, max_size, max_depth)
                } else {
                    let (head, tail) = c.split_at(max_size);
                    let text = Description::Class(tail).query_string(false);
                    tracing::debug!(discarded = %text, "pruned classes exceeding size budget");
                    PruneOutcome {
                        description: Description::Class(head),
                        remaining_size: 0,
                        remaining_depth: max_depth,
                        log: vec![text],
                    }
                }
            }
            _ => {
                let (size, depth) = (self.size(), self.depth());
                if max_size < size || max_depth < depth {
                    discarded(self, max_size, max_depth)
                } else {
                    kept(self.clone(), max_size - size, max_depth - depth)
                }
            }
        }
    }
}

fn kept(description: Description, remaining_size: usize, remaining_depth: usize) -> PruneOutcome {
    PruneOutcome {
        description,
        remaining_size,
        remaining_depth,
        log: Vec::new(),
    }
}

fn thing_with(print_requests: Vec<PrintRequest>) -> Description {
    Description::Thing(ThingDescription {
        negated: false,
        print_requests,
    })
}

fn discarded(original: &Description, remaining_size: usize, remaining_depth: usize) -> PruneOutcome {
    let text = original.query_string(false);
    tracing::debug!(discarded = %text, "pruned sub-query exceeding budget");
    PruneOutcome {
        description: thing_with(original.print_requests().to_vec()),
        remaining_size,
        remaining_depth,
        log: vec![text],
    }
}

/// Collapse a recombined junction: one part is unwrapped, none yields `None`.
fn simplify(parts: Vec<Description>, rebuild: impl FnOnce(Vec<Description>) -> Description) -> Option<Description> {
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next(),
        _ => Some(rebuild(parts)),
    }
}

/// Prune every part against one shared size budget, restarting the depth
/// budget for each of them.
fn prune_parts(
    parts: &[Description],
    max_size: usize,
    max_depth: usize,
    mut keep: impl FnMut(Description),
) -> (usize, usize, Vec<String>) {
    let mut size = max_size;
    let mut new_depth = max_depth;
    let mut log = Vec::new();
    for part in parts {
        let outcome = part.prune(size, max_depth);
        size = outcome.remaining_size;
        new_depth = new_depth.min(outcome.remaining_depth);
        log.extend(outcome.log);
        keep(outcome.description);
    }
    (size, new_depth, log)
}

fn prune_conjunction(
    original: &Description,
    conjunction: &Conjunction,
    max_size: usize,
    max_depth: usize,
) -> PruneOutcome {
    let mut result = Conjunction::default();
    let (size, new_depth, log) = prune_parts(conjunction.parts(), max_size, max_depth, |d| result.add(d));
    let description = simplify(result.into_parts(), Description::and)
        .unwrap_or_else(Description::thing);
    finish(original, description, size, new_depth, log)
}

fn prune_disjunction(
    original: &Description,
    disjunction: &Disjunction,
    max_size: usize,
    max_depth: usize,
) -> PruneOutcome {
    if disjunction.is_trivially_true() || disjunction.is_empty() {
        return kept(original.clone(), max_size, max_depth);
    }
    let mut result = Disjunction::default();
    let (size, new_depth, log) = prune_parts(disjunction.parts(), max_size, max_depth, |d| result.add(d));
    match simplify(result.into_parts(), Description::or) {
        Some(description) => finish(original, description, size, new_depth, log),
        // A discarded part turned into the thing description and made the
        // whole disjunction true: the node as a whole is lost.
        None if !log.is_empty() => discarded(original, size, max_depth),
        None => finish(original, Description::thing(), size, new_depth, log),
    }
}

/// Attach the original node's print requests to its pruned replacement.
fn finish(
    original: &Description,
    mut description: Description,
    remaining_size: usize,
    remaining_depth: usize,
    log: Vec<String>,
) -> PruneOutcome {
    *description.print_requests_mut() = original.print_requests().to_vec();
    PruneOutcome {
        description,
        remaining_size,
        remaining_depth,
        log,
    }
}

fn prune_some_property(
    original: &Description,
    restriction: &SomeProperty,
    max_size: usize,
    max_depth: usize,
) -> PruneOutcome {
    if max_size == 0 || max_depth == 0 {
        return discarded(original, max_size, max_depth);
    }
    let inner = restriction.description().prune(max_size - 1, max_depth - 1);
    let mut pruned = SomeProperty::new(restriction.property().clone(), inner.description);
    pruned.print_requests = original.print_requests().to_vec();
    PruneOutcome {
        description: Description::SomeProperty(pruned),
        remaining_size: inner.remaining_size,
        remaining_depth: inner.remaining_depth,
        log: inner.log,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Comparator, DataItem, EntityRef, PropertyRef};
    use crate::description::ClassDescription;

    fn value(n: f64) -> Description {
        Description::value(DataItem::Number(n), Comparator::Eq)
    }

    #[test]
    fn small_description_is_kept() {
        let d = Description::and([value(1.0), value(2.0)]);
        let out = d.prune(5, 5);
        assert_eq!(out.description, d);
        assert_eq!(out.remaining_size, 3);
        assert!(out.log.is_empty());
    }

    #[test]
    fn leaf_over_budget_becomes_thing_with_print_requests() {
        let d = value(1.0).with_print_request(PrintRequest::this("Page"));
        let out = d.prune(0, 5);
        assert!(out.description.is_thing());
        assert_eq!(out.description.print_requests().len(), 1);
        assert_eq!(out.log, vec!["[[:1]]".to_string()]);
    }

    #[test]
    fn conjunction_shares_size_budget() {
        let d = Description::and([value(1.0), value(2.0), value(3.0)]);
        let out = d.prune(2, 5);
        assert_eq!(out.description.size(), 2);
        assert_eq!(out.log, vec!["[[:3]]".to_string()]);
    }

    #[test]
    fn single_surviving_part_is_unwrapped() {
        let d = Description::and([value(1.0), value(2.0)]);
        let out = d.prune(1, 5);
        assert_eq!(out.description, value(1.0));
    }

    #[test]
    fn deep_property_chain_is_cut() {
        let d = SomeProperty::chain(
            &[PropertyRef::new("A"), PropertyRef::new("B"), PropertyRef::new("C")],
            value(1.0),
        );
        let out = d.prune(10, 2);
        assert!(out.description.depth() <= 2);
        assert_eq!(out.description.query_string(false), "[[A.B::+]]");
        assert_eq!(out.log, vec!["[[C::1]]".to_string()]);
    }

    #[test]
    fn depth_budget_resets_per_branch() {
        let d = Description::and([
            Description::some_property(PropertyRef::new("P"), value(1.0)),
            Description::some_property(PropertyRef::new("Q"), value(2.0)),
        ]);
        let out = d.prune(10, 1);
        assert_eq!(out.description, d);
        assert!(out.log.is_empty());
    }

    #[test]
    fn class_description_splits() {
        let c = ClassDescription::new([
            EntityRef::category("A"),
            EntityRef::category("B"),
            EntityRef::category("C"),
        ])
        .unwrap();
        let out = Description::Class(c).prune(2, 1);
        assert_eq!(out.description.size(), 2);
        assert_eq!(out.remaining_size, 0);
        assert_eq!(out.log, vec!["[[Category:C]]".to_string()]);
    }

    #[test]
    fn conjunction_losing_every_part_becomes_thing() {
        let d = Description::and([value(1.0), value(2.0)])
            .with_print_request(PrintRequest::this("Page"));
        let out = d.prune(0, 5);
        assert!(out.description.is_thing());
        assert_eq!(out.description.print_requests().len(), 1);
        assert_eq!(out.log, vec!["[[:1]]".to_string(), "[[:2]]".to_string()]);
    }

    #[test]
    fn disjunction_losing_a_part_becomes_thing() {
        let d = Description::or([value(1.0), value(2.0)]);
        let out = d.prune(1, 5);
        assert!(out.description.is_thing());
        assert_eq!(out.log, vec![d.query_string(false)]);
    }
}
