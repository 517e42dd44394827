//! Cycle detection for concept resolution.
//!
//! Concepts are stored queries that may reference other concepts. While one
//! concept is being compiled its key stays marked; re-entering it more often
//! than the configured recursion depth is a cycle.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Per-compilation mark counter keyed by concept fingerprint.
///
/// Marks are released when the returned [`ReferenceMark`] is dropped, so every
/// exit path of the caller (including the cycle path) unmarks.
#[derive(Debug, Clone)]
pub struct CircularReferenceGuard {
    marks: Rc<RefCell<HashMap<String, usize>>>,
    max_recursion_depth: usize,
}

impl CircularReferenceGuard {
    pub fn new(max_recursion_depth: usize) -> Self {
        Self {
            marks: Rc::new(RefCell::new(HashMap::new())),
            max_recursion_depth,
        }
    }

    pub fn mark(&self, key: &str) -> ReferenceMark {
        *self.marks.borrow_mut().entry(key.to_string()).or_insert(0) += 1;
        ReferenceMark {
            marks: Rc::clone(&self.marks),
            key: key.to_string(),
        }
    }

    pub fn count(&self, key: &str) -> usize {
        self.marks.borrow().get(key).copied().unwrap_or(0)
    }

    pub fn is_circular(&self, key: &str) -> bool {
        self.count(key) > self.max_recursion_depth
    }

    /// True when no key is currently marked.
    pub fn is_idle(&self) -> bool {
        self.marks.borrow().is_empty()
    }
}

/// A live mark; dropping it unmarks the key.
#[derive(Debug)]
pub struct ReferenceMark {
    marks: Rc<RefCell<HashMap<String, usize>>>,
    key: String,
}

impl Drop for ReferenceMark {
    fn drop(&mut self) {
        let mut marks = self.marks.borrow_mut();
        if let Some(count) = marks.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                marks.remove(&self.key);
            }
        }
    }
}
