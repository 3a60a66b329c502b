//! Fresh-name allocation for generated classes and instance bindings.
//!
//! One allocator lives for exactly one pipeline run and is threaded through
//! the synthesizer and rewriter. No state survives a run, so converting a
//! batch of documents always numbers each document's holders from one.

use crate::model::{NodeId, SemanticDocument};

const HOLDER_BASENAME: &str = "LiftedLambda";
const INSTANCE_BASENAME: &str = "lifted";

/// Allocates names that are guaranteed not to collide with any symbol
/// visible at the requesting site, per the document's visibility query.
#[derive(Debug, Default)]
pub struct NameAllocator {
    next_holder: u32,
    next_instance: u32,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free holder class name, checked against symbols visible at `at`.
    pub fn holder_name(&mut self, doc: &dyn SemanticDocument, at: NodeId) -> String {
        loop {
            self.next_holder += 1;
            let candidate = format!("{}{}", HOLDER_BASENAME, self.next_holder);
            if !doc.is_name_visible_at(at, &candidate) {
                return candidate;
            }
        }
    }

    /// Next free instance binding name, checked against symbols visible at
    /// `at`.
    pub fn instance_name(&mut self, doc: &dyn SemanticDocument, at: NodeId) -> String {
        loop {
            self.next_instance += 1;
            let candidate = format!("{}{}", INSTANCE_BASENAME, self.next_instance);
            if !doc.is_name_visible_at(at, &candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeDocument;

    #[test]
    fn test_names_skip_visible_symbols() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();
        doc.add_visible_name("LiftedLambda1");
        doc.add_visible_name("lifted1");
        doc.add_visible_name("lifted2");

        let mut names = NameAllocator::new();
        assert_eq!(names.holder_name(&doc, root), "LiftedLambda2");
        assert_eq!(names.instance_name(&doc, root), "lifted3");
    }

    #[test]
    fn test_counters_are_independent() {
        let mut doc = FakeDocument::new();
        let root = doc.push_root();

        let mut names = NameAllocator::new();
        assert_eq!(names.holder_name(&doc, root), "LiftedLambda1");
        assert_eq!(names.holder_name(&doc, root), "LiftedLambda2");
        assert_eq!(names.instance_name(&doc, root), "lifted1");
    }
}
