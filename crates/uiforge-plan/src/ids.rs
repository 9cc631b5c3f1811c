//! Identifier allocation
//!
//! Every node in a tree carries a unique id. When a subtree enters an
//! existing tree (an `add`, or replacement children of an `update`), any node
//! whose id is empty or already taken is renumbered.
//!
//! Both collection and allocation walk the tree in pre-order, so the node
//! that keeps a contested id is always the one met first.

use crate::node::Node;
use std::collections::HashSet;

/// Id prefix for element nodes
pub const ELEMENT_ID_PREFIX: &str = "node";

/// Id prefix for text nodes
pub const TEXT_ID_PREFIX: &str = "text";

/// Collect every non-empty id in a tree (pre-order)
#[must_use]
pub fn collect_ids(root: &Node) -> HashSet<String> {
    root.iter()
        .map(Node::id)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Fresh-id allocator seeded from an existing tree
///
/// The counter starts at `|existing ids| + 1` and is bumped before each
/// candidate is tried, so ids handed out are strictly increasing for the
/// allocator's lifetime.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    taken: HashSet<String>,
    counter: u64,
}

impl IdAllocator {
    /// Create allocator with an empty id set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_taken(HashSet::new())
    }

    /// Create allocator over the ids already present in `root`
    #[inline]
    #[must_use]
    pub fn for_tree(root: &Node) -> Self {
        Self::with_taken(collect_ids(root))
    }

    /// Create allocator over an explicit id set
    #[must_use]
    pub fn with_taken(taken: HashSet<String>) -> Self {
        let counter = taken.len() as u64 + 1;
        Self { taken, counter }
    }

    /// Check if an id is already in use
    #[inline]
    #[must_use]
    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    /// Current counter value
    #[inline]
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Give every node of `subtree` a unique id, reserving them all
    ///
    /// Nodes whose id is empty or taken get `<prefix>-<n>`; others keep
    /// their id.
    pub fn assign(&mut self, subtree: &mut Node) {
        if subtree.id().is_empty() || self.taken.contains(subtree.id()) {
            let prefix = if subtree.is_text() {
                TEXT_ID_PREFIX
            } else {
                ELEMENT_ID_PREFIX
            };
            let fresh = self.next_free(prefix);
            subtree.set_id(fresh);
        }
        self.taken.insert(subtree.id().to_owned());

        if let Some(children) = subtree.children_mut() {
            for child in children {
                self.assign(child);
            }
        }
    }

    fn next_free(&mut self, prefix: &str) -> String {
        loop {
            self.counter += 1;
            let candidate = format!("{prefix}-{}", self.counter);
            if !self.taken.contains(&candidate) {
                return candidate;
            }
        }
    }
}

/// Make ids unique across a whole tree in place
///
/// A tree whose ids are already unique and non-empty is left untouched.
pub fn normalize_ids(root: &mut Node) {
    IdAllocator::new().assign(root);
}

/// Check that every id in a tree is non-empty and distinct
#[must_use]
pub fn has_unique_ids(root: &Node) -> bool {
    let mut seen = HashSet::new();
    root.iter().all(|node| !node.id().is_empty() && seen.insert(node.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> Node {
        Node::element("root", "div")
            .with_child(Node::element("node-1", "section").with_child(Node::text("text-2", "a")))
            .with_child(Node::element("node-3", "section"))
    }

    #[test]
    fn collects_all_ids() {
        let ids = collect_ids(&tree());
        assert_eq!(ids.len(), 4);
        assert!(ids.contains("text-2"));
    }

    #[test]
    fn counter_seeded_from_existing_size() {
        let allocator = IdAllocator::for_tree(&tree());
        assert_eq!(allocator.counter(), 5);
    }

    #[test]
    fn colliding_subtree_renumbered_in_pre_order() {
        let mut allocator = IdAllocator::for_tree(&tree());
        let mut incoming = Node::element("node-1", "Card")
            .with_child(Node::text("text-2", "x"))
            .with_child(Node::element("", "Button"));

        allocator.assign(&mut incoming);

        let ids: Vec<&str> = incoming.iter().map(Node::id).collect();
        assert_eq!(ids, vec!["node-6", "text-7", "node-8"]);
    }

    #[test]
    fn non_colliding_ids_are_kept() {
        let mut allocator = IdAllocator::for_tree(&tree());
        let mut incoming = Node::element("fresh", "Card");
        allocator.assign(&mut incoming);
        assert_eq!(incoming.id(), "fresh");
        assert!(allocator.is_taken("fresh"));
    }

    #[test]
    fn duplicates_within_subtree_are_split() {
        let mut incoming = Node::element("dup", "div")
            .with_child(Node::element("dup", "Card"))
            .with_child(Node::text("dup", "t"));
        normalize_ids(&mut incoming);
        assert!(has_unique_ids(&incoming));
        assert_eq!(incoming.id(), "dup");
    }

    #[test]
    fn skips_candidates_already_taken() {
        let existing = Node::element("root", "div").with_child(Node::element("node-4", "Card"));
        let mut allocator = IdAllocator::for_tree(&existing);
        let mut incoming = Node::element("root", "Card");
        allocator.assign(&mut incoming);
        assert_eq!(incoming.id(), "node-5");
    }

    #[test]
    fn normalize_is_noop_on_unique_tree() {
        let original = tree();
        let mut copy = original.clone();
        normalize_ids(&mut copy);
        assert_eq!(copy, original);
    }
}
