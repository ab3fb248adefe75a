//! Bounded ancestor walk shared by every upward query.

use log::debug;
use std::collections::HashSet;
use std::iter::FusedIterator;

use super::tree::{TaxonNode, TaxonomyTree};
use super::TaxId;

/// Iterator over a taxon and its ancestors, leaf first.
///
/// The designated root is never yielded. The walk ends when it reaches the
/// root, a taxid missing from the tree, a self-parented node, or a node it has
/// already visited. At most `tree.len()` nodes are yielded.
pub struct AncestorWalk<'a> {
    tree: &'a TaxonomyTree,
    start: TaxId,
    next: Option<TaxId>,
    visited: HashSet<TaxId>,
    reached_root: bool,
    cycle: bool,
}

impl<'a> AncestorWalk<'a> {
    pub fn new(tree: &'a TaxonomyTree, start: TaxId) -> Self {
        AncestorWalk {
            tree,
            start,
            next: Some(start),
            visited: HashSet::new(),
            reached_root: false,
            cycle: false,
        }
    }

    /// True once the walk has stopped at the designated root.
    pub fn reached_root(&self) -> bool {
        self.reached_root
    }

    /// True if the walk was cut short by a revisited node.
    pub fn cycle_detected(&self) -> bool {
        self.cycle
    }
}

impl<'a> Iterator for AncestorWalk<'a> {
    type Item = &'a TaxonNode;

    fn next(&mut self) -> Option<Self::Item> {
        let taxid = self.next.take()?;
        if taxid == self.tree.root_taxid() {
            self.reached_root = true;
            return None;
        }
        let node = self.tree.get(taxid)?;

        if self.visited.len() >= self.tree.len() || !self.visited.insert(taxid) {
            self.cycle = true;
            debug!(
                "Cycle at taxid {} while walking ancestors of {}",
                taxid, self.start
            );
            return None;
        }

        self.next = node.parent();
        Some(node)
    }
}

impl FusedIterator for AncestorWalk<'_> {}
