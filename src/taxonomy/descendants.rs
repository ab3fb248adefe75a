//! Subtree enumeration over the children index.

use std::collections::BTreeSet;

use super::tree::TaxonomyTree;
use super::TaxId;

impl TaxonomyTree {
    /// `root` and every taxon reachable from it through child links.
    ///
    /// Iterative depth-first walk. The result set doubles as the visited set,
    /// so a cycle inside the subtree cannot loop.
    pub fn descendants(&self, root: TaxId) -> BTreeSet<TaxId> {
        let mut found = BTreeSet::from([root]);
        let mut stack = vec![root];

        while let Some(taxid) = stack.pop() {
            for &child in self.children(taxid) {
                if found.insert(child) {
                    stack.push(child);
                }
            }
        }
        found
    }

    /// Members of `descendants(root)` whose own genetic code equals `code`, ascending.
    pub fn descendants_with_genetic_code(&self, root: TaxId, code: u32) -> Vec<TaxId> {
        self.descendants(root)
            .into_iter()
            .filter(|&taxid| self.genetic_code(taxid) == code)
            .collect()
    }
}
