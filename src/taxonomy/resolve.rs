//! Ancestor-based queries: lineage, nearest family, clade membership.

use super::tree::TaxonomyTree;
use super::{TaxId, FAMILY_RANK, NO_FAMILY};

impl TaxonomyTree {
    /// Scientific names from the root down to `taxid`.
    ///
    /// The root itself is not included. Unnamed taxa appear as
    /// `unknown_<taxid>`. A taxid missing from the tree gives an empty lineage;
    /// a broken or cyclic chain gives whatever was collected before the break.
    pub fn lineage(&self, taxid: TaxId) -> Vec<String> {
        let mut names: Vec<String> = self.ancestors(taxid).map(|n| n.display_name()).collect();
        names.reverse();
        names
    }

    /// [`lineage`](Self::lineage) joined with `;`.
    pub fn lineage_string(&self, taxid: TaxId) -> String {
        self.lineage(taxid).join(";")
    }

    /// Closest taxon at or above `taxid` whose rank equals `rank` exactly.
    pub fn nearest_rank(&self, taxid: TaxId, rank: &str) -> Option<TaxId> {
        self.ancestors(taxid)
            .find(|n| n.rank == rank)
            .map(|n| n.taxid)
    }

    /// Name of the closest family-rank ancestor (or `taxid` itself), else `no_family`.
    pub fn nearest_family(&self, taxid: TaxId) -> String {
        match self.nearest_rank(taxid, FAMILY_RANK) {
            Some(family) => self
                .name(family)
                .map(str::to_string)
                .unwrap_or_else(|| format!("unknown_family_{}", family)),
            None => NO_FAMILY.to_string(),
        }
    }

    /// True if `ancestor` is `taxid` or lies on its parent chain.
    pub fn is_descendant_of(&self, taxid: TaxId, ancestor: TaxId) -> bool {
        let mut walk = self.ancestors(taxid);
        if walk.any(|n| n.taxid == ancestor) {
            return true;
        }
        // The root is never yielded by the walk, only reached.
        ancestor == self.root_taxid() && walk.reached_root()
    }
}
