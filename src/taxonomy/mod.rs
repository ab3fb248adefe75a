//! NCBI taxonomy engine.
//!
//! The dump is parsed once into an immutable [`TaxonomyTree`]. Lineage, family
//! and clade-membership queries all go through [`AncestorWalk`], which stops on
//! the root, on a missing link, or on a revisited node. Subtree enumeration uses
//! a children index built on first use.

pub mod descendants;
pub mod dump;
pub mod error;
pub mod resolve;
pub mod tree;
pub mod walk;

pub use dump::{DumpParser, DumpStats, NodeRecord, ParseStats};
pub use error::TaxonomyError;
pub use tree::{TaxonNode, TaxonomyTree};
pub use walk::AncestorWalk;

/// NCBI taxonomy identifier.
pub type TaxId = u32;

/// Root of the NCBI taxonomy.
pub const ROOT_TAXID: TaxId = 1;

pub const FAMILY_RANK: &str = "family";

/// Returned by family resolution when no family-rank ancestor exists.
pub const NO_FAMILY: &str = "no_family";

/// Placeholder for a taxon without a recorded scientific name.
pub fn unknown_name(taxid: TaxId) -> String {
    format!("unknown_{}", taxid)
}
