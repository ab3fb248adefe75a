//! Taxonomy engine for partitioning viral genome collections.
//!
//! Loads the NCBI taxonomy dump (`nodes.dmp`, `names.dmp`) into an immutable
//! tree and derives per-taxon facts from it: lineage, enclosing family, genetic
//! code and subtree membership. On top of the tree sit the genetic-code grouper,
//! which decides which taxids represent each (family, genetic code) partition,
//! and a seeded subsampler for clade sampling.

pub mod config;
pub mod grouping;
pub mod io;
pub mod pipeline;
pub mod sampling;
pub mod taxonomy;

pub use config::{EngineConfig, MalformedPolicy};
pub use grouping::{AnnotationRow, GeneticCodeGrouper, GroupStrategy, TaxidGroup};
pub use sampling::RandomSubsampler;
pub use taxonomy::{TaxId, TaxonNode, TaxonomyError, TaxonomyTree};
