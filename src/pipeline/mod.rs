pub mod annotate;
pub mod sample;

pub use annotate::{annotate_taxid, annotate_taxid_files, AnnotationSummary};
pub use sample::{clade_members, sample_clade, SampledTaxon};
