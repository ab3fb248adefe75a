//! Builds annotation rows (family, rank, name, genetic code, lineage) for the
//! taxids listed in a directory of taxid files.

use anyhow::Result;
use log::{info, warn};
use std::path::Path;

use crate::grouping::AnnotationRow;
use crate::io;
use crate::taxonomy::{unknown_name, TaxId, TaxonomyTree};

/// Counters reported after an annotation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub files: usize,
    /// Lines that parsed as taxids.
    pub taxids_seen: usize,
    pub rows: usize,
    /// Lines that were not integers.
    pub invalid_lines: usize,
    /// Taxids absent from the taxonomy.
    pub unknown_taxids: usize,
}

impl AnnotationSummary {
    pub fn skipped(&self) -> usize {
        self.invalid_lines + self.unknown_taxids
    }
}

/// Annotation row for one taxid, or `None` if the taxonomy does not know it.
///
/// `family` overrides the family found by walking the lineage.
pub fn annotate_taxid(
    tree: &TaxonomyTree,
    taxid: TaxId,
    family: Option<&str>,
) -> Option<AnnotationRow> {
    let node = tree.get(taxid)?;
    Some(AnnotationRow {
        family: family
            .map(str::to_string)
            .unwrap_or_else(|| tree.nearest_family(taxid)),
        taxid,
        rank: node.rank.clone(),
        scientific_name: node
            .scientific_name
            .clone()
            .unwrap_or_else(|| unknown_name(taxid)),
        genetic_code: node.genetic_code,
        lineage: tree.lineage_string(taxid),
    })
}

/// Annotates every taxid in the `*.txt` files of `input_dir`, in file-name order.
pub fn annotate_taxid_files(
    tree: &TaxonomyTree,
    input_dir: &Path,
    use_filename_family: bool,
) -> Result<(Vec<AnnotationRow>, AnnotationSummary)> {
    let files = io::list_taxid_files(input_dir)?;
    let mut summary = AnnotationSummary::default();
    let mut rows = Vec::new();

    if files.is_empty() {
        warn!("No .txt files found in {}", input_dir.display());
        return Ok((rows, summary));
    }
    info!("Found {} taxid file(s) to process", files.len());

    for path in &files {
        let family = use_filename_family.then(|| io::family_from_filename(path));
        let lines = match io::read_taxid_lines(path) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        };
        summary.files += 1;
        info!("Processing {}: {} taxid(s)", path.display(), lines.len());

        for line in lines {
            let taxid: TaxId = match line.parse() {
                Ok(taxid) => taxid,
                Err(_) => {
                    warn!("Invalid taxid '{}' in {}, skipping", line, path.display());
                    summary.invalid_lines += 1;
                    continue;
                }
            };
            summary.taxids_seen += 1;

            match annotate_taxid(tree, taxid, family.as_deref()) {
                Some(row) => rows.push(row),
                None => {
                    warn!("Taxid {} not found in taxonomy, skipping", taxid);
                    summary.unknown_taxids += 1;
                }
            }
        }
    }

    summary.rows = rows.len();
    info!(
        "Annotated {} taxid(s), skipped {}",
        summary.rows,
        summary.skipped()
    );
    Ok((rows, summary))
}
