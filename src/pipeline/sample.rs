//! Random selection of taxa of a given rank inside a clade, e.g. RNA virus
//! species under Riboviria.

use log::info;

use crate::sampling::RandomSubsampler;
use crate::taxonomy::{TaxId, TaxonomyTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledTaxon {
    pub taxid: TaxId,
    pub name: String,
}

/// Taxa of exactly `rank` that descend from `clade`, ascending.
pub fn clade_members(tree: &TaxonomyTree, clade: TaxId, rank: &str) -> Vec<TaxId> {
    tree.taxa_with_rank(rank)
        .into_iter()
        .filter(|&taxid| tree.is_descendant_of(taxid, clade))
        .collect()
}

/// Draws up to `n` members of `clade` at `rank`, in draw order.
pub fn sample_clade(
    tree: &TaxonomyTree,
    clade: TaxId,
    rank: &str,
    n: usize,
    sampler: &mut RandomSubsampler,
) -> Vec<SampledTaxon> {
    let members = clade_members(tree, clade, rank);
    info!(
        "Found {} {} taxa under taxid {}",
        members.len(),
        rank,
        clade
    );

    let selected = sampler.sample(&members, n);
    info!("Selected {} of them", selected.len());

    selected
        .into_iter()
        .map(|taxid| SampledTaxon {
            taxid,
            name: tree.name(taxid).unwrap_or("Unknown").to_string(),
        })
        .collect()
}
