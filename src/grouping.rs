//! Partitioning of annotated taxa by (family, genetic code).
//!
//! A family whose members all share one genetic code is represented by the
//! family taxid alone. A family that mixes codes is split by walking its
//! subtree and keeping the taxa whose own code matches each partition.

use itertools::Itertools;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::taxonomy::{TaxId, TaxonomyTree, FAMILY_RANK};

/// One row of the taxid annotation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRow {
    /// Group label; normally the enclosing family name.
    pub family: String,
    pub taxid: TaxId,
    pub rank: String,
    #[serde(default)]
    pub scientific_name: String,
    pub genetic_code: u32,
    #[serde(default)]
    pub lineage: String,
}

impl AnnotationRow {
    pub fn new(family: &str, taxid: TaxId, rank: &str, genetic_code: u32) -> Self {
        AnnotationRow {
            family: family.to_string(),
            taxid,
            rank: rank.to_string(),
            scientific_name: String::new(),
            genetic_code,
            lineage: String::new(),
        }
    }

    fn is_family(&self) -> bool {
        self.rank == FAMILY_RANK
    }
}

/// How a group's taxids were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStrategy {
    /// Single genetic code: family row(s), or every listed taxid if none.
    SingleCode,
    /// Mixed codes: family subtree filtered by genetic code.
    Subtree,
    /// Mixed codes without a family row: listed taxids with that code.
    ListedTaxa,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxidGroup {
    pub label: String,
    pub genetic_code: u32,
    pub strategy: GroupStrategy,
    /// Deduplicated, ascending.
    pub taxids: Vec<TaxId>,
}

impl TaxidGroup {
    /// `<label>_<genetic code>`, the stem of the group's taxid file.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.label, self.genetic_code)
    }
}

pub struct GeneticCodeGrouper<'a> {
    tree: &'a TaxonomyTree,
}

impl<'a> GeneticCodeGrouper<'a> {
    pub fn new(tree: &'a TaxonomyTree) -> Self {
        GeneticCodeGrouper { tree }
    }

    /// Groups `rows` by label and genetic code.
    ///
    /// Labels are processed in parallel on the current rayon pool. The result is
    /// sorted by (label, genetic code).
    pub fn group(&self, rows: &[AnnotationRow]) -> Vec<TaxidGroup> {
        let by_label: Vec<(&str, Vec<&AnnotationRow>)> = rows
            .iter()
            .into_group_map_by(|row| row.family.as_str())
            .into_iter()
            .collect();

        let mixed = by_label
            .iter()
            .filter(|(_, members)| distinct_codes(members).len() > 1)
            .count();
        info!(
            "{} group label(s), {} with multiple genetic codes",
            by_label.len(),
            mixed
        );

        let mut groups: Vec<TaxidGroup> = by_label
            .par_iter()
            .flat_map_iter(|(label, members)| self.group_label(label, members))
            .collect();
        groups.sort_by(|a, b| {
            a.label
                .cmp(&b.label)
                .then(a.genetic_code.cmp(&b.genetic_code))
        });
        groups
    }

    fn group_label(&self, label: &str, members: &[&AnnotationRow]) -> Vec<TaxidGroup> {
        let codes = distinct_codes(members);
        let families: Vec<TaxId> = members
            .iter()
            .filter(|row| row.is_family())
            .map(|row| row.taxid)
            .collect();

        if codes.len() == 1 {
            let code = codes.into_iter().next().unwrap_or_default();
            let taxids = if families.is_empty() {
                members.iter().map(|row| row.taxid).collect()
            } else {
                families
            };
            return vec![finish(label, code, GroupStrategy::SingleCode, taxids)];
        }

        codes
            .into_iter()
            .map(|code| {
                if families.is_empty() {
                    let listed = members
                        .iter()
                        .filter(|row| row.genetic_code == code)
                        .map(|row| row.taxid)
                        .collect();
                    finish(label, code, GroupStrategy::ListedTaxa, listed)
                } else {
                    let matching = families
                        .iter()
                        .flat_map(|&family| self.tree.descendants_with_genetic_code(family, code))
                        .collect();
                    finish(label, code, GroupStrategy::Subtree, matching)
                }
            })
            .collect()
    }
}

fn distinct_codes(members: &[&AnnotationRow]) -> BTreeSet<u32> {
    members.iter().map(|row| row.genetic_code).collect()
}

fn finish(label: &str, genetic_code: u32, strategy: GroupStrategy, taxids: Vec<TaxId>) -> TaxidGroup {
    let taxids: Vec<TaxId> = taxids.into_iter().sorted_unstable().dedup().collect();
    debug!(
        "{}_{}: {} taxid(s) via {:?}",
        label,
        genetic_code,
        taxids.len(),
        strategy
    );
    TaxidGroup {
        label: label.to_string(),
        genetic_code,
        strategy,
        taxids,
    }
}
