//! Immutable indexed view over the parsed dump.

use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use super::dump::DumpParser;
use super::error::TaxonomyError;
use super::walk::AncestorWalk;
use super::TaxId;
use crate::config::EngineConfig;

/// One taxonomy identifier and the facts the dump records for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonNode {
    pub taxid: TaxId,
    /// Equal to `taxid` for the self-parented root.
    pub parent_taxid: TaxId,
    /// Stored verbatim ("species", "no rank", "realm", ...).
    pub rank: String,
    pub genetic_code: u32,
    pub scientific_name: Option<String>,
}

impl TaxonNode {
    /// Parent link, or `None` for a self-parented node.
    pub fn parent(&self) -> Option<TaxId> {
        (self.parent_taxid != self.taxid).then_some(self.parent_taxid)
    }

    /// Scientific name, or `unknown_<taxid>` when the dump has none.
    pub fn display_name(&self) -> String {
        self.scientific_name
            .clone()
            .unwrap_or_else(|| super::unknown_name(self.taxid))
    }
}

#[derive(Debug)]
pub struct TaxonomyTree {
    nodes: HashMap<TaxId, TaxonNode>,
    root_taxid: TaxId,
    default_genetic_code: u32,
    /// parent -> children, built on the first descendant query.
    children: OnceLock<HashMap<TaxId, Vec<TaxId>>>,
}

impl TaxonomyTree {
    pub fn new(nodes: HashMap<TaxId, TaxonNode>, root_taxid: TaxId) -> Self {
        TaxonomyTree {
            nodes,
            root_taxid,
            default_genetic_code: 1,
            children: OnceLock::new(),
        }
    }

    /// Sets the genetic code reported for taxids missing from the tree.
    pub fn with_default_genetic_code(mut self, code: u32) -> Self {
        self.default_genetic_code = code;
        self
    }

    /// Builds the tree from a nodes.dmp / names.dmp pair.
    pub fn from_dump(
        nodes_path: &Path,
        names_path: &Path,
        config: &EngineConfig,
    ) -> Result<Self, TaxonomyError> {
        let parser = DumpParser::from_config(config);
        let (tree, stats) = parser.load(nodes_path, names_path, config.root_taxid)?;
        info!(
            "Taxonomy ready: {} nodes, {} named ({} + {} malformed line(s) skipped)",
            tree.len(),
            stats.names.records,
            stats.nodes.skipped,
            stats.names.skipped
        );
        Ok(tree.with_default_genetic_code(config.default_genetic_code))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_taxid(&self) -> TaxId {
        self.root_taxid
    }

    pub fn contains(&self, taxid: TaxId) -> bool {
        self.nodes.contains_key(&taxid)
    }

    pub fn get(&self, taxid: TaxId) -> Option<&TaxonNode> {
        self.nodes.get(&taxid)
    }

    pub fn parent(&self, taxid: TaxId) -> Option<TaxId> {
        self.nodes.get(&taxid).and_then(TaxonNode::parent)
    }

    pub fn name(&self, taxid: TaxId) -> Option<&str> {
        self.nodes
            .get(&taxid)
            .and_then(|n| n.scientific_name.as_deref())
    }

    pub fn rank(&self, taxid: TaxId) -> Option<&str> {
        self.nodes.get(&taxid).map(|n| n.rank.as_str())
    }

    /// Genetic code of `taxid`, or the default table when the taxid is unknown.
    pub fn genetic_code(&self, taxid: TaxId) -> u32 {
        self.nodes
            .get(&taxid)
            .map_or(self.default_genetic_code, |n| n.genetic_code)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaxonNode> {
        self.nodes.values()
    }

    /// All taxids carrying exactly `rank`, ascending.
    pub fn taxa_with_rank(&self, rank: &str) -> Vec<TaxId> {
        let mut taxids: Vec<TaxId> = self
            .nodes
            .values()
            .filter(|n| n.rank == rank)
            .map(|n| n.taxid)
            .collect();
        taxids.sort_unstable();
        taxids
    }

    /// Walks from `taxid` towards the root. See [`AncestorWalk`].
    pub fn ancestors(&self, taxid: TaxId) -> AncestorWalk<'_> {
        AncestorWalk::new(self, taxid)
    }

    /// Direct children of `taxid`, ascending.
    pub fn children(&self, taxid: TaxId) -> &[TaxId] {
        self.children_index()
            .get(&taxid)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn children_index(&self) -> &HashMap<TaxId, Vec<TaxId>> {
        self.children.get_or_init(|| {
            let mut index: HashMap<TaxId, Vec<TaxId>> = HashMap::new();
            for node in self.nodes.values() {
                if let Some(parent) = node.parent() {
                    index.entry(parent).or_default().push(node.taxid);
                }
            }
            for children in index.values_mut() {
                children.sort_unstable();
            }
            debug!("Built children index over {} parent(s)", index.len());
            index
        })
    }
}
