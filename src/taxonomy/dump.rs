//! NCBI taxdump reader.
//!
//! Both `nodes.dmp` and `names.dmp` are pipe-delimited, with every field padded
//! by tabs and each line closed by a trailing `|`:
//!
//! ```text
//! 10239	|	1	|	superkingdom	|		|	9	|	0	|	1	|	0	|	0	|	0	|	0	|	0	|		|
//! 10239	|	Viruses	|		|	scientific name	|
//! ```
//!
//! Files ending in `.gz` are decompressed on the fly.

use flate2::read::MultiGzDecoder;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::error::TaxonomyError;
use super::tree::{TaxonNode, TaxonomyTree};
use super::TaxId;
use crate::config::{EngineConfig, MalformedPolicy};

const NODE_TAXID: usize = 0;
const NODE_PARENT: usize = 1;
const NODE_RANK: usize = 2;
const NODE_GENETIC_CODE: usize = 6;

const NAME_TAXID: usize = 0;
const NAME_TEXT: usize = 1;
const NAME_CLASS: usize = 3;

const SCIENTIFIC_NAME: &str = "scientific name";

/// Line counters for one dump file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Non-blank lines read.
    pub lines: usize,
    /// Records retained.
    pub records: usize,
    /// Lines rejected as malformed.
    pub skipped: usize,
}

/// Counters for a full tree load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DumpStats {
    pub nodes: ParseStats,
    pub names: ParseStats,
    /// Scientific names whose taxid has no node record.
    pub orphan_names: usize,
}

/// Parsed nodes.dmp row, before names are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub taxid: TaxId,
    pub parent_taxid: TaxId,
    pub rank: String,
    pub genetic_code: u32,
}

pub struct DumpParser {
    policy: MalformedPolicy,
    default_genetic_code: u32,
}

impl DumpParser {
    pub fn new(policy: MalformedPolicy, default_genetic_code: u32) -> Self {
        DumpParser {
            policy,
            default_genetic_code,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.malformed_lines, config.default_genetic_code)
    }

    /// Reads both dump files and assembles the tree.
    ///
    /// # Arguments
    ///
    /// * `nodes_path` - nodes.dmp, plain or gzipped.
    /// * `names_path` - names.dmp, plain or gzipped.
    /// * `root_taxid` - Taxid the tree treats as its root.
    ///
    /// # Returns
    ///
    /// * `Result<(TaxonomyTree, DumpStats), TaxonomyError>` - The tree plus line
    ///   and skip counts for both files, or the first fatal error.
    pub fn load(
        &self,
        nodes_path: &Path,
        names_path: &Path,
        root_taxid: TaxId,
    ) -> Result<(TaxonomyTree, DumpStats), TaxonomyError> {
        // Check both paths up front so a missing names file is reported before
        // spending time on nodes.
        for path in [nodes_path, names_path] {
            if !path.exists() {
                return Err(TaxonomyError::MissingInput {
                    path: path.to_path_buf(),
                });
            }
        }

        let (records, node_stats) = self.parse_nodes(nodes_path)?;
        let (names, name_stats) = self.parse_names(names_path)?;

        let mut nodes: HashMap<TaxId, TaxonNode> = HashMap::with_capacity(records.len());
        for record in records {
            let scientific_name = names.get(&record.taxid).cloned();
            if let Some(previous) = nodes.insert(
                record.taxid,
                TaxonNode {
                    taxid: record.taxid,
                    parent_taxid: record.parent_taxid,
                    rank: record.rank,
                    genetic_code: record.genetic_code,
                    scientific_name,
                },
            ) {
                debug!("Duplicate node record for taxid {}", previous.taxid);
            }
        }

        let stats = DumpStats {
            nodes: node_stats,
            names: name_stats,
            orphan_names: names.keys().filter(|id| !nodes.contains_key(id)).count(),
        };
        if stats.orphan_names > 0 {
            warn!(
                "{} scientific name(s) in {} have no matching node",
                stats.orphan_names,
                names_path.display()
            );
        }

        Ok((TaxonomyTree::new(nodes, root_taxid), stats))
    }

    /// Parses nodes.dmp into node records.
    pub fn parse_nodes(&self, path: &Path) -> Result<(Vec<NodeRecord>, ParseStats), TaxonomyError> {
        let (records, stats) = self.read_records(path, |line| self.parse_node_line(line).map(Some))?;
        info!(
            "Loaded {} taxonomy nodes from {} ({} malformed line(s) skipped)",
            stats.records,
            path.display(),
            stats.skipped
        );
        Ok((records, stats))
    }

    /// Parses names.dmp, keeping the first scientific name seen per taxid.
    pub fn parse_names(
        &self,
        path: &Path,
    ) -> Result<(HashMap<TaxId, String>, ParseStats), TaxonomyError> {
        let (rows, mut stats) = self.read_records(path, parse_name_line)?;

        let mut names = HashMap::with_capacity(rows.len());
        for (taxid, name) in rows {
            names.entry(taxid).or_insert(name);
        }
        stats.records = names.len();

        info!(
            "Loaded {} scientific names from {} ({} malformed line(s) skipped)",
            stats.records,
            path.display(),
            stats.skipped
        );
        Ok((names, stats))
    }

    fn parse_node_line(&self, line: &str) -> Result<NodeRecord, String> {
        let fields = split_fields(line);
        if fields.len() <= NODE_GENETIC_CODE {
            return Err(format!(
                "expected at least {} fields, got {}",
                NODE_GENETIC_CODE + 1,
                fields.len()
            ));
        }

        let taxid = parse_taxid(fields[NODE_TAXID], "taxid")?;
        let parent_taxid = parse_taxid(fields[NODE_PARENT], "parent taxid")?;
        let genetic_code = match fields[NODE_GENETIC_CODE] {
            "" => self.default_genetic_code,
            raw => raw
                .parse()
                .map_err(|_| format!("invalid genetic code '{}'", raw))?,
        };

        Ok(NodeRecord {
            taxid,
            parent_taxid,
            rank: fields[NODE_RANK].to_string(),
            genetic_code,
        })
    }

    /// Runs `parse` over every non-blank line, applying the malformed-line policy.
    /// `Ok(None)` means the line is valid but not wanted.
    fn read_records<T>(
        &self,
        path: &Path,
        mut parse: impl FnMut(&str) -> Result<Option<T>, String>,
    ) -> Result<(Vec<T>, ParseStats), TaxonomyError> {
        let reader = open_dump(path)?;
        let mut records = Vec::new();
        let mut stats = ParseStats::default();

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|source| TaxonomyError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            stats.lines += 1;

            match parse(&line) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(reason) => {
                    let err = TaxonomyError::malformed(path, idx + 1, reason);
                    if self.policy == MalformedPolicy::Strict {
                        return Err(err);
                    }
                    warn!("{}; skipping", err);
                    stats.skipped += 1;
                }
            }
        }

        stats.records = records.len();
        Ok((records, stats))
    }
}

impl Default for DumpParser {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

fn parse_name_line(line: &str) -> Result<Option<(TaxId, String)>, String> {
    let fields = split_fields(line);
    if fields.len() <= NAME_CLASS {
        return Err(format!(
            "expected at least {} fields, got {}",
            NAME_CLASS + 1,
            fields.len()
        ));
    }
    let taxid = parse_taxid(fields[NAME_TAXID], "taxid")?;
    if fields[NAME_CLASS] != SCIENTIFIC_NAME {
        return Ok(None);
    }
    Ok(Some((taxid, fields[NAME_TEXT].to_string())))
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split('|').map(str::trim).collect()
}

fn parse_taxid(raw: &str, what: &str) -> Result<TaxId, String> {
    raw.parse().map_err(|_| format!("invalid {} '{}'", what, raw))
}

fn open_dump(path: &Path) -> Result<Box<dyn BufRead>, TaxonomyError> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            TaxonomyError::MissingInput {
                path: path.to_path_buf(),
            }
        } else {
            TaxonomyError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let is_gzip = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("gz"));
    // Concatenated and bgzip files carry several gzip members.
    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    fn node_line(taxid: TaxId, parent: TaxId, rank: &str, gc: &str) -> String {
        format!(
            "{}\t|\t{}\t|\t{}\t|\t\t|\t9\t|\t0\t|\t{}\t|\t0\t|\t0\t|\t0\t|\t0\t|\t0\t|\t\t|",
            taxid, parent, rank, gc
        )
    }

    fn name_line(taxid: TaxId, name: &str, class: &str) -> String {
        format!("{}\t|\t{}\t|\t\t|\t{}\t|", taxid, name, class)
    }

    fn write_file(path: &Path, lines: &[String]) {
        let mut file = File::create(path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    #[test]
    fn test_parse_nodes_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.dmp");
        write_file(
            &path,
            &[
                node_line(1, 1, "no rank", "1"),
                node_line(10239, 1, "superkingdom", "1"),
                node_line(11050, 10239, "family", "1"),
                node_line(99, 11050, "species", ""),
            ],
        );

        let parser = DumpParser::default();
        let (records, stats) = parser.parse_nodes(&path).unwrap();
        assert_eq!(stats.records, 4);
        assert_eq!(stats.skipped, 0);
        assert_eq!(
            records[2],
            NodeRecord {
                taxid: 11050,
                parent_taxid: 10239,
                rank: "family".to_string(),
                genetic_code: 1,
            }
        );
        // Empty genetic code field falls back to the default table.
        assert_eq!(records[3].genetic_code, 1);
    }

    #[test]
    fn test_parse_names_keeps_first_scientific_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("names.dmp");
        write_file(
            &path,
            &[
                name_line(10239, "Viruses", "scientific name"),
                name_line(10239, "Vira", "synonym"),
                name_line(10239, "Second", "scientific name"),
                name_line(11050, "Flaviviridae", "scientific name"),
            ],
        );

        let (names, stats) = DumpParser::default().parse_names(&path).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names[&10239], "Viruses");
        assert_eq!(names[&11050], "Flaviviridae");
        assert_eq!(stats.records, 2);
        assert_eq!(stats.lines, 4);
    }

    #[test]
    fn test_malformed_lines_skipped_and_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.dmp");
        write_file(
            &path,
            &[
                node_line(1, 1, "no rank", "1"),
                "2\t|\t1\t|\tgenus\t|".to_string(),
                node_line(3, 1, "species", "x"),
                String::new(),
                node_line(4, 1, "species", "5"),
            ],
        );

        let (records, stats) = DumpParser::default().parse_nodes(&path).unwrap();
        let ids: Vec<TaxId> = records.iter().map(|r| r.taxid).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.lines, 4);
        assert_eq!(records[1].genetic_code, 5);
    }

    #[test]
    fn test_strict_policy_reports_line_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.dmp");
        write_file(
            &path,
            &[node_line(1, 1, "no rank", "1"), "abc\t|\t1\t|\tgenus\t|\t\t|\t\t|\t\t|\t1\t|".to_string()],
        );

        let parser = DumpParser::new(MalformedPolicy::Strict, 1);
        match parser.parse_nodes(&path) {
            Err(TaxonomyError::MalformedRecord { line, reason, .. }) => {
                assert_eq!(line, 2);
                assert!(reason.contains("abc"));
            }
            other => panic!("expected malformed record error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let nodes = dir.path().join("nodes.dmp");
        write_file(&nodes, &[node_line(1, 1, "no rank", "1")]);
        let names = dir.path().join("names.dmp");

        let err = DumpParser::default().load(&nodes, &names, 1).unwrap_err();
        match &err {
            TaxonomyError::MissingInput { path } => assert_eq!(path, &names),
            other => panic!("expected missing input, got {:?}", other),
        }
        assert!(err.to_string().contains("names.dmp"));
    }

    #[test]
    fn test_load_attaches_names_and_counts_orphans() {
        let dir = tempdir().unwrap();
        let nodes = dir.path().join("nodes.dmp");
        let names = dir.path().join("names.dmp");
        write_file(
            &nodes,
            &[node_line(1, 1, "no rank", "1"), node_line(10239, 1, "superkingdom", "1")],
        );
        write_file(
            &names,
            &[
                name_line(1, "root", "scientific name"),
                name_line(10239, "Viruses", "scientific name"),
                name_line(777, "Nowhere", "scientific name"),
            ],
        );

        let (tree, stats) = DumpParser::default().load(&nodes, &names, 1).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.name(10239), Some("Viruses"));
        assert_eq!(stats.orphan_names, 1);
    }

    #[test]
    fn test_gzipped_dump() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.dmp.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        writeln!(encoder, "{}", node_line(1, 1, "no rank", "1")).unwrap();
        writeln!(encoder, "{}", node_line(2, 1, "family", "11")).unwrap();
        encoder.finish().unwrap();

        let (records, _) = DumpParser::default().parse_nodes(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].genetic_code, 11);
    }

    #[test]
    fn test_multi_member_gzipped_dump() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nodes.dmp.gz");
        let mut bytes = Vec::new();
        for line in [node_line(1, 1, "no rank", "1"), node_line(2, 1, "family", "11")] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            writeln!(encoder, "{}", line).unwrap();
            bytes.extend(encoder.finish().unwrap());
        }
        std::fs::write(&path, bytes).unwrap();

        let (records, stats) = DumpParser::default().parse_nodes(&path).unwrap();
        let ids: Vec<TaxId> = records.iter().map(|r| r.taxid).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(stats.skipped, 0);
    }
}
