//! Input/Output operations module.
//!
//! Reads taxid list files and annotation tables, and writes annotation tables
//! and per-group taxid files. None of the taxonomy engine itself touches the
//! filesystem beyond the dump read.

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::grouping::{AnnotationRow, TaxidGroup};
use crate::taxonomy::TaxId;

/// Trimmed, non-empty lines of a taxid list file. Parsing is left to the caller.
pub fn read_taxid_lines(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open taxid file {}", path.display()))?;
    let mut lines = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }
    Ok(lines)
}

/// Writes one taxid per line.
pub fn write_taxid_file(path: &Path, taxids: &[TaxId]) -> Result<()> {
    create_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for taxid in taxids {
        writeln!(writer, "{}", taxid)?;
    }
    writer.flush()?;
    Ok(())
}

/// All `*.txt` files directly inside `dir`, sorted by path.
pub fn list_taxid_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(anyhow!("Input directory '{}' does not exist", dir.display()));
    }
    if !dir.is_dir() {
        return Err(anyhow!("'{}' is not a directory", dir.display()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file() && path.extension().map_or(false, |ext| ext == "txt")
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Family label encoded in a taxid file name.
///
/// `Flaviviridae_1.txt` gives `Flaviviridae`; a stem without a numeric
/// genetic-code suffix is returned whole.
pub fn family_from_filename(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.rsplit_once('_') {
        Some((family, code)) if !code.is_empty() && code.chars().all(|c| c.is_ascii_digit()) => {
            family.to_string()
        }
        _ => stem,
    }
}

/// Reads a tab-separated annotation table.
///
/// Columns are matched by header name. `scientific_name` and `lineage` may be
/// absent and unknown columns are ignored.
///
/// # Arguments
///
/// * `path` - TSV file with at least `family`, `taxid`, `rank` and `genetic_code` columns.
///
/// # Returns
///
/// * `Result<Vec<AnnotationRow>>` - Rows in file order, or an error naming the
///   first row that does not deserialize.
pub fn read_annotation_table(path: &Path) -> Result<Vec<AnnotationRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open annotation table {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<AnnotationRow>().enumerate() {
        let row = record.with_context(|| {
            format!("Invalid row {} in {}", idx + 2, path.display())
        })?;
        rows.push(row);
    }
    debug!("Read {} annotation row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

/// Writes the annotation table with a header row, tab-separated.
///
/// # Arguments
///
/// * `rows` - Annotation rows, written in the given order.
/// * `path` - Output TSV path. Missing parent directories are created.
///
/// # Returns
///
/// * `Result<()>` - Ok(()) if every row was written, or an error.
pub fn write_annotation_table(rows: &[AnnotationRow], path: &Path) -> Result<()> {
    create_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(BufWriter::new(file));

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes each group to `<dir>/<label>_<code>.txt`.
///
/// # Arguments
///
/// * `groups` - Groups produced by the genetic-code grouper.
/// * `dir` - Output directory, created if needed.
///
/// # Returns
///
/// * `Result<Vec<PathBuf>>` - The files written, in group order. Fails before
///   writing anything if a label would place its file outside `dir`.
pub fn write_groups(groups: &[TaxidGroup], dir: &Path) -> Result<Vec<PathBuf>> {
    let paths = groups
        .iter()
        .map(|group| group_path(dir, group))
        .collect::<Result<Vec<_>>>()?;

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(groups.len());
    for (group, path) in groups.iter().zip(paths) {
        if group.taxids.is_empty() {
            warn!("Group {} has no taxids", group.file_stem());
        }
        write_taxid_file(&path, &group.taxids)?;
        written.push(path);
    }
    Ok(written)
}

/// Output path of one group. Labels come from user tables, so a label must
/// name a plain file inside `dir`.
fn group_path(dir: &Path, group: &TaxidGroup) -> Result<PathBuf> {
    let file_name = format!("{}.txt", group.file_stem());
    let plain = !group.label.is_empty()
        && !group.label.contains(['/', '\\'])
        && matches!(
            Path::new(&file_name).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        );
    if !plain {
        return Err(anyhow!(
            "Group label '{}' cannot be used as a file name",
            group.label
        ));
    }
    Ok(dir.join(file_name))
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::GroupStrategy;
    use tempfile::tempdir;

    #[test]
    fn test_family_from_filename() {
        assert_eq!(family_from_filename(Path::new("Flaviviridae_1.txt")), "Flaviviridae");
        assert_eq!(
            family_from_filename(Path::new("dir/Mixed_viridae_11.txt")),
            "Mixed_viridae"
        );
        assert_eq!(family_from_filename(Path::new("Picornaviridae.txt")), "Picornaviridae");
        assert_eq!(family_from_filename(Path::new("Odd_x1.txt")), "Odd_x1");
    }

    #[test]
    fn test_taxid_file_round_trip_skips_blank_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        write_taxid_file(&path, &[11050, 12637]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "11050\n12637\n");

        fs::write(&path, "  11050\n\n abc \n12637\n").unwrap();
        assert_eq!(read_taxid_lines(&path).unwrap(), vec!["11050", "abc", "12637"]);
    }

    #[test]
    fn test_list_taxid_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b_1.txt"), "1\n").unwrap();
        fs::write(dir.path().join("a_5.txt"), "1\n").unwrap();
        fs::write(dir.path().join("notes.md"), "x").unwrap();
        let files = list_taxid_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_5.txt", "b_1.txt"]);

        assert!(list_taxid_files(&dir.path().join("missing")).is_err());
        assert!(list_taxid_files(&dir.path().join("b_1.txt")).is_err());
    }

    #[test]
    fn test_annotation_table_written_with_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("extra_models.tsv");
        let mut row = AnnotationRow::new("Flaviviridae", 12637, "species", 1);
        row.scientific_name = "Dengue virus".to_string();
        row.lineage = "Viruses;Riboviria;Flaviviridae;Orthoflavivirus;Dengue virus".to_string();

        write_annotation_table(&[row.clone()], &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let expected = "\
family\ttaxid\trank\tscientific_name\tgenetic_code\tlineage\n\
Flaviviridae\t12637\tspecies\tDengue virus\t1\tViruses;Riboviria;Flaviviridae;Orthoflavivirus;Dengue virus\n";
        assert_eq!(content, expected);

        assert_eq!(read_annotation_table(&path).unwrap(), vec![row]);
    }

    #[test]
    fn test_read_minimal_annotation_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("codes.tsv");
        fs::write(
            &path,
            "family\ttaxid\trank\tgenetic_code\tnote\nMixedviridae\t10\tfamily\t1\tx\n",
        )
        .unwrap();
        let rows = read_annotation_table(&path).unwrap();
        assert_eq!(rows, vec![AnnotationRow::new("Mixedviridae", 10, "family", 1)]);

        fs::write(&path, "family\ttaxid\trank\tgenetic_code\nF\tnot-a-number\tfamily\t1\n")
            .unwrap();
        assert!(read_annotation_table(&path).is_err());
    }

    #[test]
    fn test_write_groups() {
        let dir = tempdir().unwrap();
        let groups = vec![TaxidGroup {
            label: "Mixedviridae".to_string(),
            genetic_code: 5,
            strategy: GroupStrategy::Subtree,
            taxids: vec![12, 13],
        }];
        let written = write_groups(&groups, &dir.path().join("taxid_files")).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("taxid_files/Mixedviridae_5.txt"));
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "12\n13\n");
    }

    #[test]
    fn test_write_groups_rejects_path_like_labels() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("taxid_files");
        for label in ["../escape", "nested/family", "..\\escape", ""] {
            let groups = vec![TaxidGroup {
                label: label.to_string(),
                genetic_code: 1,
                strategy: GroupStrategy::ListedTaxa,
                taxids: vec![11],
            }];
            let err = write_groups(&groups, &out).unwrap_err();
            assert!(err.to_string().contains("cannot be used as a file name"));
        }
        assert!(!out.exists());
        assert!(!dir.path().join("escape_1.txt").exists());
    }
}
