//! Engine configuration.
//!
//! Every field has a default matching NCBI conventions, so a config file only
//! needs to list the values it changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::taxonomy::TaxId;

/// How the dump parser treats lines it cannot parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log and count the line, then continue with the next one.
    #[default]
    Skip,
    /// Abort the load on the first bad line.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Designated root of the taxonomy. Ancestor walks stop here.
    pub root_taxid: TaxId,
    /// Genetic code assumed for taxa without one.
    pub default_genetic_code: u32,
    pub malformed_lines: MalformedPolicy,
    /// Worker threads for group processing; 0 lets rayon decide.
    pub threads: usize,
    /// Clade used by the sampling pipeline (Riboviria).
    pub rna_virus_taxid: TaxId,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            root_taxid: 1,
            default_genetic_code: 1,
            malformed_lines: MalformedPolicy::Skip,
            threads: 0,
            rna_virus_taxid: 2559587,
        }
    }
}

impl EngineConfig {
    /// Loads a JSON config file. Missing fields fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let config: EngineConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Returns the config at `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }
}
