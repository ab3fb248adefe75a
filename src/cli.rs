use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use viral_taxa::config::{EngineConfig, MalformedPolicy};
use viral_taxa::grouping::GeneticCodeGrouper;
use viral_taxa::io;
use viral_taxa::pipeline::{annotate_taxid_files, sample_clade};
use viral_taxa::sampling::RandomSubsampler;
use viral_taxa::taxonomy::{TaxId, TaxonomyTree};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to NCBI nodes.dmp (may be gzipped)
    #[arg(long, default_value = "nodes.dmp", global = true)]
    pub nodes: PathBuf,

    /// Path to NCBI names.dmp (may be gzipped)
    #[arg(long, default_value = "names.dmp", global = true)]
    pub names: PathBuf,

    /// JSON engine configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads to use (overrides the config file)
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Abort on the first malformed dump line instead of skipping it
    #[arg(long, global = true)]
    pub strict: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an annotation table for the taxids in a directory of taxid files
    Info {
        /// Directory containing *.txt taxid files
        #[arg(short, long, default_value = "taxid_files")]
        input_dir: PathBuf,

        /// Output TSV file
        #[arg(short, long, default_value = "extra_models.tsv")]
        output: PathBuf,

        /// Take the family from the file name instead of the lineage
        #[arg(long)]
        use_filename_family: bool,
    },

    /// Split an annotation table into taxid files by family and genetic code
    Group {
        /// Annotation TSV with family, taxid, rank and genetic_code columns
        #[arg(short, long, default_value = "riboviria_genetic_codes.tsv")]
        input: PathBuf,

        /// Output directory for <family>_<code>.txt files
        #[arg(short, long, default_value = "taxid_files")]
        output: PathBuf,
    },

    /// Randomly sample taxa of one rank under a clade
    Sample {
        /// Number of taxa to draw
        #[arg(short = 'n', long, default_value_t = 10)]
        num: usize,

        /// Clade taxid (defaults to the configured RNA virus realm)
        #[arg(long)]
        clade: Option<TaxId>,

        /// Rank of the sampled taxa
        #[arg(long, default_value = "species")]
        rank: String,

        /// Seed for reproducible draws
        #[arg(long)]
        seed: Option<u64>,

        /// Write the selected taxids to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print lineage, family, rank and genetic code for taxids
    Lookup {
        #[arg(required = true)]
        taxids: Vec<TaxId>,
    },
}

impl Cli {
    /// Config file values with command-line overrides applied.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::load_or_default(self.config.as_deref())?;
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.strict {
            config.malformed_lines = MalformedPolicy::Strict;
        }
        Ok(config)
    }
}

/// Main entry point for CLI
pub fn run_cli(cli: Cli) -> Result<()> {
    let config = cli.engine_config()?;

    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()?;
        info!("Using {} threads.", config.threads);
    }

    let tree = TaxonomyTree::from_dump(&cli.nodes, &cli.names, &config)
        .context("Failed to load taxonomy dump")?;

    match cli.command {
        Commands::Info {
            input_dir,
            output,
            use_filename_family,
        } => {
            let (rows, summary) = annotate_taxid_files(&tree, &input_dir, use_filename_family)?;
            if rows.is_empty() {
                log::warn!("No valid taxids found to process");
                return Ok(());
            }
            io::write_annotation_table(&rows, &output)?;
            println!(
                "Wrote {} row(s) to {} ({} taxid(s) processed, {} skipped)",
                summary.rows,
                output.display(),
                summary.taxids_seen,
                summary.skipped()
            );
        }

        Commands::Group { input, output } => {
            let rows = io::read_annotation_table(&input)?;
            let groups = GeneticCodeGrouper::new(&tree).group(&rows);
            let written = io::write_groups(&groups, &output)?;
            for (group, path) in groups.iter().zip(&written) {
                info!("Saved {} taxids to {}", group.taxids.len(), path.display());
            }
            println!("{} files written to {}", written.len(), output.display());
        }

        Commands::Sample {
            num,
            clade,
            rank,
            seed,
            output,
        } => {
            let clade = clade.unwrap_or(config.rna_virus_taxid);
            let mut sampler = RandomSubsampler::new(seed);
            let selected = sample_clade(&tree, clade, &rank, num, &mut sampler);

            println!("Selected {} taxa (seed {}):", selected.len(), sampler.seed());
            for (i, taxon) in selected.iter().enumerate() {
                println!("{:2}. [{}] {}", i + 1, taxon.taxid, taxon.name);
            }
            if let Some(path) = output {
                let taxids: Vec<TaxId> = selected.iter().map(|t| t.taxid).collect();
                io::write_taxid_file(&path, &taxids)?;
                println!("Wrote {} taxid(s) to {}", taxids.len(), path.display());
            }
        }

        Commands::Lookup { taxids } => {
            for taxid in taxids {
                match tree.get(taxid) {
                    Some(node) => println!(
                        "{}\t{}\t{}\t{}\t{}",
                        taxid,
                        node.rank,
                        node.genetic_code,
                        tree.nearest_family(taxid),
                        tree.lineage_string(taxid)
                    ),
                    None => log::warn!("Taxid {} not found in taxonomy", taxid),
                }
            }
        }
    }

    Ok(())
}
