//src/config.rs

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::error::PipelineError;
use crate::output::OutputOptions;

/// Attach NCBI lineages to a Kraken report and split it by taxonomic rank.
#[derive(Parser, Debug)]
#[command(name = "kraken-lineage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input Kraken report (.tsv, optionally .gz)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Taxonomy database: ETE taxa.sqlite or krakenuniq taxDB
    /// [default: ~/.etetoolkit/taxa.sqlite]
    #[arg(short, long, env = "KRAKEN_LINEAGE_DB")]
    pub db: Option<PathBuf>,

    /// Output directory [default: <input stem>-taxonomy]
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Excel workbook with one sheet per table [default: <outdir>taxa.xlsx]
    #[arg(short = 'e', long)]
    pub xlsx: Option<PathBuf>,

    /// Do not write all.csv
    #[arg(long)]
    pub no_combined: bool,

    /// Do not write Unclassified.csv
    #[arg(long)]
    pub no_unclassified: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub db: PathBuf,
    pub outdir: PathBuf,
    pub output: OutputOptions,
}

impl Cli {
    pub fn into_config(self) -> Result<RunConfig, PipelineError> {
        let db = match self.db {
            Some(db) => db,
            None => default_db_path().ok_or_else(|| {
                PipelineError::Config(
                    "no taxonomy database given and $HOME is not set; use --db".to_string(),
                )
            })?,
        };
        let outdir = self.outdir.unwrap_or_else(|| default_outdir(&self.input));
        let workbook = self.xlsx.unwrap_or_else(|| default_workbook(&outdir));

        Ok(RunConfig {
            input: self.input,
            db,
            outdir,
            output: OutputOptions {
                include_combined: !self.no_combined,
                include_unclassified: !self.no_unclassified,
                workbook: Some(workbook),
            },
        })
    }
}

/// Where the ETE toolkit keeps its taxonomy dump.
pub fn default_db_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".etetoolkit")
            .join("taxa.sqlite")
    })
}

/// `<input stem>-taxonomy` in the current directory, ignoring a trailing ".gz".
pub fn default_outdir(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());

    PathBuf::from(format!("{stem}-taxonomy"))
}

/// `<outdir>taxa.xlsx`, glued directly onto the directory name, next to it.
pub fn default_workbook(outdir: &Path) -> PathBuf {
    let mut name = outdir.as_os_str().to_os_string();
    name.push("taxa.xlsx");
    PathBuf::from(name)
}
