//! CLI argument definitions using clap.

use bioindex::{Locale, DEFAULT_TAXONOMY_URL};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// agb: Bioindex conversion and analysis tools
#[derive(Parser)]
#[command(name = "agb")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert Bioindex records to other representations
    Convert {
        #[command(subcommand)]
        command: ConvertCommand,
    },

    /// Inspect saved analysis listings
    Analysis {
        #[command(subcommand)]
        command: AnalysisCommand,
    },
}

#[derive(Subcommand)]
pub enum ConvertCommand {
    /// Flatten a Bioindex JSON document into correlated tables
    BioindexToTabular {
        /// Path to the Bioindex JSON document
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (json) or directory (csv/tsv)
        #[arg(value_name = "OUTPUT", required_unless_present = "stdout_json")]
        output: Option<PathBuf>,

        /// Leave every taxon empty instead of querying the taxonomy service
        #[arg(long)]
        no_resolve_taxonomies: bool,

        /// Taxonomy service endpoint
        #[arg(long, env = "TAXONOMY_URL", default_value = DEFAULT_TAXONOMY_URL)]
        taxonomy_url: String,

        /// Fail when taxonomy resolution fails instead of leaving taxa empty
        #[arg(long)]
        strict_resolution: bool,

        /// Output format (default: from OUTPUT's extension)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Language of column names (en-US, pt-BR)
        #[arg(long, default_value = "en-US")]
        locale: Locale,

        /// Seconds to wait for the taxonomy service (0 disables the limit)
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Maximum taxon keys per taxonomy request
        #[arg(long, default_value = "100")]
        batch_size: usize,

        /// Maximum taxonomy requests in flight at once
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Print the JSON document to stdout instead of writing files
        #[arg(long, conflicts_with = "format")]
        stdout_json: bool,
    },
}

#[derive(Subcommand)]
pub enum AnalysisCommand {
    /// List the bioindex IDs of each analysis in a saved listing
    BioindexIds {
        /// Path to the analysis listing JSON
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum OutputFormat {
    #[default]
    Tsv,
    Csv,
    Json,
}

impl OutputFormat {
    /// Format implied by an output path: `.json` is json, anything else tsv.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Tsv,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use tsv, csv, or json.", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Tsv => write!(f, "tsv"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
