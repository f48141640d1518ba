use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tdms2csv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch-convert TDMS measurement files to CSV")]
#[command(
    long_about = "tdms2csv walks a directory tree, finds every TDMS file, and writes one CSV \
                       per named group next to its source file. Files that fail to convert are \
                       reported and skipped; the rest of the batch continues."
)]
#[command(after_help = "EXAMPLES:\n  \
    tdms2csv ./measurements\n  \
    tdms2csv /data/run42 --chunks 50 --verbose\n  \
    tdms2csv ./raw --exclude archive,backup --extension TDMS\n  \
    tdms2csv ./data --config my-config.toml --output-format json")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Root directory to scan for TDMS files
    #[arg(required_unless_present = "generate_config")]
    pub root: Option<PathBuf>,

    /// File extension to match (case-sensitive, default: tdms)
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Number of write segments per output file
    #[arg(long, help = "Write each CSV in this many incremental appends")]
    pub chunks: Option<usize>,

    /// Directories to exclude from the scan
    #[arg(long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Maximum traversal depth (0 = unlimited)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (list files that would be converted without converting)
    #[arg(long, help = "Show which files would be converted without writing anything")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_extension(self.extension.clone())
            .with_exclude(self.exclude.clone())
            .with_max_depth(self.max_depth)
            .with_chunk_count(self.chunks)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
