use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fatscope")]
#[command(about = "Select the FAT buckets a change set needs to run", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the buckets to run for a set of changed paths
    Select {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Decide whether a single bucket needs to run
    ShouldRun {
        /// Bucket (FAT project) name
        bucket: String,

        /// Exit with status 1 when the bucket can be skipped
        #[arg(long = "exit-code")]
        exit_code: bool,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Classify paths without loading features or buckets
    Classify {
        /// Repository-relative paths to classify
        #[arg(required = true)]
        paths: Vec<String>,

        /// Configuration file (defaults to the nearest .fatscope.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show every stage of the selection for a set of changed paths
    Explain {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write a default .fatscope.toml in the current directory
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}

/// Where changed paths come from and how to load the repository model.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Changed paths, relative to the repository root
    pub paths: Vec<String>,

    /// Read changed paths from a file, one per line ("-" for stdin)
    #[arg(long = "paths-from")]
    pub paths_from: Option<PathBuf>,

    /// Repository root
    #[arg(long, default_value = ".", env = "FATSCOPE_REPO")]
    pub repo: PathBuf,

    /// Diff against this git revision instead of listing paths
    #[arg(long)]
    pub base: Option<String>,

    /// Head revision for --base (defaults to the working tree)
    #[arg(long, requires = "base")]
    pub head: Option<String>,

    /// Configuration file (defaults to the nearest .fatscope.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the feature descriptor directory
    #[arg(long = "feature-root")]
    pub feature_root: Option<PathBuf>,

    /// Override the bucket snapshot file
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for crate::output::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Text => crate::output::OutputFormat::Text,
            OutputFormat::Json => crate::output::OutputFormat::Json,
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
