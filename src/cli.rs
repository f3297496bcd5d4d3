use crate::config::{EraseOptions, Passes, DEFAULT_PASSES};
use crate::error::Result;
use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "privacytool",
    about = "Privacy tools: secure deletion and metadata removal",
    version
)]
pub struct Cli {
    /// Diagnostic log level on stderr (error, warn, info, debug, trace). Overrides RUST_LOG.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Overwrite files with random data, then delete them
    SecureDelete(SecureDeleteArgs),

    /// Remove metadata from images, PDFs and audio files
    RemoveMetadata(RemoveMetadataArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["file", "dir"])))]
pub struct SecureDeleteArgs {
    /// File to delete
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Directory to delete, with everything inside it
    #[arg(long, short = 'd', value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Number of overwrite passes
    #[arg(
        long,
        short = 'p',
        default_value_t = DEFAULT_PASSES,
        env = "PRIVACYTOOL_PASSES",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub passes: u32,

    /// Print a line per pass, per file and per directory removal
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Read every pass back and check it landed on disk
    #[arg(long)]
    pub verify: bool,

    /// Worker threads for directory erasure
    #[arg(
        long,
        short = 'j',
        default_value_t = 1,
        value_name = "N",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub jobs: usize,

    /// Print the final report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

impl SecureDeleteArgs {
    pub fn options(&self) -> Result<EraseOptions> {
        Ok(EraseOptions::new()
            .with_passes(Passes::new(self.passes)?)
            .with_verbose(self.verbose)
            .with_verify(self.verify)
            .with_jobs(self.jobs))
    }
}

#[derive(Args, Debug)]
pub struct RemoveMetadataArgs {
    /// File to process
    #[arg(long, short = 'f', value_name = "PATH", required_unless_present = "list_formats")]
    pub file: Option<PathBuf>,

    /// Output file path. Defaults to overwriting the input.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// List supported file formats and exit
    #[arg(long)]
    pub list_formats: bool,
}
