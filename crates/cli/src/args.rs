use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn parse_threads(s: &str) -> Result<usize, String> {
    let v: usize = s
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;
    if v == 0 {
        Err("threads must be greater than 0".into())
    } else {
        Ok(v)
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "uplift - Objective-C to Swift source translator",
    long_about = "uplift reads Objective-C headers and implementations, builds an \
intention model of the Swift program to generate, runs analysis passes over it \
and emits Swift source.

Examples:
  uplift translate Sources/            # Translate a directory tree
  uplift translate Person.m            # Translate a single file to stdout
  uplift translate . --format json     # Dump the finalised intention graph",
    subcommand_required = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate Objective-C sources to Swift
    Translate(TranslateArgs),
}

#[derive(ClapArgs)]
pub struct TranslateArgs {
    /// Path to translate (a file or a directory tree)
    pub path: PathBuf,
    /// Directory to write .swift files into; stdout when omitted
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Number of parser threads
    #[arg(long, default_value_t = default_threads(), value_parser = parse_threads)]
    pub threads: usize,
    /// Pass-schedule iteration cap
    #[arg(long, default_value_t = engine::DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,
    /// Suppress log output
    #[arg(long, short)]
    pub quiet: bool,
    /// Verbose diagnostics, including structured engine events
    #[arg(long)]
    pub debug: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Rendered Swift source
    Text,
    /// JSON dump of the finalised intention graph
    Json,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
