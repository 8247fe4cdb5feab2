use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "atomium CLI - Inspect, transform, convert and fetch PDB structure files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a TOML configuration file with [read], [write], [fetch] and [select] tables
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a summary of a PDB file: metadata, and atom count, mass and formula per model.
    Info(InfoArgs),
    /// Translate and/or rotate every model of a PDB file and save the result.
    Transform(TransformArgs),
    /// Parse a PDB file and write it back out in normalised form.
    Convert(ConvertArgs),
    /// Download a PDB file by its four-character code.
    Fetch(FetchArgs),
}

/// Atom selection shared by the commands that summarise structures.
#[derive(Args, Debug, Default, Clone)]
pub struct SelectArgs {
    /// Only count atoms of this element (e.g. C, FE)
    #[arg(long, value_name = "SYMBOL")]
    pub element: Option<String>,

    /// Only count atoms of this kind: pdb, generic or all
    #[arg(long, value_name = "KIND")]
    pub kind: Option<String>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the PDB file to summarise.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub select: SelectArgs,

    /// Treat recoverable parse problems as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `transform` subcommand.
#[derive(Args, Debug)]
pub struct TransformArgs {
    /// Path to the input PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the transformed PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Translation vector applied first.
    #[arg(
        long,
        num_args = 3,
        value_names = ["DX", "DY", "DZ"],
        allow_negative_numbers = true
    )]
    pub translate: Option<Vec<f64>>,

    /// Rotation about a coordinate axis, in degrees, applied after any translation.
    #[arg(
        long,
        num_args = 2,
        value_names = ["AXIS", "DEGREES"],
        allow_negative_numbers = true
    )]
    pub rotate: Option<Vec<String>>,
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Path to the input PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the normalised PDB file.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Keep only the first model.
    #[arg(long)]
    pub first_model_only: bool,

    /// Omit the HEADER record from the output.
    #[arg(long)]
    pub no_header: bool,
}

/// Arguments for the `fetch` subcommand.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Four-character PDB code, e.g. 1LOL.
    #[arg(value_name = "CODE")]
    pub code: String,

    /// Save the downloaded file here.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the download server (the file is requested from <URL>/<CODE>.pdb).
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}
