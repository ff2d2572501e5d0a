use clap::{Args, Parser, Subcommand};
use confmatch::core::io::slice::MolSlice;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Victoria T. Lim",
    version,
    about = "confmatch - Match conformational minima across computational methods and compare their relative energies.",
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

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match conformers of every method to the reference method and write relative energy reports.
    Run(RunArgs),
    /// Validate a method list and show which structure files were found.
    Check(CheckArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Path to the method list. Each line holds 'label, structure_file, energy_tag';
    /// the first method is the reference.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to an optional settings file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Matching Overrides ---
    /// RMSD cutoff (Angstrom) for two conformers to count as the same minimum.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Override the maximum number of symmetry permutations tried per molecule.
    #[arg(long, value_name = "INT")]
    pub max_automorphisms: Option<usize>,

    /// Leave molecules with a single reference conformer out of the analysis.
    #[arg(long)]
    pub skip_single_conformer: bool,

    /// Only match the reference molecules selected by START:STOP[:STEP] (0-based, STOP exclusive).
    #[arg(long, value_name = "START:STOP:STEP")]
    pub slice: Option<MolSlice>,

    // --- Checkpoint ---
    /// Read matches from the checkpoint instead of matching conformers again.
    #[arg(long)]
    pub reuse_checkpoint: bool,

    /// Path of the checkpoint written after matching.
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    // --- Output Overrides ---
    /// Directory for the per-molecule reports.
    #[arg(short, long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File name prefix of the per-molecule reports.
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Also write a CSV of RMS errors per molecule and method.
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Draw an SVG plot of relative energies for every molecule.
    #[arg(long)]
    pub plot: bool,

    /// Set a specific configuration value, overriding the settings file.
    /// Can be used multiple times. Example: -S matching.rmsd-cutoff=0.3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the method list to validate.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse() {
        let cli = Cli::parse_from([
            "confmatch",
            "-vv",
            "run",
            "-i",
            "methods.txt",
            "--cutoff",
            "0.3",
            "--slice",
            "0:10:2",
            "--plot",
            "-S",
            "output.prefix=cmp",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("Expected 'run' subcommand");
        };
        assert_eq!(args.input, PathBuf::from("methods.txt"));
        assert_eq!(args.cutoff, Some(0.3));
        assert_eq!(args.slice, Some(MolSlice::new(0, 10, 2).unwrap()));
        assert!(args.plot);
        assert!(!args.reuse_checkpoint);
        assert_eq!(args.set_values, vec!["output.prefix=cmp".to_string()]);
    }

    #[test]
    fn invalid_slice_is_rejected() {
        let result = Cli::try_parse_from(["confmatch", "run", "-i", "m.txt", "--slice", "5:2"]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["confmatch", "-q", "-v", "check", "-i", "m.txt"]);
        assert!(result.is_err());
    }
}
