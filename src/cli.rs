// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::pipeline::energy::DEFAULT_ENERGY_TERM;
use crate::types::{parse_option_pair, OptionSet, OptionValue};

/// Command-line arguments for `gmxflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gmxflow",
    version,
    about = "Run GROMACS preprocessing and simulation stages idempotently.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Gmxflow.toml` in the current working directory, if present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GMXFLOW_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Tool binary to use instead of probing the configured candidates.
    #[arg(long, global = true, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Re-run stages even when their outputs show a finished run.
    #[arg(long, global = true)]
    pub overwrite: bool,

    /// Print the commands that would run, without running them.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Preprocess and run one simulation named by a run identifier.
    Simulate(SimulateArgs),
    /// Preprocessing stage only.
    Grompp(GromppArgs),
    /// Run stage only (resumes from a checkpoint when one exists).
    Mdrun(MdrunArgs),
    /// Any other subcommand of the tool.
    Tool(ToolArgs),
    /// Single-point energy of a configuration.
    Energy(EnergyArgs),
    /// Report whether an artifact represents a finished run.
    Status {
        artifact: PathBuf,
    },
    /// Report the checkpoint a run descriptor would resume from.
    Checkpoint {
        descriptor: PathBuf,
    },
}

/// Repeatable `-O KEY=VALUE` flags forwarded to the tool.
#[derive(Debug, Clone, Default, Args)]
pub struct ToolOptions {
    /// Extra tool flag, e.g. `-O dt=0.002` or `-O v=yes`. Repeatable.
    #[arg(short = 'O', long = "opt", value_name = "KEY=VALUE", value_parser = parse_option_pair)]
    pub pairs: Vec<(String, OptionValue)>,
}

impl ToolOptions {
    pub fn to_option_set(&self) -> OptionSet {
        self.pairs.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Run identifier; every artifact name is derived from it.
    #[arg(long)]
    pub name: String,
    #[arg(long, value_name = "PATH")]
    pub mdp: PathBuf,
    #[arg(long, value_name = "PATH")]
    pub top: PathBuf,
    #[arg(long, value_name = "PATH")]
    pub conf: PathBuf,
    /// Directory for the artifacts.
    #[arg(long, value_name = "DIR")]
    pub parent: Option<PathBuf>,
    #[arg(long)]
    pub maxwarn: Option<u32>,
    #[arg(long)]
    pub nt: Option<u32>,
    #[arg(long, value_name = "PATH")]
    pub ndx: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    pub restr: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    pub tableb: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    pub cpi: Option<PathBuf>,
    #[command(flatten)]
    pub options: ToolOptions,
}

#[derive(Debug, Clone, Args)]
pub struct GromppArgs {
    #[arg(long, value_name = "PATH")]
    pub mdp: PathBuf,
    #[arg(long, value_name = "PATH")]
    pub conf: PathBuf,
    #[arg(long, value_name = "PATH")]
    pub top: PathBuf,
    #[arg(long, value_name = "PATH", default_value = "topol.tpr")]
    pub out: PathBuf,
    #[arg(long, value_name = "PATH", default_value = "mdout.mdp")]
    pub po: PathBuf,
    #[arg(long)]
    pub maxwarn: Option<u32>,
    /// Combined stdout/stderr log.
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
    #[command(flatten)]
    pub options: ToolOptions,
}

#[derive(Debug, Clone, Args)]
pub struct MdrunArgs {
    /// Run descriptor.
    #[arg(
        long,
        value_name = "PATH",
        required_unless_present = "deffnm",
        conflicts_with = "deffnm"
    )]
    pub tpr: Option<PathBuf>,
    /// File-name stem for every input and output.
    #[arg(long, value_name = "STEM")]
    pub deffnm: Option<PathBuf>,
    #[arg(long, value_name = "PATH")]
    pub cpi: Option<PathBuf>,
    #[arg(long)]
    pub nt: Option<u32>,
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
    #[command(flatten)]
    pub options: ToolOptions,
}

#[derive(Debug, Clone, Args)]
pub struct ToolArgs {
    /// Subcommand name, e.g. `energy`, `trjconv`, `editconf`.
    pub name: String,
    /// Command whose output answers the tool's prompt, e.g. "echo 9".
    #[arg(long)]
    pub pipe: Option<String>,
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
    #[command(flatten)]
    pub options: ToolOptions,
}

#[derive(Debug, Clone, Args)]
pub struct EnergyArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, value_name = "PATH")]
    pub mdp: PathBuf,
    #[arg(long, value_name = "PATH")]
    pub top: PathBuf,
    #[arg(long, value_name = "PATH")]
    pub conf: PathBuf,
    #[arg(long)]
    pub maxwarn: Option<u32>,
    #[arg(long)]
    pub nt: Option<u32>,
    /// Energy term selected at the `energy` prompt.
    #[arg(long, default_value_t = DEFAULT_ENERGY_TERM)]
    pub term: u32,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulate_collects_repeated_options_in_order() {
        let args = CliArgs::try_parse_from([
            "gmxflow", "--overwrite", "simulate", "--name", "eq1", "--mdp", "eq.mdp", "--top",
            "sys.top", "--conf", "sys.gro", "-O", "dds=0.8", "-O", "v=yes",
        ])
        .unwrap();
        assert!(args.overwrite);
        let Command::Simulate(sim) = args.command else {
            panic!("expected simulate");
        };
        let set = sim.options.to_option_set();
        let names: Vec<&str> = set.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["dds", "v"]);
        assert_eq!(set.get("v"), Some(&OptionValue::Yes));
    }

    #[test]
    fn mdrun_needs_tpr_or_deffnm() {
        assert!(CliArgs::try_parse_from(["gmxflow", "mdrun"]).is_err());
        assert!(CliArgs::try_parse_from(["gmxflow", "mdrun", "--deffnm", "eq"]).is_ok());
    }

    #[test]
    fn mdrun_rejects_tpr_together_with_deffnm() {
        let err = CliArgs::try_parse_from([
            "gmxflow", "mdrun", "--deffnm", "eq", "--tpr", "other.tpr",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn malformed_option_pair_is_rejected() {
        assert!(CliArgs::try_parse_from(["gmxflow", "tool", "energy", "-O", "novalue"]).is_err());
    }
}
