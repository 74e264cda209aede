// src/lib.rs

pub mod check;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod scan;
pub mod stage;
pub mod types;

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::check::{checkpoint_path, is_complete, resolve_checkpoint};
use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, ConfigFile};
use crate::errors::Result;
use crate::exec::{locate_executable, DryRunBackend, ExecutorBackend, ProcessBackend, Redirects};
use crate::fs::RealFileSystem;
use crate::pipeline::{SimulateParams, SinglePointParams};
use crate::stage::{Gromacs, PreprocessParams, RunParams, StageResult, ToolParams};

pub use crate::errors::GmxError;

/// Values shared by every stage of one CLI invocation.
#[derive(Debug, Clone, Copy)]
struct Defaults {
    overwrite: bool,
    maxwarn: Option<u32>,
    nt: Option<u32>,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - executable lookup
/// - the process (or dry-run) backend
/// - Ctrl-C handling via a cancellation token
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;

    // Read-only reports need neither the tool nor a backend.
    match &args.command {
        Command::Status { artifact } => {
            let complete = is_complete(&RealFileSystem, artifact)?;
            println!(
                "{}\t{}",
                artifact.display(),
                if complete { "complete" } else { "incomplete" }
            );
            return Ok(());
        }
        Command::Checkpoint { descriptor } => {
            match resolve_checkpoint(&RealFileSystem, descriptor) {
                Some(path) => println!("{}", path.display()),
                None => println!("none (looked for {})", checkpoint_path(descriptor).display()),
            }
            return Ok(());
        }
        _ => {}
    }

    let executable = resolve_executable(&args, &cfg)?;
    let defaults = Defaults {
        overwrite: args.overwrite || cfg.defaults.overwrite,
        maxwarn: cfg.defaults.maxwarn,
        nt: cfg.defaults.nt,
    };

    if args.dry_run {
        let gmx = Gromacs::new(executable, DryRunBackend);
        return dispatch(gmx, args.command, defaults).await;
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl+C received; cancelling");
            cancel.cancel();
        });
    }

    let gmx = Gromacs::new(executable, ProcessBackend::new(cancel));
    dispatch(gmx, args.command, defaults).await
}

fn resolve_executable(args: &CliArgs, cfg: &ConfigFile) -> Result<PathBuf> {
    let explicit = args
        .executable
        .clone()
        .or_else(|| cfg.gromacs.executable.clone());

    match locate_executable(&RealFileSystem, explicit.as_deref(), &cfg.gromacs.candidates) {
        Ok(path) => Ok(path),
        Err(e) if args.dry_run => {
            warn!(error = %e, "no executable found; dry-run will print `gmx`");
            Ok(explicit.unwrap_or_else(|| PathBuf::from("gmx")))
        }
        Err(e) => Err(e),
    }
}

async fn dispatch<B: ExecutorBackend>(
    mut gmx: Gromacs<B>,
    command: Command,
    defaults: Defaults,
) -> Result<()> {
    match command {
        Command::Simulate(a) => {
            let mut params = SimulateParams::new(a.name, a.mdp, a.top, a.conf);
            params.parent = a.parent;
            params.maxwarn = a.maxwarn.or(defaults.maxwarn);
            params.threads = a.nt.or(defaults.nt).or(Some(1));
            params.index = a.ndx;
            params.restraints = a.restr;
            params.tableb = a.tableb;
            params.checkpoint = a.cpi;
            params.run_options = a.options.to_option_set();
            params.overwrite = defaults.overwrite;

            let result = gmx.simulate(params).await?;
            print_result("grompp", &result.preprocess);
            print_result("mdrun", &result.run);
        }
        Command::Grompp(a) => {
            let mut params = PreprocessParams::new(a.mdp, a.conf, a.top)
                .output(a.out)
                .processed_parameters(a.po)
                .maxwarn(a.maxwarn.or(defaults.maxwarn))
                .overwrite(defaults.overwrite);
            params.options = a.options.to_option_set();
            if let Some(log) = a.log {
                params.redirects = Redirects::log(log);
            }
            let result = gmx.preprocess(params).await?;
            print_result("grompp", &result);
        }
        Command::Mdrun(a) => {
            let mut params = match (a.deffnm, a.tpr) {
                (Some(stem), _) => RunParams::new(PathBuf::new()).deffnm(stem),
                (None, Some(tpr)) => RunParams::new(tpr),
                (None, None) => RunParams::new(PathBuf::new()),
            }
            .checkpoint(a.cpi)
            .threads(a.nt.or(defaults.nt))
            .overwrite(defaults.overwrite);
            params.options = a.options.to_option_set();
            if let Some(log) = a.log {
                params.redirects = Redirects::log(log);
            }
            let result = gmx.run(params).await?;
            print_result("mdrun", &result);
        }
        Command::Tool(a) => {
            let mut params = ToolParams::new(a.name).options(a.options.to_option_set());
            params.pipe = a.pipe;
            if let Some(log) = a.log {
                params.redirects = Redirects::log(log);
            }
            let label = params.name.clone();
            let result = gmx.tool(params).await?;
            print_result(&label, &result);
        }
        Command::Energy(a) => {
            let mut params = SinglePointParams::new(a.name, a.mdp, a.top, a.conf);
            params.maxwarn = a.maxwarn.or(defaults.maxwarn);
            params.threads = a.nt.or(defaults.nt).or(Some(1));
            params.term = a.term;
            params.overwrite = defaults.overwrite;
            let energy = gmx.single_point(params).await?;
            println!("{energy}");
        }
        Command::Status { .. } | Command::Checkpoint { .. } => {}
    }
    Ok(())
}

fn print_result(stage: &str, result: &StageResult) {
    println!("{stage}:");
    for (role, path) in result.iter() {
        println!("  {role}\t{}", path.display());
    }
}
