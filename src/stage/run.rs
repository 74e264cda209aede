// src/stage/run.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::check::{is_complete, resolve_checkpoint};
use crate::errors::{GmxError, Result};
use crate::exec::backend::ExecutorBackend;
use crate::exec::command::CommandBuilder;
use crate::exec::request::{ExecutionRequest, Redirects};
use crate::stage::{decide, log_skip, Gromacs, StageDecision, StageResult};
use crate::types::{OptionSet, OptionValue};

pub const SUBCOMMAND: &str = "mdrun";

/// Roles a run call can report back.
pub const OUTPUT_ROLES: &[&str] = &[
    "o", "x", "cpo", "c", "e", "g", "dhdl", "field", "tpi", "tpid", "eo", "devout", "runav", "px",
    "pf", "ro", "ra", "rs", "rt", "mtx", "dn", "if", "swap", "out", "err", "log",
];

/// Inputs of the run stage (run descriptor -> trajectory, energies, log).
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Run descriptor (`-s`). Also where the checkpoint is looked up.
    pub descriptor: PathBuf,
    /// Trajectory (`-o`).
    pub trajectory: PathBuf,
    /// Final configuration (`-c`).
    pub configuration: PathBuf,
    /// Energy file (`-e`).
    pub energy: PathBuf,
    /// Run log (`-g`). Also the completion target.
    pub log_file: PathBuf,
    /// Default file-name stem (`-deffnm`). Overrides the five paths above.
    pub deffnm: Option<PathBuf>,
    /// Explicit checkpoint to resume from (`-cpi`). Disables the lookup.
    pub checkpoint: Option<PathBuf>,
    /// Thread count (`-nt`).
    pub threads: Option<u32>,
    pub options: OptionSet,
    pub redirects: Redirects,
    pub overwrite: bool,
    pub executable: Option<PathBuf>,
}

impl RunParams {
    pub fn new(descriptor: impl Into<PathBuf>) -> Self {
        Self {
            descriptor: descriptor.into(),
            trajectory: PathBuf::from("traj.trr"),
            configuration: PathBuf::from("confout.gro"),
            energy: PathBuf::from("ener.edr"),
            log_file: PathBuf::from("md.log"),
            deffnm: None,
            checkpoint: None,
            threads: None,
            options: OptionSet::new(),
            redirects: Redirects::none(),
            overwrite: false,
            executable: None,
        }
    }

    /// Derive every file name from `stem` (`<stem>.tpr`, `<stem>.log`, ...).
    pub fn deffnm(mut self, stem: impl Into<PathBuf>) -> Self {
        let stem = stem.into();
        self.descriptor = with_suffix(&stem, "tpr");
        self.trajectory = with_suffix(&stem, "trr");
        self.configuration = with_suffix(&stem, "gro");
        self.energy = with_suffix(&stem, "edr");
        self.log_file = with_suffix(&stem, "log");
        self.deffnm = Some(stem);
        self
    }

    pub fn checkpoint(mut self, checkpoint: Option<PathBuf>) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    pub fn threads(mut self, threads: Option<u32>) -> Self {
        self.threads = threads;
        self
    }

    pub fn option(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.options.set(name, value);
        self
    }

    pub fn redirects(mut self, redirects: Redirects) -> Self {
        self.redirects = redirects;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.descriptor.as_os_str().is_empty() {
            return Err(GmxError::Config(
                "run stage is missing its mandatory descriptor (-s)".to_string(),
            ));
        }
        Ok(())
    }

    /// Move file flags given as free-form options into their fields, so the
    /// completion target and checkpoint lookup see the paths the tool will
    /// actually use.
    fn absorb_file_options(mut self) -> Self {
        if let Some(stem) = self.options.remove("deffnm").and_then(|v| v.as_path()) {
            self = self.deffnm(stem);
        }
        for flag in ["s", "o", "c", "e", "g", "cpi"] {
            let Some(path) = self.options.remove(flag).and_then(|v| v.as_path()) else {
                continue;
            };
            debug!(stage = SUBCOMMAND, flag, path = %path.display(), "file flag taken from options");
            match flag {
                "s" => self.descriptor = path,
                "o" => self.trajectory = path,
                "c" => self.configuration = path,
                "e" => self.energy = path,
                "g" => self.log_file = path,
                _ => self.checkpoint = Some(path),
            }
        }
        self
    }

    /// Flags for the command line. With a stem, `-deffnm` names the files
    /// and only paths that differ from the stem-derived ones are passed.
    fn flags(&self) -> OptionSet {
        let files = [
            ("s", &self.descriptor, "tpr"),
            ("o", &self.trajectory, "trr"),
            ("c", &self.configuration, "gro"),
            ("e", &self.energy, "edr"),
            ("g", &self.log_file, "log"),
        ];
        let mut flags = OptionSet::new();
        match &self.deffnm {
            Some(stem) => {
                flags.set("deffnm", stem);
                for (flag, path, ext) in files {
                    if *path != with_suffix(stem, ext) {
                        flags.set(flag, path);
                    }
                }
            }
            None => {
                for (flag, path, _) in files {
                    flags.set(flag, path);
                }
            }
        }
        flags.extend(&self.options);
        if let Some(threads) = self.threads {
            flags.set("nt", threads);
        }
        if let Some(checkpoint) = &self.checkpoint {
            flags.set("cpi", checkpoint);
        }
        flags
    }

    /// Flags plus the derived file roles, for gathering outputs.
    fn roles(&self, flags: &OptionSet) -> OptionSet {
        let mut roles = OptionSet::new()
            .with("s", &self.descriptor)
            .with("o", &self.trajectory)
            .with("c", &self.configuration)
            .with("e", &self.energy)
            .with("g", &self.log_file);
        roles.extend(flags);
        roles
    }
}

fn with_suffix(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

impl<B: ExecutorBackend> Gromacs<B> {
    /// Run a descriptor, resuming from its checkpoint when one is present,
    /// unless the run log already shows a finished run.
    pub async fn run(&mut self, params: RunParams) -> Result<StageResult> {
        let params = params.absorb_file_options();
        params.validate()?;
        let mut flags = params.flags();

        let complete = is_complete(self.fs(), &params.log_file)?;

        if !complete && !flags.is_set("cpi") {
            if let Some(checkpoint) = resolve_checkpoint(self.fs(), &params.descriptor) {
                info!(
                    stage = SUBCOMMAND,
                    checkpoint = %checkpoint.display(),
                    "partial checkpoint found; resuming simulation from it"
                );
                flags.set("cpi", checkpoint);
            }
        }

        match decide(complete, params.overwrite) {
            StageDecision::Execute => {
                let executable = self.executable_for(params.executable.as_deref())?;
                let command = CommandBuilder::new(executable, SUBCOMMAND)
                    .options(&flags)
                    .build();
                debug!(stage = SUBCOMMAND, template = command.template(), "assembled command");
                self.backend
                    .execute(ExecutionRequest::new(command, params.redirects.clone()))
                    .await?;
            }
            StageDecision::Skip => log_skip(SUBCOMMAND, "simulation output", &params.log_file),
        }

        let roles = params.roles(&flags);
        Ok(StageResult::gather(OUTPUT_ROLES, &roles, &params.redirects))
    }
}
