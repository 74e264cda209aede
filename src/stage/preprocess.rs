// src/stage/preprocess.rs

use std::path::PathBuf;

use tracing::debug;

use crate::check::is_complete;
use crate::errors::{GmxError, Result};
use crate::exec::backend::ExecutorBackend;
use crate::exec::command::CommandBuilder;
use crate::exec::request::{ExecutionRequest, Redirects};
use crate::stage::{decide, log_skip, Gromacs, StageDecision, StageResult};
use crate::types::OptionSet;

pub const SUBCOMMAND: &str = "grompp";

/// Roles a preprocessing call can report back.
pub const OUTPUT_ROLES: &[&str] = &["po", "pp", "o", "t", "imd", "ref", "out", "err", "log"];

/// Inputs of the preprocessing stage (parameters + structure + topology ->
/// run descriptor).
#[derive(Debug, Clone)]
pub struct PreprocessParams {
    /// Simulation parameter file (`-f`).
    pub parameters: PathBuf,
    /// Starting structure (`-c`).
    pub structure: PathBuf,
    /// Topology (`-p`).
    pub topology: PathBuf,
    /// Run descriptor to write (`-o`). Also the completion target.
    pub output: PathBuf,
    /// Processed parameter file (`-po`).
    pub processed_parameters: PathBuf,
    /// Warning tolerance (`-maxwarn`). `Some(0)` is passed explicitly.
    pub maxwarn: Option<u32>,
    /// Any further tool flags, in order.
    pub options: OptionSet,
    pub redirects: Redirects,
    pub overwrite: bool,
    pub executable: Option<PathBuf>,
}

impl PreprocessParams {
    pub fn new(
        parameters: impl Into<PathBuf>,
        structure: impl Into<PathBuf>,
        topology: impl Into<PathBuf>,
    ) -> Self {
        Self {
            parameters: parameters.into(),
            structure: structure.into(),
            topology: topology.into(),
            output: PathBuf::from("topol.tpr"),
            processed_parameters: PathBuf::from("mdout.mdp"),
            maxwarn: None,
            options: OptionSet::new(),
            redirects: Redirects::none(),
            overwrite: false,
            executable: None,
        }
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = path.into();
        self
    }

    pub fn processed_parameters(mut self, path: impl Into<PathBuf>) -> Self {
        self.processed_parameters = path.into();
        self
    }

    pub fn maxwarn(mut self, maxwarn: Option<u32>) -> Self {
        self.maxwarn = maxwarn;
        self
    }

    pub fn option(mut self, name: &str, value: impl Into<crate::types::OptionValue>) -> Self {
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
        let missing: Vec<&str> = [
            ("parameters (-f)", &self.parameters),
            ("structure (-c)", &self.structure),
            ("topology (-p)", &self.topology),
            ("output (-o)", &self.output),
        ]
        .iter()
        .filter(|(_, path)| path.as_os_str().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(GmxError::Config(format!(
                "preprocessing is missing mandatory inputs: {}",
                missing.join(", ")
            )))
        }
    }

    /// Move file flags given as free-form options into their fields, so the
    /// completion target is the descriptor the tool will actually write.
    fn absorb_file_options(mut self) -> Self {
        for flag in ["f", "c", "p", "o", "po"] {
            let Some(path) = self.options.remove(flag).and_then(|v| v.as_path()) else {
                continue;
            };
            debug!(stage = SUBCOMMAND, flag, path = %path.display(), "file flag taken from options");
            match flag {
                "f" => self.parameters = path,
                "c" => self.structure = path,
                "p" => self.topology = path,
                "o" => self.output = path,
                _ => self.processed_parameters = path,
            }
        }
        self
    }

    /// Full ordered flag set: mandatory files first, then caller options.
    fn flags(&self) -> OptionSet {
        let mut flags = OptionSet::new()
            .with("f", &self.parameters)
            .with("c", &self.structure)
            .with("p", &self.topology)
            .with("o", &self.output)
            .with("po", &self.processed_parameters);
        flags.extend(&self.options);
        if let Some(maxwarn) = self.maxwarn {
            flags.set("maxwarn", maxwarn);
        }
        flags
    }
}

impl<B: ExecutorBackend> Gromacs<B> {
    /// Preprocess into a run descriptor, unless one already exists.
    pub async fn preprocess(&mut self, params: PreprocessParams) -> Result<StageResult> {
        let params = params.absorb_file_options();
        params.validate()?;
        let flags = params.flags();

        let complete = is_complete(self.fs(), &params.output)?;
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
            StageDecision::Skip => log_skip(SUBCOMMAND, "preprocessing output", &params.output),
        }

        Ok(StageResult::gather(OUTPUT_ROLES, &flags, &params.redirects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mandatory_flags_lead_and_maxwarn_zero_is_explicit() {
        let params = PreprocessParams::new("a.mdp", "a.gro", "a.top")
            .option("n", "index.ndx")
            .maxwarn(Some(0));
        let flags = params.flags();
        let names: Vec<&str> = flags.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["f", "c", "p", "o", "po", "n", "maxwarn"]);
    }

    #[test]
    fn output_given_as_option_becomes_the_completion_target() {
        let params = PreprocessParams::new("a.mdp", "a.gro", "a.top")
            .option("o", "new.tpr")
            .absorb_file_options();
        assert_eq!(params.output, PathBuf::from("new.tpr"));
        assert!(params.options.is_empty());
        let flags = params.flags();
        let names: Vec<&str> = flags.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["f", "c", "p", "o", "po"]);
    }

    #[test]
    fn unset_maxwarn_is_omitted() {
        let flags = PreprocessParams::new("a.mdp", "a.gro", "a.top").flags();
        assert!(!flags.is_set("maxwarn"));
    }

    #[test]
    fn empty_mandatory_input_is_rejected() {
        let err = PreprocessParams::new("", "a.gro", "a.top").validate().unwrap_err();
        assert!(matches!(err, GmxError::Config(msg) if msg.contains("-f")));
    }
}
