// src/pipeline/mod.rs

//! Multi-stage workflows built on the stage orchestrators.
//!
//! All artifact names are derived from one run identifier so that repeating
//! a workflow finds the artifacts of the previous attempt (skip/resume).

pub mod energy;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::errors::{GmxError, Result};
use crate::exec::backend::ExecutorBackend;
use crate::exec::request::Redirects;
use crate::stage::{Gromacs, PreprocessParams, RunParams, StageResult};
use crate::types::OptionSet;

pub use energy::SinglePointParams;

/// Artifact paths derived from a run identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    /// `<parent>/<name>`; also the run stage's file-name stem.
    pub stem: PathBuf,
    pub descriptor: PathBuf,
    pub processed_parameters: PathBuf,
    pub preprocess_log: PathBuf,
    pub run_log: PathBuf,
}

impl ArtifactNames {
    pub fn derive(name: &str, parent: Option<&Path>) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GmxError::Config(
                "a run identifier is required to derive artifact names".to_string(),
            ));
        }
        let stem = match parent {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        };
        Ok(Self {
            descriptor: suffixed(&stem, ".tpr"),
            processed_parameters: suffixed(&stem, "_mdout.mdp"),
            preprocess_log: suffixed(&stem, "_pp.txt"),
            run_log: suffixed(&stem, ".txt"),
            stem,
        })
    }
}

pub(crate) fn suffixed(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Inputs of [`Gromacs::simulate`].
#[derive(Debug, Clone)]
pub struct SimulateParams {
    /// Run identifier.
    pub name: String,
    pub parameters: PathBuf,
    pub topology: PathBuf,
    pub structure: PathBuf,
    /// Directory the artifacts are written to.
    pub parent: Option<PathBuf>,
    pub maxwarn: Option<u32>,
    pub threads: Option<u32>,
    /// Index groups (`-n` at preprocessing).
    pub index: Option<PathBuf>,
    /// Reference positions for restraints (`-r` at preprocessing).
    pub restraints: Option<PathBuf>,
    /// Overrides the derived processed-parameters path.
    pub processed_parameters: Option<PathBuf>,
    /// Tabulated bonded interactions (`-tableb` at run).
    pub tableb: Option<PathBuf>,
    /// Explicit checkpoint for the run stage.
    pub checkpoint: Option<PathBuf>,
    /// Extra flags forwarded to the run stage.
    pub run_options: OptionSet,
    pub overwrite: bool,
    pub executable: Option<PathBuf>,
}

impl SimulateParams {
    pub fn new(
        name: impl Into<String>,
        parameters: impl Into<PathBuf>,
        topology: impl Into<PathBuf>,
        structure: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into(),
            topology: topology.into(),
            structure: structure.into(),
            parent: None,
            maxwarn: None,
            threads: Some(1),
            index: None,
            restraints: None,
            processed_parameters: None,
            tableb: None,
            checkpoint: None,
            run_options: OptionSet::new(),
            overwrite: false,
            executable: None,
        }
    }
}

/// Outputs of both stages of [`Gromacs::simulate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub preprocess: StageResult,
    pub run: StageResult,
}

impl<B: ExecutorBackend> Gromacs<B> {
    /// Preprocess then run, as one idempotent call.
    ///
    /// A classified error from preprocessing is returned immediately and the
    /// run stage never starts.
    pub async fn simulate(&mut self, params: SimulateParams) -> Result<PipelineResult> {
        let names = ArtifactNames::derive(&params.name, params.parent.as_deref())?;
        info!(run = %params.name, stem = %names.stem.display(), "starting simulation pipeline");

        let mut preprocess = PreprocessParams::new(
            &params.parameters,
            &params.structure,
            &params.topology,
        )
        .output(&names.descriptor)
        .processed_parameters(
            params
                .processed_parameters
                .clone()
                .unwrap_or_else(|| names.processed_parameters.clone()),
        )
        .maxwarn(params.maxwarn)
        .redirects(Redirects::log(&names.preprocess_log))
        .overwrite(params.overwrite)
        .executable(params.executable.clone());
        preprocess.options.set("n", params.index.clone());
        preprocess.options.set("r", params.restraints.clone());

        let preprocess = self.preprocess(preprocess).await?;
        let descriptor = preprocess
            .get("o")
            .map(Path::to_path_buf)
            .unwrap_or_else(|| names.descriptor.clone());

        let mut run = RunParams::new(&descriptor)
            .deffnm(&names.stem)
            .checkpoint(params.checkpoint.clone())
            .threads(params.threads)
            .redirects(Redirects::log(&names.run_log))
            .overwrite(params.overwrite)
            .executable(params.executable.clone());
        // Run whatever preprocessing actually produced.
        run.descriptor = descriptor;
        run.options.set("tableb", params.tableb.clone());
        run.options.extend(&params.run_options);

        let run = self.run(run).await?;

        Ok(PipelineResult { preprocess, run })
    }
}
