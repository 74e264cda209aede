// src/stage/mod.rs

//! Stage orchestrators.
//!
//! Each stage is one idempotent call into the wrapped tool: it checks the
//! target artifact, either executes or skips, and returns the same
//! [`StageResult`] shape either way.

pub mod preprocess;
pub mod run;
pub mod tool;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use crate::errors::Result;
use crate::exec::backend::ExecutorBackend;
use crate::exec::locate::locate_executable;
use crate::exec::request::Redirects;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::OptionSet;

pub use preprocess::PreprocessParams;
pub use run::RunParams;
pub use tool::ToolParams;

/// Output files of a stage keyed by role (the tool flag that names them,
/// or `out`/`err`/`log` for redirect targets).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageResult {
    files: IndexMap<String, PathBuf>,
}

impl StageResult {
    /// Keep only the roles in `allowed`, in that order, taking paths from
    /// `options` and the redirect targets.
    pub fn gather(allowed: &[&str], options: &OptionSet, redirects: &Redirects) -> Self {
        let redirect_roles = redirects.roles();
        let mut files = IndexMap::new();
        for role in allowed {
            let path = options.path(role).or_else(|| {
                redirect_roles
                    .iter()
                    .find(|(name, _)| name == role)
                    .map(|(_, path)| path.clone())
            });
            if let Some(path) = path {
                files.insert(role.to_string(), path);
            }
        }
        Self { files }
    }

    /// Every valued option plus the redirect targets.
    pub fn from_options(options: &OptionSet, redirects: &Redirects) -> Self {
        let mut files: IndexMap<String, PathBuf> = options
            .iter()
            .filter_map(|(name, value)| value.as_path().map(|p| (name.to_string(), p)))
            .collect();
        for (role, path) in redirects.roles() {
            files.insert(role.to_string(), path);
        }
        Self { files }
    }

    pub fn get(&self, role: &str) -> Option<&Path> {
        self.files.get(role).map(PathBuf::as_path)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.files.contains_key(role)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_path()))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageDecision {
    Execute,
    Skip,
}

/// Execute unless the target is already complete and overwrite is off.
pub fn decide(complete: bool, overwrite: bool) -> StageDecision {
    if complete && !overwrite {
        StageDecision::Skip
    } else {
        StageDecision::Execute
    }
}

pub(crate) fn log_skip(stage: &str, what: &str, artifact: &Path) {
    info!(
        stage,
        artifact = %artifact.display(),
        "successful {what} found; skipping and forwarding outputs"
    );
}

/// Entry point for running the wrapped tool.
///
/// Holds the located executable, the backend that runs requests and the
/// filesystem used for completion and checkpoint decisions. No state is
/// carried between calls; every decision is re-derived from the filesystem.
#[derive(Debug)]
pub struct Gromacs<B> {
    executable: PathBuf,
    backend: B,
    fs: Arc<dyn FileSystem>,
}

impl<B: ExecutorBackend> Gromacs<B> {
    pub fn new(executable: impl Into<PathBuf>, backend: B) -> Self {
        Self {
            executable: executable.into(),
            backend,
            fs: Arc::new(RealFileSystem),
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub(crate) fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Per-call executable override, or the one this context was built with.
    pub(crate) fn executable_for(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        match explicit {
            Some(path) => locate_executable(self.fs(), Some(path), &[]),
            None => Ok(self.executable.clone()),
        }
    }
}
