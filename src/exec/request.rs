// src/exec/request.rs

use std::path::{Path, PathBuf};

use crate::exec::command::CommandLine;

/// Where the tool's output streams go.
///
/// `log` is a combined target used only when neither `stdout` nor `stderr`
/// is given. Anything left unset goes to a per-call scratch file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirects {
    pub stdout: Option<PathBuf>,
    pub stderr: Option<PathBuf>,
    pub log: Option<PathBuf>,
}

impl Redirects {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn log(path: impl Into<PathBuf>) -> Self {
        Self {
            log: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn split(stdout: impl Into<PathBuf>, stderr: impl Into<PathBuf>) -> Self {
        Self {
            stdout: Some(stdout.into()),
            stderr: Some(stderr.into()),
            log: None,
        }
    }

    /// Effective `(stdout, stderr)` targets after applying the combined-log
    /// rule.
    pub fn resolved(&self) -> (Option<&Path>, Option<&Path>) {
        match (&self.stdout, &self.stderr, &self.log) {
            (None, None, Some(log)) => (Some(log.as_path()), Some(log.as_path())),
            (out, err, _) => (out.as_deref(), err.as_deref()),
        }
    }

    /// Named redirect targets keyed by role (`out`, `err`, `log`).
    pub fn roles(&self) -> Vec<(&'static str, PathBuf)> {
        let (out, err) = self.resolved();
        let mut roles = Vec::new();
        if let Some(out) = out {
            roles.push(("out", out.to_path_buf()));
        }
        if let Some(err) = err {
            roles.push(("err", err.to_path_buf()));
        }
        if let Some(log) = &self.log {
            roles.push(("log", log.clone()));
        }
        roles
    }
}

/// One invocation of the wrapped tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub command: CommandLine,
    pub redirects: Redirects,
    /// Command whose stdout feeds the tool's stdin, e.g. `echo 9` to answer
    /// an interactive selection prompt. Split on whitespace, no shell.
    pub pipe: Option<String>,
}

impl ExecutionRequest {
    pub fn new(command: CommandLine, redirects: Redirects) -> Self {
        Self {
            command,
            redirects,
            pipe: None,
        }
    }

    pub fn with_pipe(mut self, pipe: Option<String>) -> Self {
        self.pipe = pipe;
        self
    }
}
