// src/stage/tool.rs

use std::path::PathBuf;

use crate::errors::{GmxError, Result};
use crate::exec::backend::ExecutorBackend;
use crate::exec::command::CommandBuilder;
use crate::exec::request::{ExecutionRequest, Redirects};
use crate::stage::{Gromacs, StageResult};
use crate::types::{OptionSet, OptionValue};

/// Any subcommand of the wrapped tool, e.g. `energy` or `trjconv`.
///
/// These calls have no completion target and always execute.
#[derive(Debug, Clone)]
pub struct ToolParams {
    pub name: String,
    pub options: OptionSet,
    pub redirects: Redirects,
    /// Answers for interactive prompts, e.g. `echo 9`.
    pub pipe: Option<String>,
    pub executable: Option<PathBuf>,
}

impl ToolParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: OptionSet::new(),
            redirects: Redirects::none(),
            pipe: None,
            executable: None,
        }
    }

    pub fn option(mut self, name: &str, value: impl Into<OptionValue>) -> Self {
        self.options.set(name, value);
        self
    }

    pub fn options(mut self, options: OptionSet) -> Self {
        self.options = options;
        self
    }

    pub fn redirects(mut self, redirects: Redirects) -> Self {
        self.redirects = redirects;
        self
    }

    pub fn pipe(mut self, pipe: impl Into<String>) -> Self {
        self.pipe = Some(pipe.into());
        self
    }

    pub fn executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }
}

impl<B: ExecutorBackend> Gromacs<B> {
    /// Run an arbitrary subcommand. Every valued option is reported back.
    pub async fn tool(&mut self, params: ToolParams) -> Result<StageResult> {
        if params.name.trim().is_empty() {
            return Err(GmxError::Config("tool subcommand name is empty".to_string()));
        }

        let executable = self.executable_for(params.executable.as_deref())?;
        let command = CommandBuilder::new(executable, params.name.trim())
            .options(&params.options)
            .build();
        let request = ExecutionRequest::new(command, params.redirects.clone())
            .with_pipe(params.pipe.clone());
        self.backend.execute(request).await?;

        Ok(StageResult::from_options(&params.options, &params.redirects))
    }
}
