// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! Stage orchestrators hand every [`ExecutionRequest`] to an
//! `ExecutorBackend` instead of spawning processes themselves. This keeps
//! the skip/resume logic testable with a fake backend that records calls.
//!
//! - [`ProcessBackend`] runs real processes and honours a cancellation token.
//! - [`DryRunBackend`] prints the command it would have run.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::errors::Result;
use crate::exec::process;
use crate::exec::request::ExecutionRequest;

/// Trait abstracting how tool invocations are executed.
pub trait ExecutorBackend: Send {
    /// Execute one request to completion.
    ///
    /// Classified tool errors, IO errors and cancellation are returned as
    /// errors; an `Ok` means the stage may forward its outputs.
    fn execute(
        &mut self,
        request: ExecutionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real backend: spawns the tool via [`process::run`].
#[derive(Debug, Clone, Default)]
pub struct ProcessBackend {
    cancel: CancellationToken,
}

impl ProcessBackend {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Token that kills the running tool when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl ExecutorBackend for ProcessBackend {
    fn execute(
        &mut self,
        request: ExecutionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let cancel = self.cancel.clone();
        Box::pin(async move {
            process::run(&request, &cancel).await?;
            Ok(())
        })
    }
}

/// Prints each command line to stdout instead of running it.
#[derive(Debug, Clone, Default)]
pub struct DryRunBackend;

impl ExecutorBackend for DryRunBackend {
    fn execute(
        &mut self,
        request: ExecutionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            info!(cmd = %request.command, "dry-run; not executing");
            match request.pipe {
                Some(pipe) => println!("{pipe} | {}", request.command),
                None => println!("{}", request.command),
            }
            Ok(())
        })
    }
}
