// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] assembles template command lines from option sets.
//! - [`request`] describes one invocation and its redirect targets.
//! - [`process`] spawns the tool with `tokio::process::Command`, wires an
//!   optional pipe source into its stdin and classifies its stderr.
//! - [`backend`] provides the `ExecutorBackend` trait the stage
//!   orchestrators call, with real and dry-run implementations.
//! - [`locate`] finds the tool binary.

pub mod backend;
pub mod command;
pub mod locate;
pub mod process;
pub mod request;

pub use backend::{DryRunBackend, ExecutorBackend, ProcessBackend};
pub use command::{CommandBuilder, CommandLine};
pub use locate::{default_candidates, locate_executable};
pub use request::{ExecutionRequest, Redirects};
