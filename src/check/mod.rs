// src/check/mod.rs

//! Decisions derived from artifacts the wrapped tool leaves behind.
//!
//! - [`classify`] turns stderr/log text into a classified tool error.
//! - [`completion`] decides whether a target artifact is a finished run.
//! - [`checkpoint`] finds the resume artifact next to a run descriptor.
//!
//! The sentinel strings are owned by the wrapped tool's log format.

pub mod checkpoint;
pub mod classify;
pub mod completion;

pub use checkpoint::{checkpoint_path, resolve_checkpoint};
pub use classify::{check_for_error, classify, Classification, Diagnostic};
pub use completion::is_complete;

/// Written at the end of a run log when the run finished normally.
pub const SUCCESS_SENTINEL: &str = "Finished mdrun on";

/// Precedes a diagnostic for configuration the tool rejected.
pub const USER_INPUT_SENTINEL: &str = "Error in user input:";

/// Precedes a diagnostic for an unrecoverable tool failure.
pub const FATAL_SENTINEL: &str = "Fatal error:";

/// The tool echoes its own command line on the line after this marker.
pub const COMMAND_LINE_MARKER: &str = "Command line:";
