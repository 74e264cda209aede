// src/errors.rs

//! Crate-wide error type.
//!
//! Two of the variants (`UserInput`, `Fatal`) come from scanning the wrapped
//! tool's own log output; everything else is raised by this crate before or
//! around the process.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Payload shared by both classified tool failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    /// Absolute path of the log the diagnostic was read from.
    pub path: PathBuf,
    /// Command line that produced the failure.
    pub command: String,
    /// Diagnostic block, verbatim.
    pub text: String,
}

impl fmt::Display for ToolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\n----\n\nFile:\n{}\n\nCommand:\n{}\n\nError:\n{}----",
            self.path.display(),
            self.command,
            self.text
        )
    }
}

#[derive(Error, Debug)]
pub enum GmxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error in user input reported by the tool: {0}")]
    UserInput(ToolFailure),

    #[error("Fatal error reported by the tool: {0}")]
    Fatal(ToolFailure),

    #[error("Cancelled while running: {command}")]
    Cancelled { command: String },

    #[error("Could not parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GmxError {
    /// The tool diagnostic, if this error was produced by log classification.
    pub fn tool_failure(&self) -> Option<&ToolFailure> {
        match self {
            GmxError::UserInput(failure) | GmxError::Fatal(failure) => Some(failure),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GmxError>;
