// src/exec/command.rs

//! Command-line assembly.
//!
//! A [`CommandLine`] is a template with `{}` placeholders plus the ordered
//! values that fill them. The values are only interpolated by [`CommandLine::argv`],
//! right before the process is spawned.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::errors::{GmxError, Result};
use crate::types::{OptionSet, OptionValue, RESERVED_OPTIONS};

pub const PLACEHOLDER: &str = "{}";

/// Flag spelling for option names that cannot be used directly.
pub fn flag_alias(name: &str) -> &str {
    match name {
        "ntry" => "try",
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    subcommand: String,
    template: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn subcommand(&self) -> &str {
        &self.subcommand
    }

    /// Everything after the program, with `{}` where arguments go.
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn placeholder_count(&self) -> usize {
        self.template
            .split_whitespace()
            .filter(|token| *token == PLACEHOLDER)
            .count()
    }

    /// Interpolate the template into the argument vector passed to the
    /// program (program excluded). Argument values are kept whole even when
    /// they contain whitespace.
    pub fn argv(&self) -> Result<Vec<String>> {
        let placeholders = self.placeholder_count();
        if placeholders != self.args.len() {
            return Err(GmxError::Config(format!(
                "command template {:?} has {} placeholders but {} arguments",
                self.template,
                placeholders,
                self.args.len()
            )));
        }

        let mut values = self.args.iter();
        let argv = self
            .template
            .split_whitespace()
            .map(|token| {
                if token == PLACEHOLDER {
                    // Count checked above.
                    values.next().cloned().unwrap_or_default()
                } else {
                    token.to_string()
                }
            })
            .collect();
        Ok(argv)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        match self.argv() {
            Ok(argv) => {
                for arg in argv {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            Err(_) => write!(f, " {}", self.template),
        }
    }
}

/// Builds a [`CommandLine`] for one subcommand of the wrapped tool.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    line: CommandLine,
}

impl CommandBuilder {
    pub fn new(program: impl Into<PathBuf>, subcommand: &str) -> Self {
        Self {
            line: CommandLine {
                program: program.into(),
                subcommand: subcommand.to_string(),
                template: subcommand.to_string(),
                args: Vec::new(),
            },
        }
    }

    /// Mandatory `-flag value` pair.
    pub fn arg(mut self, flag: &str, value: impl Into<String>) -> Self {
        self.push_placeholder(flag, value.into());
        self
    }

    /// Add one option following the flag rules:
    ///
    /// - reserved names and unset values are skipped
    /// - `Yes`/`No` become a literal `-name yes` / `-name no`
    /// - anything else becomes `-name {}` plus one argument
    pub fn option(mut self, name: &str, value: &OptionValue) -> Self {
        if RESERVED_OPTIONS.contains(&name) {
            trace!(option = name, "reserved option; not a tool flag");
            return self;
        }
        let flag = flag_alias(name);
        match value {
            OptionValue::Unset => {}
            OptionValue::Yes | OptionValue::No => {
                self.line.template.push_str(&format!(" -{flag} {value}"));
                trace!(flag, %value, "switch flag");
            }
            other => {
                if let Some(arg) = other.as_arg() {
                    self.push_placeholder(flag, arg);
                }
            }
        }
        self
    }

    pub fn options(self, options: &OptionSet) -> Self {
        options
            .iter()
            .fold(self, |builder, (name, value)| builder.option(name, value))
    }

    pub fn build(self) -> CommandLine {
        self.line
    }

    fn push_placeholder(&mut self, flag: &str, value: String) {
        trace!(flag, value = %value, "placeholder flag");
        self.line.template.push_str(&format!(" -{flag} {PLACEHOLDER}"));
        self.line.args.push(value);
    }
}
