// src/logging.rs

//! Log output of the `gmxflow` binary.
//!
//! What is logged, by level:
//! - `info`: pipeline start, each tool process start and exit, stages
//!   skipped because their artifact is complete, runs resumed from a
//!   checkpoint.
//! - `warn`: non-zero exits with no classified diagnostic, scratch files
//!   that could not be removed, failed kills on cancellation.
//! - `debug`: assembled command lines, checkpoint and artifact lookups,
//!   scratch redirects, pipe-source exits, file options
//!   routed into stage fields.
//! - `trace`: each flag as the command builder appends it.
//!
//! The filter comes from `--log-level`, then `GMXFLOW_LOG` (a full
//! `EnvFilter` directive such as `gmxflow=debug,tokio=warn`), then `info`
//! for gmxflow and `warn` for everything else. Output goes to stderr so
//! stdout carries only stage results.

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

const ENV_VAR: &str = "GMXFLOW_LOG";
const DEFAULT_DIRECTIVE: &str = "warn,gmxflow=info";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

/// The CLI flag scopes its level to gmxflow; the env var is taken verbatim.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(format!("warn,gmxflow={}", level_name(level))));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => EnvFilter::try_new(spec)
            .with_context(|| format!("invalid {ENV_VAR} directive {spec:?}")),
        None => Ok(EnvFilter::new(DEFAULT_DIRECTIVE)),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_level_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Trace), Some("gmxflow=error")).unwrap();
        assert!(filter.to_string().contains("gmxflow=trace"));
    }

    #[test]
    fn env_directive_is_used_verbatim() {
        let filter = build_filter(None, Some("gmxflow=debug")).unwrap();
        assert!(filter.to_string().contains("gmxflow=debug"));
    }

    #[test]
    fn bad_env_directive_is_an_error() {
        let err = build_filter(None, Some("gmxflow=loud")).unwrap_err();
        assert!(err.to_string().contains(ENV_VAR));
    }

    #[test]
    fn blank_env_falls_back_to_default() {
        let filter = build_filter(None, Some("  ")).unwrap();
        assert!(filter.to_string().contains("gmxflow=info"));
    }
}
