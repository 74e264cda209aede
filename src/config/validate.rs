// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{GmxError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::GmxError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.gromacs, raw.defaults))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_executable(cfg)?;
    validate_defaults(cfg)?;
    Ok(())
}

fn validate_executable(cfg: &RawConfigFile) -> Result<()> {
    if let Some(exe) = &cfg.gromacs.executable {
        if exe.as_os_str().is_empty() {
            return Err(GmxError::Config(
                "[gromacs].executable must not be empty".to_string(),
            ));
        }
        return Ok(());
    }

    if cfg.gromacs.candidates.is_empty() {
        return Err(GmxError::Config(
            "[gromacs].candidates must list at least one path when no executable is set"
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_defaults(cfg: &RawConfigFile) -> Result<()> {
    if cfg.defaults.nt == Some(0) {
        return Err(GmxError::Config(
            "[defaults].nt must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(text: &str) -> Result<ConfigFile> {
        let raw: RawConfigFile = toml::from_str(text)?;
        ConfigFile::try_from(raw)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse("").unwrap();
        assert!(cfg.gromacs.executable.is_none());
        assert!(!cfg.gromacs.candidates.is_empty());
        assert!(!cfg.defaults.overwrite);
        assert_eq!(cfg.defaults.maxwarn, None);
    }

    #[test]
    fn explicit_values_are_read() {
        let cfg = parse(
            r#"
[gromacs]
executable = "/opt/gmx/bin/gmx"

[defaults]
overwrite = true
maxwarn = 0
nt = 8
"#,
        )
        .unwrap();
        assert_eq!(cfg.gromacs.executable, Some(PathBuf::from("/opt/gmx/bin/gmx")));
        assert!(cfg.defaults.overwrite);
        assert_eq!(cfg.defaults.maxwarn, Some(0));
        assert_eq!(cfg.defaults.nt, Some(8));
    }

    #[test]
    fn empty_candidate_list_without_executable_is_rejected() {
        let err = parse("[gromacs]\ncandidates = []\n").unwrap_err();
        assert!(matches!(err, GmxError::Config(msg) if msg.contains("candidates")));
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(matches!(parse("[defaults]\nnt = 0\n"), Err(GmxError::Config(_))));
    }

    #[test]
    fn unknown_keys_are_a_toml_error() {
        assert!(matches!(parse("[defaults]\nthreads = 2\n"), Err(GmxError::TomlError(_))));
    }
}
