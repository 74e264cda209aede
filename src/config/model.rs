// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::exec::locate::default_candidates;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [gromacs]
/// executable = "/opt/gromacs-2023/bin/gmx"
/// candidates = ["/usr/local/gromacs/bin/gmx", "/usr/bin/gmx"]
///
/// [defaults]
/// overwrite = false
/// maxwarn = 1
/// nt = 4
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub gromacs: GromacsSection,

    #[serde(default)]
    pub defaults: DefaultsSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub gromacs: GromacsSection,
    pub defaults: DefaultsSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(gromacs: GromacsSection, defaults: DefaultsSection) -> Self {
        Self { gromacs, defaults }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(GromacsSection::default(), DefaultsSection::default())
    }
}

/// `[gromacs]` section: where the tool binary lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GromacsSection {
    /// Explicit binary; skips probing.
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Probed in order when `executable` is not set.
    #[serde(default = "default_candidates")]
    pub candidates: Vec<PathBuf>,
}

impl Default for GromacsSection {
    fn default() -> Self {
        Self {
            executable: None,
            candidates: default_candidates(),
        }
    }
}

/// `[defaults]` section: values used when the command line omits them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultsSection {
    #[serde(default)]
    pub overwrite: bool,

    /// Warning tolerance for preprocessing; `0` is passed explicitly.
    #[serde(default)]
    pub maxwarn: Option<u32>,

    /// Thread count for the run stage.
    #[serde(default)]
    pub nt: Option<u32>,
}
