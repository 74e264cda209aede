// src/exec/locate.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{GmxError, Result};
use crate::fs::FileSystem;

/// Probe list used when the config does not provide one.
pub fn default_candidates() -> Vec<PathBuf> {
    [
        "/usr/local/gromacs/bin/gmx",
        "/opt/gromacs/bin/gmx",
        "/usr/bin/gmx",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// Find the tool binary.
///
/// An explicit path wins and must exist. Otherwise the candidates are
/// probed in order and the first existing file is used.
pub fn locate_executable(
    fs: &dyn FileSystem,
    explicit: Option<&Path>,
    candidates: &[PathBuf],
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if fs.is_file(path) {
            return Ok(path.to_path_buf());
        }
        return Err(GmxError::Config(format!(
            "executable {:?} does not exist",
            path
        )));
    }

    for candidate in candidates {
        let found = fs.is_file(candidate);
        debug!(candidate = %candidate.display(), found, "probing for executable");
        if found {
            return Ok(candidate.clone());
        }
    }

    Err(GmxError::Config(format!(
        "couldn't find an executable (tried {:?})",
        candidates
    )))
}
