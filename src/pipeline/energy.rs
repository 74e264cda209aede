// src/pipeline/energy.rs

//! Single-point energy of a configuration: preprocess, rerun the
//! configuration, then extract one energy term with the `energy` tool.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::info;

use crate::errors::{GmxError, Result};
use crate::exec::backend::ExecutorBackend;
use crate::exec::request::Redirects;
use crate::fs::FileSystem;
use crate::pipeline::suffixed;
use crate::scan;
use crate::stage::{Gromacs, PreprocessParams, RunParams, ToolParams};

/// Answer given to the `energy` tool's term-selection prompt by default.
pub const DEFAULT_ENERGY_TERM: u32 = 9;

#[derive(Debug, Clone)]
pub struct SinglePointParams {
    pub name: String,
    pub parameters: PathBuf,
    pub topology: PathBuf,
    pub structure: PathBuf,
    pub maxwarn: Option<u32>,
    pub threads: Option<u32>,
    /// Selection fed to the `energy` prompt.
    pub term: u32,
    pub overwrite: bool,
    pub executable: Option<PathBuf>,
}

impl SinglePointParams {
    pub fn new(
        name: impl Into<String>,
        parameters: impl Into<PathBuf>,
        topology: impl Into<PathBuf>,
        structure: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into(),
            topology: topology.into(),
            structure: structure.into(),
            maxwarn: None,
            threads: Some(1),
            term: DEFAULT_ENERGY_TERM,
            overwrite: false,
            executable: None,
        }
    }
}

impl<B: ExecutorBackend> Gromacs<B> {
    /// Compute the energy of `structure` without propagating it.
    pub async fn single_point(&mut self, params: SinglePointParams) -> Result<f64> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(GmxError::Config(
                "a run identifier is required for a single-point calculation".to_string(),
            ));
        }
        let stem = PathBuf::from(name);
        let descriptor = suffixed(&stem, ".tpr");
        let xvg = suffixed(&stem, ".xvg");

        self.preprocess(
            PreprocessParams::new(&params.parameters, &params.structure, &params.topology)
                .output(&descriptor)
                .processed_parameters(suffixed(&stem, "_mdout.mdp"))
                .maxwarn(params.maxwarn)
                .redirects(Redirects::log(suffixed(&stem, "_pp.txt")))
                .overwrite(params.overwrite)
                .executable(params.executable.clone()),
        )
        .await?;

        let run = self
            .run(
                RunParams::new(&descriptor)
                    .deffnm(&stem)
                    .option("rerun", &params.structure)
                    .threads(params.threads)
                    .redirects(Redirects::log(suffixed(&stem, ".txt")))
                    .overwrite(params.overwrite)
                    .executable(params.executable.clone()),
            )
            .await?;

        let energy_file = run
            .get("e")
            .map(Path::to_path_buf)
            .unwrap_or_else(|| suffixed(&stem, ".edr"));

        self.tool(
            ToolParams::new("energy")
                .option("f", energy_file)
                .option("o", &xvg)
                .pipe(format!("echo {}", params.term))
                .redirects(Redirects::log(suffixed(&stem, "_energy.txt")))
                .executable(params.executable.clone()),
        )
        .await?;

        let energy = read_initial_energy(self.fs(), &xvg)?;
        info!(run = name, energy, "single-point energy");
        Ok(energy)
    }
}

/// Last column of the first data row at time zero.
///
/// Comment (`#`) and plot-directive (`@`) lines are skipped.
pub fn read_initial_energy(fs: &dyn FileSystem, xvg: &Path) -> Result<f64> {
    let text = fs.read_to_string(xvg)?;
    let lines = scan::lines(&text);
    let junk = [Regex::new(r"^\s*[#@]").map_err(anyhow::Error::from)?];

    let rows = scan::collect(&lines, &junk, |line| {
        line.split_whitespace()
            .map(str::to_string)
            .collect::<Vec<String>>()
    });
    let row = rows
        .iter()
        .find(|cols| {
            cols.first()
                .and_then(|time| time.parse::<f64>().ok())
                .is_some_and(|time| time == 0.0)
        })
        .ok_or_else(|| GmxError::Parse {
            path: xvg.to_path_buf(),
            reason: "no data row at time 0".to_string(),
        })?;

    let last = match row.as_slice() {
        [_, .., last] => last.as_str(),
        _ => "",
    };
    last.parse::<f64>().map_err(|e| GmxError::Parse {
        path: xvg.to_path_buf(),
        reason: format!("energy column {last:?}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    const XVG: &str = "\
# This file was created by gmx energy
@    title \"GROMACS Energies\"
@    xaxis  label \"Time (ps)\"
@ s0 legend \"Potential\"
    0.000000  -41.243870
    1.000000  -40.000000
";

    #[test]
    fn reads_energy_at_time_zero() {
        let fs = MockFileSystem::new();
        fs.add_file("sp.xvg", XVG);
        let e = read_initial_energy(&fs, Path::new("sp.xvg")).unwrap();
        assert!((e - -41.24387).abs() < 1e-9);
    }

    #[test]
    fn row_with_only_a_time_column_is_a_parse_error() {
        let fs = MockFileSystem::new();
        fs.add_file("sp.xvg", "@ title \"x\"\n    0.000000\n");
        assert!(matches!(
            read_initial_energy(&fs, Path::new("sp.xvg")),
            Err(GmxError::Parse { .. })
        ));
    }

    #[test]
    fn missing_row_is_a_parse_error() {
        let fs = MockFileSystem::new();
        fs.add_file("sp.xvg", "# header only\n");
        assert!(matches!(
            read_initial_energy(&fs, Path::new("sp.xvg")),
            Err(GmxError::Parse { .. })
        ));
    }
}
