#![allow(dead_code)]

use std::path::PathBuf;

use gmxflow::config::{ConfigFile, DefaultsSection, GromacsSection, RawConfigFile};
use gmxflow::stage::{PreprocessParams, RunParams};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                gromacs: GromacsSection::default(),
                defaults: DefaultsSection::default(),
            },
        }
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.gromacs.executable = Some(path.into());
        self
    }

    pub fn with_candidates(mut self, candidates: &[&str]) -> Self {
        self.config.gromacs.candidates = candidates.iter().map(PathBuf::from).collect();
        self
    }

    pub fn with_overwrite(mut self, val: bool) -> Self {
        self.config.defaults.overwrite = val;
        self
    }

    pub fn with_maxwarn(mut self, val: u32) -> Self {
        self.config.defaults.maxwarn = Some(val);
        self
    }

    pub fn with_threads(mut self, val: u32) -> Self {
        self.config.defaults.nt = Some(val);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Preprocessing inputs named after `name` (`<name>.mdp`, `<name>.gro`, ...).
pub fn preprocess_inputs(name: &str) -> PreprocessParams {
    PreprocessParams::new(
        format!("{name}.mdp"),
        format!("{name}.gro"),
        format!("{name}.top"),
    )
    .output(format!("{name}.tpr"))
    .processed_parameters(format!("{name}_mdout.mdp"))
}

/// Run inputs for descriptor `<name>.tpr` with explicit output names.
pub fn run_inputs(name: &str) -> RunParams {
    let mut params = RunParams::new(format!("{name}.tpr"));
    params.trajectory = format!("{name}.trr").into();
    params.configuration = format!("{name}.gro").into();
    params.energy = format!("{name}.edr").into();
    params.log_file = format!("{name}.log").into();
    params
}
