// src/check/checkpoint.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::fs::FileSystem;

pub const CHECKPOINT_EXTENSION: &str = "cpt";

/// The single candidate checkpoint for `descriptor`: same directory and stem,
/// checkpoint extension.
pub fn checkpoint_path(descriptor: &Path) -> PathBuf {
    descriptor.with_extension(CHECKPOINT_EXTENSION)
}

/// Return the checkpoint for `descriptor` if it exists. No further search.
pub fn resolve_checkpoint(fs: &dyn FileSystem, descriptor: &Path) -> Option<PathBuf> {
    let candidate = checkpoint_path(descriptor);
    let found = fs.is_file(&candidate);
    debug!(candidate = %candidate.display(), found, "checkpoint lookup");
    found.then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn resolves_present_checkpoint() {
        let fs = MockFileSystem::new();
        fs.add_file("runs/run7.cpt", "bin");
        assert_eq!(
            resolve_checkpoint(&fs, Path::new("runs/run7.tpr")),
            Some(PathBuf::from("runs/run7.cpt"))
        );
    }

    #[test]
    fn absent_checkpoint_resolves_to_none() {
        let fs = MockFileSystem::new();
        fs.add_file("runs/run7.tpr", "bin");
        fs.add_file("runs/other.cpt", "bin");
        assert_eq!(resolve_checkpoint(&fs, Path::new("runs/run7.tpr")), None);
    }

    #[test]
    fn only_the_extension_is_substituted() {
        assert_eq!(checkpoint_path(Path::new("a.b/run7.tpr")), PathBuf::from("a.b/run7.cpt"));
        assert_eq!(checkpoint_path(Path::new("run7")), PathBuf::from("run7.cpt"));
    }
}
