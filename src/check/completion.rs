// src/check/completion.rs

use std::path::Path;

use tracing::debug;

use crate::check::SUCCESS_SENTINEL;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::scan;

/// Extension of the run descriptor written by the preprocessing stage.
pub const DESCRIPTOR_EXTENSION: &str = "tpr";

/// Does `artifact` represent a successful prior run?
///
/// - missing file: no
/// - a run descriptor: existence is enough
/// - anything else is treated as a run log and must contain the success
///   sentinel; a present but truncated log is not complete.
pub fn is_complete(fs: &dyn FileSystem, artifact: &Path) -> Result<bool> {
    if !fs.is_file(artifact) {
        debug!(artifact = %artifact.display(), "artifact missing; not complete");
        return Ok(false);
    }

    if is_descriptor(artifact) {
        return Ok(true);
    }

    let text = fs.read_to_string(artifact)?;
    let lines = scan::lines(&text);
    let finished = scan::split_at_match(&lines, scan::contains(SUCCESS_SENTINEL)).matched();
    debug!(artifact = %artifact.display(), finished, "scanned log for success sentinel");
    Ok(finished)
}

pub fn is_descriptor(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == DESCRIPTOR_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    const FINISHED: &str = "\
Started mdrun on rank 0 Mon Oct 12 10:00:00 2026
           Step           Time
              0        0.00000

Finished mdrun on rank 0 Mon Oct 12 10:05:00 2026
";

    #[test]
    fn missing_artifact_is_not_complete() {
        let fs = MockFileSystem::new();
        assert!(!is_complete(&fs, Path::new("run1.log")).unwrap());
        assert!(!is_complete(&fs, Path::new("run1.tpr")).unwrap());
    }

    #[test]
    fn descriptor_is_complete_by_existence() {
        let fs = MockFileSystem::new();
        fs.add_file("run1.tpr", vec![0u8, 159, 146, 150]);
        assert!(is_complete(&fs, Path::new("run1.tpr")).unwrap());
    }

    #[test]
    fn sentinel_decides_log_completion() {
        let fs = MockFileSystem::new();
        fs.add_file("run1.log", FINISHED);
        assert!(is_complete(&fs, Path::new("run1.log")).unwrap());

        let truncated = FINISHED.replace("Finished mdrun on", "");
        fs.add_file("run2.log", truncated);
        assert!(!is_complete(&fs, Path::new("run2.log")).unwrap());
    }

    #[test]
    fn empty_log_is_not_complete() {
        let fs = MockFileSystem::new();
        fs.add_file("md.log", "");
        assert!(!is_complete(&fs, Path::new("md.log")).unwrap());
    }
}
