//! Stand-in executables for tests that spawn real processes.

use std::fs;
use std::path::{Path, PathBuf};

/// Write an executable `gmx` shell script into `dir`.
///
/// `body` is the script after the shebang; `$1` is the subcommand and the
/// remaining arguments follow as the tool would receive them.
#[cfg(unix)]
pub fn write_fake_gmx(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("gmx");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake gmx");
    let mut perms = fs::metadata(&path).expect("stat fake gmx").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake gmx");
    path
}

/// Script body that prints the tool's header with its command echo to
/// stderr, then runs `tail`.
pub fn echoing(tail: &str) -> String {
    format!(
        "{{\n\
         echo '            :-) GROMACS - gmx '\"$1\"', 2026.1 (-:'\n\
         echo\n\
         echo 'Command line:'\n\
         echo \"  gmx $*\"\n\
         echo\n\
         }} 1>&2\n\
         {tail}"
    )
}
