// src/check/classify.rs

use std::path::Path;

use crate::check::{COMMAND_LINE_MARKER, FATAL_SENTINEL, USER_INPUT_SENTINEL};
use crate::errors::{GmxError, Result, ToolFailure};
use crate::scan;

/// Diagnostic extracted from a failing log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Command line echoed by the tool, if it echoed one.
    pub command: Option<String>,
    /// Lines from the sentinel up to the next blank line.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Clean,
    UserInput(Diagnostic),
    Fatal(Diagnostic),
}

/// Classify log text.
///
/// User-input errors win over fatal errors wherever they appear in the text.
pub fn classify(text: &str) -> Classification {
    let lines = scan::lines(text);

    if let Some(text) = error_block(&lines, USER_INPUT_SENTINEL) {
        return Classification::UserInput(Diagnostic {
            command: echoed_command(&lines),
            text,
        });
    }
    if let Some(text) = error_block(&lines, FATAL_SENTINEL) {
        return Classification::Fatal(Diagnostic {
            command: echoed_command(&lines),
            text,
        });
    }
    Classification::Clean
}

/// Classify the text read from `log` and raise a classified error if any.
///
/// `fallback_command` is reported when the tool did not echo its command line
/// (e.g. it died before printing its header).
pub fn check_for_error(log: &Path, text: &str, fallback_command: &str) -> Result<()> {
    let (diagnostic, user_input) = match classify(text) {
        Classification::Clean => return Ok(()),
        Classification::UserInput(d) => (d, true),
        Classification::Fatal(d) => (d, false),
    };

    let failure = ToolFailure {
        path: std::path::absolute(log).unwrap_or_else(|_| log.to_path_buf()),
        command: diagnostic
            .command
            .unwrap_or_else(|| fallback_command.to_string()),
        text: diagnostic.text,
    };
    if user_input {
        Err(GmxError::UserInput(failure))
    } else {
        Err(GmxError::Fatal(failure))
    }
}

fn error_block(lines: &[&str], sentinel: &str) -> Option<String> {
    let start = scan::find_from(lines, 0, scan::contains(sentinel))?;
    let block = scan::take_until(lines, start, scan::is_blank);
    let mut text = String::new();
    for line in block {
        text.push_str(line);
        text.push('\n');
    }
    Some(text)
}

fn echoed_command(lines: &[&str]) -> Option<String> {
    let split = scan::split_at_match(lines, scan::contains(COMMAND_LINE_MARKER));
    if !split.matched() {
        return None;
    }
    split
        .after
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\
                      :-) GROMACS - gmx grompp, 2018 (-:

Executable:   /usr/local/gromacs/bin/gmx
Command line:
  gmx grompp -f run1.mdp -c conf.gro -p topol.top -o run1.tpr

";

    const USER_INPUT: &str = "\
Error in user input:
Invalid command-line options
  In command-line option -f
    File 'run1.mdp' does not exist or is not accessible.

For more information and tips for troubleshooting, please check the GROMACS
";

    const FATAL: &str = "\
Fatal error:
Too many warnings (2).
If you are sure all warnings are harmless, use the -maxwarn option.

";

    #[test]
    fn clean_log_has_no_error() {
        let log = format!("{HEADER}Back Off! I just backed up run1.tpr\n");
        assert_eq!(classify(&log), Classification::Clean);
    }

    #[test]
    fn user_input_error_captures_command_and_block() {
        let log = format!("{HEADER}{USER_INPUT}");
        match classify(&log) {
            Classification::UserInput(d) => {
                assert_eq!(
                    d.command.as_deref(),
                    Some("gmx grompp -f run1.mdp -c conf.gro -p topol.top -o run1.tpr")
                );
                assert!(d.text.starts_with("Error in user input:\n"));
                assert!(d.text.contains("does not exist"));
                assert!(!d.text.contains("troubleshooting"));
            }
            other => panic!("expected user input error, got {other:?}"),
        }
    }

    #[test]
    fn fatal_error_is_classified() {
        let log = format!("{HEADER}{FATAL}");
        match classify(&log) {
            Classification::Fatal(d) => {
                assert!(d.text.contains("Too many warnings"));
                assert!(d.text.contains("-maxwarn"));
            }
            other => panic!("expected fatal error, got {other:?}"),
        }
    }

    #[test]
    fn user_input_wins_regardless_of_order() {
        let fatal_first = format!("{HEADER}{FATAL}{USER_INPUT}");
        let user_first = format!("{HEADER}{USER_INPUT}\n{FATAL}");
        assert!(matches!(classify(&fatal_first), Classification::UserInput(_)));
        assert!(matches!(classify(&user_first), Classification::UserInput(_)));
    }

    #[test]
    fn missing_echo_falls_back_to_the_run_command() {
        let err = check_for_error(Path::new("err.txt"), FATAL, "gmx mdrun -s a.tpr").unwrap_err();
        let failure = err.tool_failure().unwrap();
        assert_eq!(failure.command, "gmx mdrun -s a.tpr");
        assert!(failure.path.is_absolute());
        assert!(matches!(err, GmxError::Fatal(_)));
    }

    #[test]
    fn clean_text_passes() {
        assert!(check_for_error(Path::new("x"), HEADER, "gmx").is_ok());
    }
}
