#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use gmxflow::errors::GmxError;
use gmxflow::exec::process;
use gmxflow::exec::{CommandBuilder, ExecutionRequest, ProcessBackend, Redirects};
use gmxflow::pipeline::SimulateParams;
use gmxflow::stage::Gromacs;
use gmxflow_test_utils::fake_tool::{echoing, write_fake_gmx};
use gmxflow_test_utils::{init_tracing, with_timeout};

fn request(gmx: &Path, subcommand: &str, redirects: Redirects) -> ExecutionRequest {
    let command = CommandBuilder::new(gmx, subcommand)
        .arg("f", "in put.mdp")
        .build();
    ExecutionRequest::new(command, redirects)
}

#[tokio::test]
async fn split_streams_land_in_their_own_files() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let gmx = write_fake_gmx(dir.path(), "echo to-stdout\necho to-stderr >&2");
    let out = dir.path().join("a.out");
    let err = dir.path().join("a.err");

    let status = process::run(
        &request(&gmx, "grompp", Redirects::split(&out, &err)),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(status.success());
    assert_eq!(fs::read_to_string(&out).unwrap(), "to-stdout\n");
    assert_eq!(fs::read_to_string(&err).unwrap(), "to-stderr\n");
}

#[tokio::test]
async fn combined_log_receives_both_streams() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let gmx = write_fake_gmx(dir.path(), "echo one\necho two >&2");
    let log = dir.path().join("run.txt");

    process::run(
        &request(&gmx, "mdrun", Redirects::log(&log)),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let text = fs::read_to_string(&log).unwrap();
    assert!(text.contains("one"));
    assert!(text.contains("two"));
}

#[tokio::test]
async fn argument_with_whitespace_stays_whole() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let gmx = write_fake_gmx(dir.path(), "echo \"$#:$3\"");
    let out = dir.path().join("argv.txt");

    process::run(
        &request(&gmx, "grompp", Redirects::split(&out, dir.path().join("e.txt"))),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(fs::read_to_string(&out).unwrap(), "3:in put.mdp\n");
}

#[tokio::test]
async fn user_input_error_is_raised_despite_exit_zero() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let body = echoing(
        "{ echo 'Error in user input:'; echo 'Invalid mdp line 3'; echo; } >&2\nexit 0",
    );
    let gmx = write_fake_gmx(dir.path(), &body);
    let log = dir.path().join("pp.txt");

    let err = process::run(
        &request(&gmx, "grompp", Redirects::log(&log)),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    match err {
        GmxError::UserInput(failure) => {
            assert_eq!(failure.command, "gmx grompp -f in put.mdp");
            assert!(failure.text.starts_with("Error in user input:"));
            assert!(failure.text.contains("Invalid mdp line 3"));
            assert!(failure.path.is_absolute());
            assert!(failure.path.ends_with("pp.txt"));
        }
        other => panic!("Expected UserInput error, got: {:?}", other),
    }
}

#[tokio::test]
async fn fatal_error_is_raised() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let body = echoing("{ echo 'Fatal error:'; echo 'Too many warnings (1).'; echo; } >&2\nexit 1");
    let gmx = write_fake_gmx(dir.path(), &body);

    let err = process::run(
        &request(&gmx, "grompp", Redirects::none()),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, GmxError::Fatal(ref f) if f.text.contains("Too many warnings")));
}

#[tokio::test]
async fn scratch_stderr_is_classified_then_removed() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let gmx = write_fake_gmx(dir.path(), "echo 'Fatal error:' >&2\necho 'boom' >&2");

    let err = process::run(
        &request(&gmx, "mdrun", Redirects::none()),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    let failure = err.tool_failure().cloned().unwrap();
    // No command echo in the log: the rendered command is reported.
    assert!(failure.command.ends_with("gmx mdrun -f in put.mdp"));
    assert!(!failure.path.exists());
}

#[tokio::test]
async fn nonzero_exit_without_diagnostic_is_not_an_error() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let gmx = write_fake_gmx(dir.path(), "echo 'nothing to see' >&2\nexit 3");

    let status = process::run(
        &request(&gmx, "grompp", Redirects::none()),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(status.code(), Some(3));
}

#[tokio::test]
async fn redirect_parents_are_created() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let gmx = write_fake_gmx(dir.path(), "echo deep");
    let log = dir.path().join("a/b/c/run.txt");

    process::run(
        &request(&gmx, "mdrun", Redirects::log(&log)),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(log.is_file());
}

#[tokio::test]
async fn pipe_answers_the_prompt() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let gmx = write_fake_gmx(dir.path(), "read sel\necho \"selected $sel\"");
    let out = dir.path().join("energy.txt");

    let req = request(&gmx, "energy", Redirects::split(&out, dir.path().join("e.txt")))
        .with_pipe(Some("echo 9".to_string()));
    process::run(&req, &CancellationToken::new()).await.unwrap();

    assert_eq!(fs::read_to_string(&out).unwrap(), "selected 9\n");
}

#[tokio::test]
async fn cancellation_kills_a_running_tool() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let gmx = write_fake_gmx(dir.path(), "exec sleep 30");
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        });
    }

    let req = request(&gmx, "mdrun", Redirects::none());
    let err = with_timeout(process::run(&req, &cancel)).await.unwrap_err();

    assert!(matches!(err, GmxError::Cancelled { .. }), "got {err:?}");
}

/// The tool's own children share its process group and go down with it.
#[cfg(target_os = "linux")]
#[tokio::test]
async fn cancellation_reaches_background_children() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let pid_file = dir.path().join("pid");
    let body = format!("sleep 37 &\necho $! > '{}'\nwait", pid_file.display());
    let gmx = write_fake_gmx(dir.path(), &body);
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        let pid_file = pid_file.clone();
        tokio::spawn(async move {
            while fs::read_to_string(&pid_file).map_or(true, |s| s.trim().is_empty()) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            cancel.cancel();
        });
    }

    let req = request(&gmx, "mdrun", Redirects::none());
    let err = with_timeout(process::run(&req, &cancel)).await.unwrap_err();
    assert!(matches!(err, GmxError::Cancelled { .. }), "got {err:?}");

    let pid = fs::read_to_string(&pid_file).unwrap().trim().to_string();
    let stat = Path::new("/proc").join(&pid).join("stat");
    let mut gone = false;
    for _ in 0..100 {
        // A zombie awaiting its reaper counts as gone.
        gone = match fs::read_to_string(&stat) {
            Err(_) => true,
            Ok(s) => s.rsplit(") ").next().is_some_and(|rest| rest.starts_with('Z')),
        };
        if gone {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(gone, "background sleep {pid} survived cancellation");
}

/// Full pipeline against a stand-in binary that writes what the real tool
/// would: the run descriptor for `grompp`, a finished log for `mdrun`.
#[tokio::test]
async fn simulate_end_to_end_is_idempotent() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let calls = dir.path().join("calls.txt");
    let body = format!(
        "echo \"$1\" >> '{calls}'\n\
         sub=\"$1\"; shift\n\
         while [ $# -gt 0 ]; do\n\
         \x20 case \"$sub:$1\" in\n\
         \x20   grompp:-o) echo tpr > \"$2\" ;;\n\
         \x20   mdrun:-deffnm) echo 'Finished mdrun on rank 0' > \"$2.log\" ;;\n\
         \x20 esac\n\
         \x20 shift\n\
         done",
        calls = calls.display()
    );
    let gmx = write_fake_gmx(dir.path(), &body);

    let mut params = SimulateParams::new("eq", "eq.mdp", "topol.top", "conf.gro");
    params.parent = Some(dir.path().join("runs"));

    let mut runner = Gromacs::new(&gmx, ProcessBackend::new(CancellationToken::new()));
    let first = runner.simulate(params.clone()).await.unwrap();
    let second = runner.simulate(params).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&calls).unwrap(), "grompp\nmdrun\n");
    assert!(dir.path().join("runs/eq.tpr").is_file());
    assert!(dir.path().join("runs/eq_pp.txt").is_file());
}
