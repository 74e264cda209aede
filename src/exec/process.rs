// src/exec/process.rs

//! Runs one tool process (plus an optional pipe source feeding its stdin).

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use anyhow::anyhow;
use tempfile::NamedTempFile;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::check::check_for_error;
use crate::errors::{GmxError, Result};
use crate::exec::request::ExecutionRequest;

/// An opened redirect target. Scratch targets are unique per call and are
/// removed when released or dropped.
enum Target {
    Named { path: PathBuf, file: File },
    Scratch(NamedTempFile),
}

impl Target {
    fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                let file = File::create(path)?;
                Ok(Target::Named {
                    path: path.to_path_buf(),
                    file,
                })
            }
            None => {
                let scratch = tempfile::Builder::new()
                    .prefix("gmxflow-")
                    .suffix(".txt")
                    .tempfile()?;
                debug!(path = %scratch.path().display(), "opened scratch redirect");
                Ok(Target::Scratch(scratch))
            }
        }
    }

    fn path(&self) -> &Path {
        match self {
            Target::Named { path, .. } => path,
            Target::Scratch(file) => file.path(),
        }
    }

    fn stdio(&self) -> Result<Stdio> {
        let file = match self {
            Target::Named { file, .. } => file.try_clone()?,
            Target::Scratch(scratch) => scratch.as_file().try_clone()?,
        };
        Ok(Stdio::from(file))
    }

    fn release(self) {
        if let Target::Scratch(scratch) = self {
            let path = scratch.path().to_path_buf();
            if let Err(e) = scratch.close() {
                warn!(path = %path.display(), error = %e, "failed to remove scratch file");
            }
        }
    }
}

/// Run the request to completion, then classify its stderr.
///
/// A classified error in stderr is returned even when the process exited
/// with status 0. A non-zero exit without a classified error is logged and
/// the status returned.
pub async fn run(request: &ExecutionRequest, cancel: &CancellationToken) -> Result<ExitStatus> {
    let (out_path, err_path) = request.redirects.resolved();

    let stdout = Target::open(out_path)?;
    let stderr = if out_path.is_some() && out_path == err_path {
        None
    } else {
        Some(Target::open(err_path)?)
    };

    let result = execute(request, cancel, &stdout, stderr.as_ref().unwrap_or(&stdout)).await;

    stdout.release();
    if let Some(stderr) = stderr {
        stderr.release();
    }
    result
}

async fn execute(
    request: &ExecutionRequest,
    cancel: &CancellationToken,
    stdout: &Target,
    stderr: &Target,
) -> Result<ExitStatus> {
    let argv = request.command.argv()?;
    let rendered = request.command.to_string();

    let mut cmd = Command::new(request.command.program());
    cmd.args(&argv)
        .stdout(stdout.stdio()?)
        .stderr(stderr.stdio()?)
        .kill_on_drop(true);
    // Own process group, so cancellation reaches launchers and their children.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut source = match request.pipe.as_deref() {
        Some(pipe) => {
            let (source, stdin) = spawn_pipe_source(pipe)?;
            cmd.stdin(stdin);
            Some(source)
        }
        None => None,
    };

    info!(
        cmd = %rendered,
        pipe = request.pipe.as_deref().unwrap_or(""),
        stderr = %stderr.path().display(),
        "starting tool process"
    );

    let mut child = cmd.spawn()?;
    // Release our copies of the redirect and pipe handles.
    drop(cmd);

    let Some(status) = wait_or_cancel(&mut child, cancel).await? else {
        if let Some(source) = source.as_mut() {
            terminate(source).await;
        }
        return Err(GmxError::Cancelled { command: rendered });
    };

    if let Some(source) = source.as_mut() {
        match wait_or_cancel(source, cancel).await? {
            Some(source_status) => {
                debug!(exit_code = source_status.code().unwrap_or(-1), "pipe source exited");
            }
            None => return Err(GmxError::Cancelled { command: rendered }),
        }
    }

    let code = status.code().unwrap_or(-1);
    info!(cmd = %rendered, exit_code = code, success = status.success(), "tool process exited");

    let bytes = tokio::fs::read(stderr.path()).await?;
    let text = String::from_utf8_lossy(&bytes);
    check_for_error(stderr.path(), &text, &rendered)?;

    if !status.success() {
        warn!(
            cmd = %rendered,
            exit_code = code,
            "tool exited with failure status but logged no classified error"
        );
    }
    Ok(status)
}

fn spawn_pipe_source(pipe: &str) -> Result<(Child, Stdio)> {
    let mut parts = pipe.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| GmxError::Config("pipe command is empty".to_string()))?;

    let mut source = Command::new(program);
    source
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    source.process_group(0);
    let mut child = source.spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| GmxError::Other(anyhow!("pipe source {pipe:?} has no stdout handle")))?;
    let stdin: Stdio = stdout.try_into()?;
    Ok((child, stdin))
}

/// Wait for `child`, or kill it if `cancel` fires first (`None`).
async fn wait_or_cancel(child: &mut Child, cancel: &CancellationToken) -> Result<Option<ExitStatus>> {
    tokio::select! {
        status = child.wait() => Ok(Some(status?)),
        () = cancel.cancelled() => {
            info!("cancellation requested; killing process");
            terminate(child).await;
            Ok(None)
        }
    }
}

/// Kill `child` and, on unix, every process in its group.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            kill_group(pid).await;
        }
    }
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill child process on cancellation");
    }
}

/// `kill -KILL -- -<pgid>`; the child leads its own group.
#[cfg(unix)]
async fn kill_group(pgid: u32) {
    let group = format!("-{pgid}");
    let result = Command::new("kill")
        .args(["-KILL", "--", group.as_str()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match result {
        Ok(status) if status.success() => debug!(pgid, "killed process group"),
        Ok(status) => warn!(pgid, exit_code = status.code().unwrap_or(-1), "kill of process group failed"),
        Err(e) => warn!(pgid, error = %e, "could not run kill for process group"),
    }
}
