use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use gmxflow::errors::{GmxError, Result, ToolFailure};
use gmxflow::exec::command::{CommandLine, PLACEHOLDER};
use gmxflow::exec::{ExecutionRequest, ExecutorBackend};
use gmxflow::fs::FileSystem;

/// What the fake tool does for one subcommand.
pub type Effect = Box<dyn Fn(&ExecutionRequest, &dyn FileSystem) -> Result<()> + Send + Sync>;

/// A fake backend that:
/// - records every request it receives
/// - applies the scripted effect for the request's subcommand (writing the
///   files the real tool would write, or failing the way it would).
///
/// Subcommands without a script succeed without touching the filesystem.
pub struct FakeBackend {
    fs: Arc<dyn FileSystem>,
    calls: Arc<Mutex<Vec<ExecutionRequest>>>,
    effects: HashMap<String, Effect>,
}

impl FakeBackend {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            calls: Arc::new(Mutex::new(Vec::new())),
            effects: HashMap::new(),
        }
    }

    pub fn on(
        mut self,
        subcommand: &str,
        effect: impl Fn(&ExecutionRequest, &dyn FileSystem) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.effects.insert(subcommand.to_string(), Box::new(effect));
        self
    }

    /// Shared handle to the recorded requests.
    pub fn calls(&self) -> Arc<Mutex<Vec<ExecutionRequest>>> {
        Arc::clone(&self.calls)
    }

    pub fn recorded(&self) -> Vec<ExecutionRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests for `subcommand`.
    pub fn count(&self, subcommand: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.command.subcommand() == subcommand)
            .count()
    }
}

impl ExecutorBackend for FakeBackend {
    fn execute(
        &mut self,
        request: ExecutionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(request.clone());
            match self.effects.get(request.command.subcommand()) {
                Some(effect) => effect(&request, self.fs.as_ref()),
                None => Ok(()),
            }
        })
    }
}

/// Value interpolated for `-<flag>` in a built command line.
pub fn flag_value(command: &CommandLine, flag: &str) -> Option<String> {
    let wanted = format!("-{flag}");
    let tokens: Vec<&str> = command.template().split_whitespace().collect();
    let mut next_arg = 0;
    for (i, token) in tokens.iter().enumerate() {
        if *token == PLACEHOLDER {
            if i > 0 && tokens[i - 1] == wanted {
                return command.args().get(next_arg).cloned();
            }
            next_arg += 1;
        }
    }
    None
}

/// Log file an mdrun request will write: `-g`, else `<deffnm>.log`, else
/// the tool's default.
pub fn run_log_path(command: &CommandLine) -> PathBuf {
    flag_value(command, "g")
        .map(PathBuf::from)
        .or_else(|| flag_value(command, "deffnm").map(|stem| PathBuf::from(format!("{stem}.log"))))
        .unwrap_or_else(|| PathBuf::from("md.log"))
}

/// Write `contents` to the path given for `-<flag>`.
pub fn writes(flag: &'static str, contents: &'static str) -> Effect {
    Box::new(move |request: &ExecutionRequest, fs: &dyn FileSystem| {
        let path = flag_value(&request.command, flag)
            .ok_or_else(|| anyhow::anyhow!("fake tool: -{flag} not on the command line"))?;
        fs.write(PathBuf::from(path).as_path(), contents.as_bytes())?;
        Ok(())
    })
}

/// Preprocessing that produces its run descriptor.
pub fn grompp_ok() -> Effect {
    writes("o", "fake run descriptor")
}

/// A run that reaches the end and says so in its log.
pub fn mdrun_finishes() -> Effect {
    Box::new(|request: &ExecutionRequest, fs: &dyn FileSystem| {
        let log = run_log_path(&request.command);
        fs.write(
            &log,
            b"Started mdrun on rank 0\n\nFinished mdrun on rank 0 Thu Jan  1 00:00:00 2026\n",
        )?;
        Ok(())
    })
}

/// A run that stops early: it writes a log and a checkpoint, no sentinel.
pub fn mdrun_interrupted() -> Effect {
    Box::new(|request: &ExecutionRequest, fs: &dyn FileSystem| {
        let log = run_log_path(&request.command);
        fs.write(&log, b"Started mdrun on rank 0\nStep 5000\n")?;
        if let Some(tpr) = flag_value(&request.command, "s")
            .or_else(|| flag_value(&request.command, "deffnm").map(|s| format!("{s}.tpr")))
        {
            fs.write(PathBuf::from(tpr).with_extension("cpt").as_path(), b"cpt")?;
        }
        Ok(())
    })
}

fn failure(request: &ExecutionRequest, text: &str) -> ToolFailure {
    let (_, err) = request.redirects.resolved();
    ToolFailure {
        path: err.map(PathBuf::from).unwrap_or_else(|| PathBuf::from("scratch")),
        command: request.command.to_string(),
        text: text.to_string(),
    }
}

/// Fail the way the tool does for bad input files.
pub fn user_input_error(text: &'static str) -> Effect {
    Box::new(move |request: &ExecutionRequest, _: &dyn FileSystem| {
        Err(GmxError::UserInput(failure(request, text)))
    })
}

/// Fail the way the tool does for fatal errors.
pub fn fatal_error(text: &'static str) -> Effect {
    Box::new(move |request: &ExecutionRequest, _: &dyn FileSystem| {
        Err(GmxError::Fatal(failure(request, text)))
    })
}
