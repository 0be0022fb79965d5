mod scanner;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, warn};

pub use scanner::PromptScanner;

use crate::config::HarnessConfig;
use crate::error::ProcessTimedOut;
use crate::verify::{ExitCheck, Outcome, VerificationResult, process_exit};

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessTarget {
    /// A script under the configured bin directory, run through the interpreter.
    Script(PathBuf),
    /// A named executable, looked up in the local bin directories before `PATH`.
    Bin(String),
}

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub target: ProcessTarget,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub commit_message: String,
    pub no_git: bool,
    /// Overrides the configured timeout. `None` falls back to the config.
    pub timeout: Option<Duration>,
}

impl ProcessOptions {
    pub fn new(target: ProcessTarget, cwd: impl Into<PathBuf>) -> Self {
        Self {
            target,
            args: Vec::new(),
            cwd: cwd.into(),
            commit_message: String::new(),
            no_git: false,
            timeout: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn no_git(mut self, no_git: bool) -> Self {
        self.no_git = no_git;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A spawned subject process whose stdout is being answered and whose stderr
/// is being collected.
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    stdout_watcher: Option<JoinHandle<()>>,
    stderr_collector: Option<JoinHandle<String>>,
    check: ExitCheck,
    timeout: Option<Duration>,
    config: HarnessConfig,
}

/// Spawns the subject in `opts.cwd`, answering conflict prompts on its stdin
/// and mirroring its stderr to ours while collecting it.
///
/// A process that cannot be spawned at all is an error here, never an
/// outcome.
pub fn process_bin(cfg: &HarnessConfig, opts: ProcessOptions) -> Result<RunningProcess> {
    let mut command = build_command(cfg, &opts.target)?;
    command
        .args(&opts.args)
        .current_dir(&opts.cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    debug!(?command, "spawning subject process");

    let mut child = command
        .spawn()
        .with_context(|| format!("failed to spawn {:?}", opts.target))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("subject stdin was not piped"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("subject stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("subject stderr was not piped"))?;

    let scanner = PromptScanner::new(cfg);
    let stdout_watcher = std::thread::spawn(move || watch_stdout(stdout, stdin, scanner));
    let stderr_collector = std::thread::spawn(move || collect_stderr(stderr));

    Ok(RunningProcess {
        child,
        stdout_watcher: Some(stdout_watcher),
        stderr_collector: Some(stderr_collector),
        check: ExitCheck {
            cwd: opts.cwd,
            commit_message: opts.commit_message,
            no_git: opts.no_git,
        },
        timeout: opts.timeout.or_else(|| cfg.timeout()),
        config: cfg.clone(),
    })
}

impl RunningProcess {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn kill(&mut self) -> Result<()> {
        match self.child.kill() {
            Ok(()) => Ok(()),
            // Already exited.
            Err(err) if err.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(err) => Err(err).context("failed to kill subject process"),
        }
    }

    /// Waits for exit and classifies it. Whatever the exit code, a finished
    /// process is a handled failure carrying its collected stderr.
    pub fn outcome(&mut self) -> Result<Outcome<String>> {
        match self.wait()? {
            Some(code) => debug!(?code, "subject process exited"),
            None => {
                let timeout = self.timeout.unwrap_or_default();
                warn!(?timeout, pid = self.id(), "subject process timed out; killing");
                self.kill()?;
                self.child.wait().context("failed to reap subject process")?;
                // Grandchildren may still hold the pipes open; let the readers detach.
                self.stdout_watcher.take();
                self.stderr_collector.take();
                return Ok(Outcome::Fatal(ProcessTimedOut { timeout }.into()));
            }
        }
        let stderr = self.join_readers()?;
        Ok(Outcome::HandledFailure(stderr))
    }

    /// Waits for exit, then runs the exit verifier against the working directory.
    pub fn finish(mut self) -> Result<VerificationResult<String>> {
        let outcome = self.outcome()?;
        process_exit(&self.config, outcome, &self.check)
    }

    /// `Some(exit code)` once exited, `None` if the timeout elapsed first.
    fn wait(&mut self) -> Result<Option<Option<i32>>> {
        let Some(timeout) = self.timeout else {
            let status = self.child.wait().context("failed to wait for subject")?;
            return Ok(Some(status.code()));
        };

        let start = Instant::now();
        loop {
            if let Some(status) = self
                .child
                .try_wait()
                .context("failed to wait for subject")?
            {
                return Ok(Some(status.code()));
            }
            if start.elapsed() > timeout {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn join_readers(&mut self) -> Result<String> {
        if let Some(handle) = self.stdout_watcher.take() {
            handle
                .join()
                .map_err(|_| anyhow!("stdout watcher panicked"))?;
        }
        match self.stderr_collector.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("stderr collector panicked")),
            None => Ok(String::new()),
        }
    }
}

fn build_command(cfg: &HarnessConfig, target: &ProcessTarget) -> Result<Command> {
    match target {
        ProcessTarget::Script(file) => {
            let script = absolute(&cfg.bin_dir.join(file))?;
            let mut command = Command::new(&cfg.interpreter);
            command.arg(script);
            Ok(command)
        }
        ProcessTarget::Bin(name) => Ok(Command::new(resolve_bin(cfg, name)?)),
    }
}

/// Prefers an executable in one of the local bin directories; otherwise the
/// bare name, leaving the lookup to `PATH`.
pub fn resolve_bin(cfg: &HarnessConfig, name: &str) -> Result<PathBuf> {
    let file_name = format!("{name}{}", std::env::consts::EXE_SUFFIX);
    for dir in &cfg.local_bin_dirs {
        let candidate = dir.join(&file_name);
        if candidate.is_file() {
            return absolute(&candidate);
        }
    }
    Ok(PathBuf::from(name))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(cwd.join(path))
}

fn watch_stdout(mut stdout: ChildStdout, mut stdin: ChildStdin, mut scanner: PromptScanner) {
    let mut buf = [0u8; 4096];
    loop {
        let read = match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(%err, "failed reading subject stdout");
                break;
            }
        };
        let chunk = String::from_utf8_lossy(&buf[..read]);
        debug!(stdout = %chunk.trim_end());
        for response in scanner.feed(&chunk) {
            debug!(response = %response.escape_debug(), "answering prompt");
            if let Err(err) = stdin.write_all(response.as_bytes()).and_then(|_| stdin.flush()) {
                warn!(%err, "failed writing subject stdin");
            }
        }
    }
}

// Decoded once at EOF so multi-byte characters split across reads survive.
fn collect_stderr(mut stderr: ChildStderr) -> String {
    let mut collected = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let read = match stderr.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => {
                warn!(%err, "failed reading subject stderr");
                break;
            }
        };
        let chunk = &buf[..read];
        let _ = std::io::stderr().write_all(chunk);
        collected.extend_from_slice(chunk);
    }
    String::from_utf8_lossy(&collected).into_owned()
}
