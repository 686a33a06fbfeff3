//! Execution of the external `yarn` binary.
//!
//! The [`Executable`] trait is the seam between the install logic and the
//! real process; [`YarnExecutable`] runs it with `tokio::process`.

use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::environment::BuildEnvironment;
use crate::install::{InstallError, InstallResult};

/// Where the output of an execution goes besides the returned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Only collect output.
    Capture,
    /// Collect output and log each line as it arrives.
    Stream,
}

/// One invocation of the external tool.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Arguments after the program name.
    pub args: Vec<String>,
    /// Complete environment for the child.
    pub env: BuildEnvironment,
    /// Working directory of the child.
    pub dir: PathBuf,
    /// Output handling.
    pub output: OutputMode,
}

impl Execution {
    /// Render the command line for logs and errors.
    pub fn command_line(&self, program: &str) -> String {
        std::iter::once(program)
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a completed execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// Exit code; `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Interleaved stdout and stderr, one line per `\n`; invalid UTF-8 is
    /// replaced with U+FFFD.
    pub output: String,
}

impl ExecutionOutput {
    /// Whether the process exited with code zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that can run the package manager.
///
/// An `Err` means the process could not be launched or its pipes could not be
/// read; a process that ran and failed is an `Ok` with a nonzero exit code.
#[async_trait]
pub trait Executable: Send + Sync {
    /// Program name used when rendering command lines.
    fn program(&self) -> &str;

    /// Run to completion.
    async fn execute(&self, execution: Execution) -> io::Result<ExecutionOutput>;
}

/// The real `yarn` binary.
///
/// The program is resolved with `which` against the `PATH` of each
/// execution's environment, so a project-local `node_modules/.bin/yarn`
/// shadows a global one.
#[derive(Debug, Clone)]
pub struct YarnExecutable {
    program: String,
}

impl Default for YarnExecutable {
    fn default() -> Self {
        Self::new()
    }
}

impl YarnExecutable {
    /// Run `yarn`.
    pub fn new() -> Self {
        Self::with_program("yarn")
    }

    /// Run a different program with the same semantics.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn resolve(&self, execution: &Execution) -> PathBuf {
        which::which_in(&self.program, execution.env.path(), &execution.dir)
            .unwrap_or_else(|_| PathBuf::from(&self.program))
    }
}

#[async_trait]
impl Executable for YarnExecutable {
    fn program(&self) -> &str {
        &self.program
    }

    async fn execute(&self, execution: Execution) -> io::Result<ExecutionOutput> {
        let program = self.resolve(&execution);
        tracing::debug!(
            program = %program.display(),
            dir = %execution.dir.display(),
            args = ?execution.args,
            "spawning"
        );

        let mut child = Command::new(&program)
            .args(&execution.args)
            .env_clear()
            .envs(execution.env.iter())
            .current_dir(&execution.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stream = execution.output == OutputMode::Stream;
        let combined = Mutex::new(Vec::new());

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stderr not captured"))?;

        futures::future::try_join(
            drain(stdout, &combined, stream),
            drain(stderr, &combined, stream),
        )
        .await?;

        let status = child.wait().await?;
        let bytes = combined.into_inner().unwrap_or_else(|e| e.into_inner());

        Ok(ExecutionOutput {
            exit_code: status.code(),
            output: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Run an execution and require a zero exit code.
///
/// Returns the combined output; failures carry it in
/// [`InstallError::Subprocess`].
pub(crate) async fn run_checked<E>(executable: &E, execution: Execution) -> InstallResult<String>
where
    E: Executable + ?Sized,
{
    let command = execution.command_line(executable.program());
    match executable.execute(execution).await {
        Ok(result) if result.success() => Ok(result.output),
        Ok(result) => Err(InstallError::Subprocess {
            command,
            message: match result.exit_code {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            },
            exit_code: result.exit_code,
            output: result.output,
        }),
        Err(e) => Err(InstallError::Subprocess {
            command,
            exit_code: None,
            output: String::new(),
            message: e.to_string(),
        }),
    }
}

/// Copy `reader` into `combined` line by line. Lines are raw bytes; tools
/// may print in a non-UTF-8 locale.
async fn drain<R>(reader: R, combined: &Mutex<Vec<u8>>, stream: bool) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if stream {
            tracing::info!(target: "yarn", "{}", String::from_utf8_lossy(&line));
        }
        let mut buffer = combined.lock().unwrap_or_else(|e| e.into_inner());
        buffer.extend_from_slice(&line);
        buffer.push(b'\n');
    }
    Ok(())
}
