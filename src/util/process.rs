//! Subprocess execution utilities.
//!
//! Compiles are spawned with stderr piped and drained on a reader thread, so
//! the caller is never blocked while the compiler runs. Terminals are spawned
//! detached and reaped in the background.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::builder::toolchain::CommandSpec;
use crate::core::invocation::BuildResult;
use crate::util::errors::BuildError;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    #[cfg_attr(not(windows), allow(dead_code))]
    new_console: bool,
    #[cfg_attr(not(windows), allow(dead_code))]
    raw_args: bool,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        ProcessBuilder {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            new_console: false,
            raw_args: false,
        }
    }

    /// Create a process builder from a command spec.
    pub fn from_spec(spec: &CommandSpec) -> Self {
        let mut pb = ProcessBuilder::new(spec.program.clone()).args(spec.args.iter());
        if let Some(ref dir) = spec.cwd {
            pb = pb.cwd(dir);
        }
        pb.new_console = spec.new_console;
        pb.raw_args = spec.raw_args;
        pb
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program name.
    pub fn get_program(&self) -> &str {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        self.apply_args(&mut cmd);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    #[cfg(windows)]
    fn apply_args(&self, cmd: &mut Command) {
        use std::os::windows::process::CommandExt;

        const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

        if self.new_console {
            cmd.creation_flags(CREATE_NEW_CONSOLE);
        }
        if self.raw_args {
            for arg in &self.args {
                cmd.raw_arg(arg);
            }
        } else {
            cmd.args(&self.args);
        }
    }

    #[cfg(not(windows))]
    fn apply_args(&self, cmd: &mut Command) {
        cmd.args(&self.args);
    }

    fn spawn(&self, cmd: &mut Command) -> Result<Child, BuildError> {
        retry_busy(|| cmd.spawn()).map_err(|e| BuildError::from_spawn(&self.program, e))
    }

    /// Start the process, capturing stderr. Returns immediately.
    pub fn spawn_captured(&self) -> Result<RunningProcess, BuildError> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        tracing::debug!("spawning `{}`", self.display_command());
        let mut child = self.spawn(&mut cmd)?;

        let reader = match child.stderr.take() {
            Some(stderr) => thread::spawn(move || drain(stderr)),
            None => thread::spawn(|| Ok(Vec::new())),
        };

        Ok(RunningProcess {
            program: self.program.clone(),
            child,
            reader,
        })
    }

    /// Start the process and forget about it.
    ///
    /// The child is waited on by a background thread so it never lingers as a
    /// zombie; its exit status is only logged.
    pub fn spawn_detached(&self) -> Result<(), BuildError> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        tracing::debug!("launching `{}`", self.display_command());
        let mut child = self.spawn(&mut cmd)?;

        let program = self.program.clone();
        thread::spawn(move || match child.wait() {
            Ok(status) => tracing::debug!("`{}` exited with {}", program, status),
            Err(e) => tracing::debug!("failed to wait for `{}`: {}", program, e),
        });
        Ok(())
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Attempts made when the executable is still open for writing.
const BUSY_ATTEMPTS: u32 = 5;

/// Retry `spawn` while it fails with `ETXTBSY`.
///
/// A freshly written binary can still be held open for writing by a child
/// that another thread forked and has not yet exec'd. That window is short.
fn retry_busy<T>(mut spawn: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut attempt = 1;
    loop {
        match spawn() {
            Err(e) if e.kind() == io::ErrorKind::ExecutableFileBusy && attempt < BUSY_ATTEMPTS => {
                tracing::debug!("executable busy, retrying (attempt {})", attempt);
                thread::sleep(Duration::from_millis(10 * u64::from(attempt)));
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Read a pipe to EOF, keeping fragments in the order they arrive.
fn drain(mut pipe: impl Read) -> io::Result<Vec<u8>> {
    let mut collected = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk) {
            Ok(0) => return Ok(collected),
            Ok(n) => collected.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// A process started by `spawn_captured`.
#[derive(Debug)]
pub struct RunningProcess {
    program: String,
    child: Child,
    reader: JoinHandle<io::Result<Vec<u8>>>,
}

impl RunningProcess {
    /// OS process id.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Block until the process exits and stderr is fully read.
    ///
    /// Resolves with the exit code and all of stderr whatever the exit code
    /// was; interpreting it is the caller's business.
    pub fn wait(mut self) -> Result<BuildResult, BuildError> {
        let status = self.child.wait().map_err(|e| BuildError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        let bytes = self
            .reader
            .join()
            .map_err(|_| BuildError::Spawn {
                program: self.program.clone(),
                source: io::Error::other("stderr reader panicked"),
            })?
            .map_err(|e| BuildError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&bytes).into_owned();
        tracing::debug!(
            "`{}` exited with {:?} ({} bytes of stderr)",
            self.program,
            status.code(),
            stderr.len()
        );
        Ok(BuildResult::new(status.code(), stderr))
    }

    /// Wait on a background thread and hand the result to `on_done`.
    pub fn on_complete<F>(self, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<BuildResult, BuildError>) + Send + 'static,
    {
        thread::spawn(move || on_done(self.wait()))
    }
}

/// Spawn `spec` with stderr captured.
pub fn run(spec: &CommandSpec) -> Result<RunningProcess, BuildError> {
    ProcessBuilder::from_spec(spec).spawn_captured()
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::invocation::Outcome;

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("gcc").args(["-Wall", "-o", "output", "input.c"]);
        assert_eq!(pb.display_command(), "gcc -Wall -o output input.c");
    }

    #[test]
    fn test_missing_executable() {
        let err = ProcessBuilder::new("definitely-not-a-real-compiler-9f3a")
            .spawn_captured()
            .unwrap_err();
        assert!(err.is_executable_not_found());
    }

    #[test]
    fn test_retry_busy_until_spawned() {
        let mut calls = 0;
        let result = retry_busy(|| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::from(io::ErrorKind::ExecutableFileBusy))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_retry_busy_gives_up() {
        let mut calls = 0;
        let err = retry_busy(|| -> io::Result<()> {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::ExecutableFileBusy))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ExecutableFileBusy);
        assert_eq!(calls, BUSY_ATTEMPTS);
    }

    #[test]
    fn test_retry_busy_leaves_other_errors() {
        let mut calls = 0;
        let err = retry_busy(|| -> io::Result<()> {
            calls += 1;
            Err(io::Error::from(io::ErrorKind::NotFound))
        })
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_spec_flags_carried_over() {
        let spec = CommandSpec::new("cmd").arg("/K").new_console().raw_args();
        let pb = ProcessBuilder::from_spec(&spec);
        assert!(pb.new_console);
        assert!(pb.raw_args);
        assert_eq!(pb.get_args(), ["/K"]);
    }

    #[test]
    fn test_drain_keeps_order() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let out = drain(&data[..]).unwrap();
        assert_eq!(out, data);
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stderr_and_exit_code() {
        let result = ProcessBuilder::new("sh")
            .args(["-c", "echo out; echo first >&2; echo second >&2; exit 3"])
            .spawn_captured()
            .unwrap()
            .wait()
            .unwrap();

        assert_eq!(result.exit_code(), Some(3));
        assert_eq!(result.stderr(), "first\nsecond\n");
        assert_eq!(result.outcome(), Outcome::Failure);
    }

    #[cfg(unix)]
    #[test]
    fn test_working_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = ProcessBuilder::new("sh")
            .args(["-c", "pwd >&2"])
            .cwd(tmp.path())
            .spawn_captured()
            .unwrap()
            .wait()
            .unwrap();

        let reported = std::fs::canonicalize(result.stderr().trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(tmp.path()).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_on_complete_delivers_result() {
        let (tx, rx) = std::sync::mpsc::channel();
        let handle = ProcessBuilder::new("sh")
            .args(["-c", "exit 0"])
            .spawn_captured()
            .unwrap()
            .on_complete(move |r| {
                let _ = tx.send(r.map(|r| r.outcome()));
            });
        handle.join().unwrap();
        assert_eq!(rx.recv().unwrap().unwrap(), Outcome::Success);
    }
}
