//! Test doubles for the compile-and-run sequence.
//!
//! Only compiled for unit tests. `FakeCompiler` is a small `sh` script that
//! records its arguments, prints canned stderr and exits with a chosen code.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::builder::terminal::Spawner;
use crate::builder::toolchain::CommandSpec;
use crate::ops::compile::EditorBuffers;
use crate::util::errors::BuildError;

/// A scripted stand-in for `gcc`/`g++`.
#[cfg(unix)]
#[derive(Debug)]
pub struct FakeCompiler {
    script: PathBuf,
    args_file: PathBuf,
}

#[cfg(unix)]
impl FakeCompiler {
    /// Write a compiler named `fake-cc` into `dir`.
    pub fn new(dir: &Path, stderr: &str, exit_code: i32) -> Self {
        Self::named(dir, "fake-cc", stderr, exit_code)
    }

    /// Write a compiler with a custom file name into `dir`.
    pub fn named(dir: &Path, name: &str, stderr: &str, exit_code: i32) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join(name);
        let args_file = dir.join(format!("{}.args", name));
        let stderr_file = dir.join(format!("{}.stderr", name));
        std::fs::write(&stderr_file, stderr).unwrap();

        let body = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\ncat '{}' >&2\nexit {}\n",
            args_file.display(),
            stderr_file.display(),
            exit_code
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        FakeCompiler { script, args_file }
    }

    pub fn path(&self) -> &Path {
        &self.script
    }

    /// Whether the script has run at least once.
    pub fn was_invoked(&self) -> bool {
        self.args_file.exists()
    }

    /// Arguments of the most recent run.
    pub fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(&self.args_file)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// Records commands instead of spawning them.
#[derive(Debug, Default)]
pub struct RecordingSpawner {
    commands: Mutex<Vec<CommandSpec>>,
}

impl RecordingSpawner {
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }
}

impl Spawner for RecordingSpawner {
    fn spawn(&self, command: &CommandSpec) -> Result<(), BuildError> {
        self.commands.lock().unwrap().push(command.clone());
        Ok(())
    }
}

/// Behaves as if no terminal emulator is installed.
#[derive(Debug, Default)]
pub struct FailingSpawner;

impl Spawner for FailingSpawner {
    fn spawn(&self, command: &CommandSpec) -> Result<(), BuildError> {
        Err(BuildError::ExecutableNotFound {
            program: command.program.clone(),
        })
    }
}

/// An editor whose every save fails.
#[derive(Debug, Default)]
pub struct FailingEditor {
    attempts: AtomicUsize,
}

impl FailingEditor {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl EditorBuffers for FailingEditor {
    fn is_open(&self, _path: &Path) -> bool {
        true
    }

    fn save(&self, path: &Path) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        bail!("disk full while saving {}", path.display())
    }
}
