//! Value types for one compile attempt.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::builder::toolchain::Toolchain;
use crate::core::language::Language;
use crate::util::errors::BuildError;

/// The file a build is about: it decides language, working directory and
/// output name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    language: Language,
    output: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, language: Language, output: impl Into<PathBuf>) -> Self {
        SourceFile {
            path: path.into(),
            language,
            output: output.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Path of the binary the compiler writes.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Directory holding the source; builds and runs happen here.
    pub fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// File name without its extension.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// One build attempt. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct BuildInvocation {
    primary: SourceFile,
    files: Vec<PathBuf>,
    toolchain: Toolchain,
    extra_flags: Vec<String>,
    debug: bool,
}

impl BuildInvocation {
    /// Create an invocation; `files` must contain at least one path.
    pub fn new(
        primary: SourceFile,
        files: Vec<PathBuf>,
        toolchain: Toolchain,
        extra_flags: Vec<String>,
        debug: bool,
    ) -> Result<Self, BuildError> {
        if files.is_empty() {
            return Err(BuildError::NoSourceFiles);
        }
        Ok(BuildInvocation {
            primary,
            files,
            toolchain,
            extra_flags,
            debug,
        })
    }

    pub fn primary(&self) -> &SourceFile {
        &self.primary
    }

    /// All inputs, in the order they are handed to the compiler.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn output(&self) -> &Path {
        self.primary.output()
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn extra_flags(&self) -> &[String] {
        &self.extra_flags
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }
}

/// Classification of a finished compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    /// Exit code 0 but the compiler wrote to stderr.
    Warning,
    Failure,
}

impl Outcome {
    /// Pure function of the exit code and whether stderr was empty.
    ///
    /// A process killed by a signal has no exit code and counts as a failure.
    pub fn classify(exit_code: Option<i32>, stderr: &str) -> Outcome {
        match exit_code {
            Some(0) if stderr.is_empty() => Outcome::Success,
            Some(0) => Outcome::Warning,
            _ => Outcome::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Outcome::Failure)
    }
}

/// Result of a completed compiler process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    exit_code: Option<i32>,
    stderr: String,
    outcome: Outcome,
}

impl BuildResult {
    pub fn new(exit_code: Option<i32>, stderr: String) -> Self {
        let outcome = Outcome::classify(exit_code, &stderr);
        BuildResult {
            exit_code,
            stderr,
            outcome,
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// All stderr output, fragments joined in arrival order.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}
