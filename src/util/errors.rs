//! Error taxonomy for compile-and-run operations.
//!
//! A failing compiler is not an error here: it produces a `BuildResult`
//! tagged `Outcome::Failure`. The variants below are the conditions that
//! stop a build or run sequence before a result exists.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::util::notify::Notification;

/// Error raised while preparing or spawning a build or run step.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The compiler, terminal emulator or `open` helper is not installed.
    #[error("`{program}` was not found; is it installed and on your PATH?")]
    ExecutableNotFound { program: String },

    /// No compiler is configured for the detected language.
    #[error("unsupported language `{language}`")]
    UnsupportedLanguage { language: String },

    /// The request named no file, or the primary file does not exist on disk.
    #[error("file not found; save before compiling")]
    NoSourceFiles,

    /// The OS refused to start the process for a reason other than a missing executable.
    #[error("failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Reading or writing a file next to the source failed.
    #[error("i/o error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Classify a spawn failure, separating "not installed" from other OS errors.
    pub fn from_spawn(program: impl Into<String>, err: io::Error) -> Self {
        let program = program.into();
        if err.kind() == io::ErrorKind::NotFound {
            BuildError::ExecutableNotFound { program }
        } else {
            BuildError::Spawn {
                program,
                source: err,
            }
        }
    }

    /// Whether the condition leaves the build itself intact.
    ///
    /// A missing terminal after a good compile is reported as a warning.
    pub fn is_executable_not_found(&self) -> bool {
        matches!(self, BuildError::ExecutableNotFound { .. })
    }

    /// Convert to the notification the UI layer shows for this error.
    pub fn to_notification(&self) -> Notification {
        match self {
            BuildError::NoSourceFiles => {
                Notification::error("File not found. Save before compiling.")
            }
            BuildError::Spawn { program, source } => {
                Notification::error(format!("failed to run `{}`: {}", program, source))
            }
            BuildError::Io { path, source } => {
                Notification::error(format!("{}: {}", path.display(), source))
            }
            other => Notification::error(other.to_string()),
        }
    }
}
