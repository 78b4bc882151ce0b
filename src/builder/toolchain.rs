//! Compiler invocation building.
//!
//! Turns a `BuildInvocation` into a program, an argument vector and a working
//! directory. Arguments are never joined into a shell string.

use std::path::{Path, PathBuf};

use crate::core::invocation::BuildInvocation;
use crate::core::language::Language;
use crate::util::config::Config;
use crate::util::errors::BuildError;

/// A command to execute: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc", "xterm")
    pub program: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Working directory, inherited when `None`
    pub cwd: Option<PathBuf>,
    /// Open in a new console window (Windows only)
    pub new_console: bool,
    /// Append `args` to the command line verbatim instead of quoting them
    /// (Windows only)
    pub raw_args: bool,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            new_console: false,
            raw_args: false,
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Run in a console window of its own.
    pub fn new_console(mut self) -> Self {
        self.new_console = true;
        self
    }

    /// Pass the arguments through without the usual quoting. The caller
    /// is responsible for quoting them for the target program.
    pub fn raw_args(mut self) -> Self {
        self.raw_args = true;
        self
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// A language's compiler plus the user's default options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    compiler: String,
    options: Vec<String>,
}

impl Toolchain {
    /// Create a toolchain from a compiler name and a whitespace-separated option string.
    pub fn new(compiler: impl Into<String>, options: &str) -> Self {
        Toolchain {
            compiler: compiler.into(),
            options: split_options(options),
        }
    }

    /// Look up the configured toolchain for `language`.
    ///
    /// An empty compiler name means the language is not configured.
    pub fn for_language(language: Language, config: &Config) -> Result<Toolchain, BuildError> {
        let (compiler, options) = match language {
            Language::C => (&config.c_compiler, &config.c_compiler_options),
            Language::Cxx => (&config.cpp_compiler, &config.cpp_compiler_options),
        };
        if compiler.trim().is_empty() {
            return Err(BuildError::UnsupportedLanguage {
                language: language.to_string(),
            });
        }
        Ok(Toolchain::new(compiler.trim(), options))
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    /// User option tokens, empty tokens already discarded.
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

/// Split a configured option string on whitespace, dropping empty tokens.
pub fn split_options(options: &str) -> Vec<String> {
    options.split_whitespace().map(str::to_string).collect()
}

/// Generate the compile command for an invocation.
///
/// Argument order is `extra flags, sources, -o output, user options`, and the
/// command runs in the primary source's directory.
pub fn compile_command(invocation: &BuildInvocation) -> CommandSpec {
    let toolchain = invocation.toolchain();
    CommandSpec::new(toolchain.compiler())
        .args(invocation.extra_flags().iter().cloned())
        .args(invocation.files().iter().map(|f| f.display().to_string()))
        .arg("-o")
        .arg(invocation.output().display().to_string())
        .args(toolchain.options().iter().cloned())
        .cwd(invocation.primary().dir())
}

/// Where the binary for `source` goes.
///
/// With `compile_to_temp_directory` the binary lands in the platform temp
/// directory, otherwise next to the source. A configured extension is
/// appended as `<name>.<ext>`.
pub fn output_path(source: &Path, config: &Config) -> PathBuf {
    let mut name = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "a".to_string());

    let ext = config.file_extension.trim().trim_start_matches('.');
    if !ext.is_empty() {
        name.push('.');
        name.push_str(ext);
    }

    if config.compile_to_temp_directory {
        std::env::temp_dir().join(name)
    } else {
        source
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(name)
    }
}
