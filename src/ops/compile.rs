//! The compile-and-run sequence.
//!
//! ```text
//! Idle -> Saving -> Compiling -> Succeeded | Warned | Failed
//!                                   |         |
//!                                   +-> (Running) -> Idle
//! ```
//!
//! Every invocation is independent. The only state shared between builds is
//! the per-file diagnostic cursor and the sentinel file, both keyed by the
//! primary source. A build in flight cannot be cancelled and no timeout is
//! applied to the compiler.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Result as AnyResult;

use crate::builder::diagnostics::{self, Diagnostic, DiagnosticTracker};
use crate::builder::terminal::TerminalLauncher;
use crate::builder::toolchain::{self, CommandSpec, Toolchain};
use crate::core::invocation::{BuildInvocation, BuildResult, Outcome, SourceFile};
use crate::core::language::{ExtensionDetector, Language, LanguageDetector};
use crate::ops::sentinel;
use crate::util::config::Config;
use crate::util::errors::BuildError;
use crate::util::notify::{Notification, Notifier};
use crate::util::process;

/// Where a build is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Idle,
    Saving,
    Compiling,
    Succeeded,
    Warned,
    Failed,
    Running,
}

/// Open editor buffers, owned by the embedding editor.
pub trait EditorBuffers: Send + Sync {
    /// Whether a buffer for `path` is open.
    fn is_open(&self, path: &Path) -> bool;

    /// Persist the buffer for `path` to disk.
    fn save(&self, path: &Path) -> AnyResult<()>;
}

/// No editor attached; files are compiled as they are on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEditor;

impl EditorBuffers for NoEditor {
    fn is_open(&self, _path: &Path) -> bool {
        false
    }

    fn save(&self, _path: &Path) -> AnyResult<()> {
        Ok(())
    }
}

/// What the user asked to compile.
#[derive(Debug, Clone, Default)]
pub struct CompileRequest {
    /// Files handed to the compiler, in order.
    pub files: Vec<PathBuf>,
    /// The file acted on; defaults to the first of `files`.
    pub primary: Option<PathBuf>,
    /// Language tag reported by the editor, detected from the path if absent.
    pub language: Option<String>,
    /// Build with debug flags and run under the debugger.
    pub debug: bool,
}

impl CompileRequest {
    /// Compile a single file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        CompileRequest {
            files: vec![path.into()],
            ..Default::default()
        }
    }

    /// Compile a tree-view selection, `primary` being the entry clicked.
    pub fn selection(files: Vec<PathBuf>, primary: impl Into<PathBuf>) -> Self {
        CompileRequest {
            files,
            primary: Some(primary.into()),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, tag: impl Into<String>) -> Self {
        self.language = Some(tag.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// What happened during one build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// The primary source the build was about.
    pub source: PathBuf,
    pub result: BuildResult,
    /// States passed through, in order, starting at `Idle`.
    pub states: Vec<BuildState>,
    /// Diagnostics parsed from a failing build.
    pub diagnostics: Vec<Diagnostic>,
    /// Where the cursor landed when jumping to the first error.
    pub first_error: Option<Diagnostic>,
    /// The sentinel file written for a failing build.
    pub sentinel: Option<PathBuf>,
    /// The terminal command started for the run step.
    pub launched: Option<CommandSpec>,
}

impl BuildReport {
    pub fn outcome(&self) -> Outcome {
        self.result.outcome()
    }

    pub fn final_state(&self) -> BuildState {
        self.states.last().copied().unwrap_or(BuildState::Idle)
    }
}

/// Ties the toolchain, process runner, diagnostics and terminal together.
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<Config>,
    notifier: Arc<dyn Notifier>,
    tracker: Arc<DiagnosticTracker>,
    editor: Arc<dyn EditorBuffers>,
    detector: Arc<dyn LanguageDetector>,
    launcher: TerminalLauncher,
}

impl Orchestrator {
    /// Create an orchestrator for the host platform.
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> Self {
        let launcher = TerminalLauncher::native(config.debugger.clone());
        Orchestrator {
            config: Arc::new(config),
            notifier,
            tracker: Arc::new(DiagnosticTracker::new()),
            editor: Arc::new(NoEditor),
            detector: Arc::new(ExtensionDetector),
            launcher,
        }
    }

    pub fn with_editor(mut self, editor: Arc<dyn EditorBuffers>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_launcher(mut self, launcher: TerminalLauncher) -> Self {
        self.launcher = launcher;
        self
    }

    /// Share a tracker with other orchestrators (e.g. one per project config).
    pub fn with_tracker(mut self, tracker: Arc<DiagnosticTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<DiagnosticTracker> {
        &self.tracker
    }

    /// Jump to the next diagnostic of the last failing build of `file`.
    pub fn next_error(&self, file: &Path) -> Option<Diagnostic> {
        self.tracker.next(&absolute(file).ok()?)
    }

    /// Jump to the previous diagnostic of the last failing build of `file`.
    pub fn prev_error(&self, file: &Path) -> Option<Diagnostic> {
        self.tracker.prev(&absolute(file).ok()?)
    }

    /// Run the whole sequence on a background thread.
    ///
    /// `on_done` receives the report, or the error that stopped the build.
    /// The error has already been reported through the notifier.
    pub fn compile_async<F>(&self, request: CompileRequest, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<BuildReport, BuildError>) + Send + 'static,
    {
        let this = self.clone();
        thread::spawn(move || on_done(this.compile(&request)))
    }

    /// Run the whole sequence on the calling thread.
    ///
    /// A failing compiler is `Ok` with `Outcome::Failure`; `Err` means the
    /// build never produced a result. Either way the user has been notified.
    pub fn compile(&self, request: &CompileRequest) -> Result<BuildReport, BuildError> {
        let mut states = vec![BuildState::Idle];
        self.run(request, &mut states).map_err(|e| {
            tracing::debug!("build aborted in {:?}: {}", states.last(), e);
            self.notifier.notify(e.to_notification());
            e
        })
    }

    fn run(
        &self,
        request: &CompileRequest,
        states: &mut Vec<BuildState>,
    ) -> Result<BuildReport, BuildError> {
        let primary = request
            .primary
            .as_deref()
            .or_else(|| request.files.first().map(PathBuf::as_path))
            .ok_or(BuildError::NoSourceFiles)
            .and_then(absolute)?;
        let files = request
            .files
            .iter()
            .map(|f| absolute(f))
            .collect::<Result<Vec<_>, _>>()?;

        enter(states, BuildState::Saving);
        self.save(&primary);

        if !primary.is_file() {
            return Err(BuildError::NoSourceFiles);
        }

        let invocation = self.invocation(request, &primary, files)?;
        let command = toolchain::compile_command(&invocation);

        enter(states, BuildState::Compiling);
        tracing::info!("compiling {}", primary.display());
        let result = process::run(&command)?.wait()?;

        let mut report = BuildReport {
            source: primary,
            result,
            states: Vec::new(),
            diagnostics: Vec::new(),
            first_error: None,
            sentinel: None,
            launched: None,
        };

        match report.result.outcome() {
            Outcome::Failure => {
                enter(states, BuildState::Failed);
                self.on_failure(&invocation, &mut report);
            }
            Outcome::Warning => {
                enter(states, BuildState::Warned);
                if self.config.show_warnings {
                    self.notifier
                        .notify(Notification::warning(report.result.stderr().trim_end()));
                }
                self.on_success(&invocation, &mut report, states);
            }
            Outcome::Success => {
                enter(states, BuildState::Succeeded);
                self.on_success(&invocation, &mut report, states);
            }
        }

        enter(states, BuildState::Idle);
        report.states = states.clone();
        Ok(report)
    }

    /// Save the buffer if one is open; a failed save is not fatal.
    fn save(&self, path: &Path) {
        if !self.editor.is_open(path) {
            return;
        }
        if let Err(e) = self.editor.save(path) {
            tracing::warn!(
                "failed to save {}, compiling the last saved contents: {:#}",
                path.display(),
                e
            );
        }
    }

    fn invocation(
        &self,
        request: &CompileRequest,
        primary: &Path,
        files: Vec<PathBuf>,
    ) -> Result<BuildInvocation, BuildError> {
        let language = self.language(request, primary)?;
        let toolchain = Toolchain::for_language(language, &self.config)?;
        let output = toolchain::output_path(primary, &self.config);
        let source = SourceFile::new(primary, language, output);

        let files = if files.is_empty() {
            vec![primary.to_path_buf()]
        } else {
            files
        };
        let extra_flags = if request.debug {
            self.config.debug_flags.clone()
        } else {
            Vec::new()
        };

        BuildInvocation::new(source, files, toolchain, extra_flags, request.debug)
    }

    fn language(&self, request: &CompileRequest, primary: &Path) -> Result<Language, BuildError> {
        match request.language {
            Some(ref tag) => Language::from_tag(tag).ok_or_else(|| BuildError::UnsupportedLanguage {
                language: tag.clone(),
            }),
            None => self.detector.detect(primary).ok_or_else(|| {
                let language = primary
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| primary.display().to_string());
                BuildError::UnsupportedLanguage { language }
            }),
        }
    }

    fn on_failure(&self, invocation: &BuildInvocation, report: &mut BuildReport) {
        let source = invocation.primary();
        let stderr = report.result.stderr();

        if self.config.add_compiling_err {
            match sentinel::write_sentinel(source.dir(), stderr) {
                Ok(path) => report.sentinel = Some(path),
                Err(e) => tracing::warn!("{:#}", anyhow::Error::from(e)),
            }
        }

        let message = if stderr.trim().is_empty() {
            format!(
                "`{}` failed with exit code {:?}",
                invocation.toolchain().compiler(),
                report.result.exit_code()
            )
        } else {
            stderr.trim_end().to_string()
        };
        self.notifier.notify(Notification::error(message));

        report.diagnostics = diagnostics::parse(stderr).collect();
        tracing::debug!(
            "{} diagnostic(s) for {}",
            report.diagnostics.len(),
            source.path().display()
        );
        self.tracker.reset(source.path(), report.diagnostics.clone());
        if self.config.goto_first_error {
            report.first_error = self.tracker.next(source.path());
        }
    }

    fn on_success(
        &self,
        invocation: &BuildInvocation,
        report: &mut BuildReport,
        states: &mut Vec<BuildState>,
    ) {
        let source = invocation.primary();

        self.tracker.clear(source.path());
        if let Err(e) = sentinel::clear_sentinel(source.dir()) {
            tracing::warn!("{:#}", anyhow::Error::from(e));
        }

        if !self.config.run_after_compile {
            self.notifier.notify(Notification::success("Compiling successful"));
            return;
        }

        enter(states, BuildState::Running);
        match self.launcher.launch_in_terminal(
            invocation.output(),
            source.dir(),
            self.config.linux_terminal,
            invocation.is_debug(),
        ) {
            Ok(command) => report.launched = Some(command),
            Err(e) => {
                // The build itself succeeded; only the run step is lost.
                tracing::warn!("{}", e);
                self.notifier.notify(Notification::warning(e.to_string()));
            }
        }
    }
}

/// Resolve `path` against the current directory. An empty path is an
/// unsaved buffer.
fn absolute(path: &Path) -> Result<PathBuf, BuildError> {
    if path.as_os_str().is_empty() {
        return Err(BuildError::NoSourceFiles);
    }
    std::path::absolute(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn enter(states: &mut Vec<BuildState>, next: BuildState) {
    if let Some(current) = states.last() {
        tracing::debug!("{:?} -> {:?}", current, next);
    }
    states.push(next);
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("launcher", &self.launcher)
            .finish_non_exhaustive()
    }
}
