//! Compiler diagnostics: parsing stderr and walking through the results.
//!
//! Only the single-line `path:line:col: severity: message` shape is
//! recognised. Anything else (include traces, caret lines, multi-line
//! template errors) is skipped.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

use regex::Regex;
use serde::Serialize;

static DIAGNOSTIC_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<file>.+?):(?P<line>\d+):(?P<col>\d+):\s*(?P<rest>.*)$")
        .expect("valid diagnostic pattern")
});

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
    /// The line carried no recognised severity label.
    Unknown,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Unknown => write!(f, "unknown"),
        }
    }
}

/// One parsed compiler message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: PathBuf,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// Parse one stderr line; `None` if it is not a diagnostic.
    pub fn parse_line(line: &str) -> Option<Diagnostic> {
        let caps = DIAGNOSTIC_LINE.captures(line.trim_end_matches('\r'))?;
        let line_no = caps["line"].parse::<u32>().ok()?;
        let column = caps["col"].parse::<u32>().ok()?;
        let (severity, message) = split_severity(&caps["rest"]);

        Some(Diagnostic {
            file: PathBuf::from(&caps["file"]),
            line: line_no,
            column,
            severity,
            message: message.to_string(),
        })
    }

    /// Whether this diagnostic points into `current`.
    ///
    /// Compilers echo paths the way they were given, so a relative path
    /// matches any absolute path that ends with it.
    pub fn is_in(&self, current: &Path) -> bool {
        if self.file == current {
            return true;
        }
        if self.file.is_relative() && current.ends_with(&self.file) {
            return true;
        }
        current.is_relative() && self.file.ends_with(current)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.severity,
            self.message
        )
    }
}

fn split_severity(rest: &str) -> (Severity, &str) {
    const LABELS: &[(&str, Severity)] = &[
        ("fatal error:", Severity::Error),
        ("error:", Severity::Error),
        ("warning:", Severity::Warning),
        ("note:", Severity::Note),
    ];
    for (label, severity) in LABELS {
        if let Some(message) = rest.strip_prefix(label) {
            return (*severity, message.trim_start());
        }
    }
    (Severity::Unknown, rest)
}

/// Lazily parse compiler stderr into diagnostics, in output order.
///
/// Pure: iterating twice yields the same sequence.
pub fn parse(stderr: &str) -> impl Iterator<Item = Diagnostic> + '_ {
    stderr.split('\n').filter_map(Diagnostic::parse_line)
}

/// Position in a diagnostic list. `None` is "before the first entry".
pub type Cursor = Option<usize>;

/// Advance to the next diagnostic in `current`, wrapping after the last.
///
/// Scans the list at most once; if nothing matches the cursor is returned
/// unchanged with `None`.
pub fn next<'a>(
    cursor: Cursor,
    diagnostics: &'a [Diagnostic],
    current: &Path,
) -> (Cursor, Option<&'a Diagnostic>) {
    let n = diagnostics.len();
    if n == 0 {
        return (cursor, None);
    }
    let start = match cursor {
        Some(i) if i < n => (i + 1) % n,
        _ => 0,
    };
    for step in 0..n {
        let idx = (start + step) % n;
        if diagnostics[idx].is_in(current) {
            return (Some(idx), Some(&diagnostics[idx]));
        }
    }
    (cursor, None)
}

/// Step back to the previous diagnostic in `current`, wrapping before the first.
///
/// Same bounded scan as [`next`].
pub fn prev<'a>(
    cursor: Cursor,
    diagnostics: &'a [Diagnostic],
    current: &Path,
) -> (Cursor, Option<&'a Diagnostic>) {
    let n = diagnostics.len();
    if n == 0 {
        return (cursor, None);
    }
    let start = match cursor {
        Some(i) if i < n => (i + n - 1) % n,
        _ => n - 1,
    };
    for step in 0..n {
        let idx = (start + n - step) % n;
        if diagnostics[idx].is_in(current) {
            return (Some(idx), Some(&diagnostics[idx]));
        }
    }
    (cursor, None)
}

#[derive(Debug, Default)]
struct ErrorList {
    diagnostics: Vec<Diagnostic>,
    cursor: Cursor,
}

/// Per-file diagnostic lists and cursors.
///
/// Keyed by the primary source path of the build that produced them, so
/// builds of different files never touch each other's cursor. Two builds of
/// the same file racing to reset it is last-writer-wins.
#[derive(Debug, Default)]
pub struct DiagnosticTracker {
    files: Mutex<HashMap<PathBuf, ErrorList>>,
}

impl DiagnosticTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, ErrorList>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the list for `file` and put the cursor before the first entry.
    pub fn reset(&self, file: &Path, diagnostics: Vec<Diagnostic>) {
        self.lock().insert(
            file.to_path_buf(),
            ErrorList {
                diagnostics,
                cursor: None,
            },
        );
    }

    /// Forget the list for `file`.
    pub fn clear(&self, file: &Path) {
        self.lock().remove(file);
    }

    pub fn cursor(&self, file: &Path) -> Cursor {
        self.lock().get(file).and_then(|list| list.cursor)
    }

    /// The tracked diagnostics for `file`, in compiler order.
    pub fn diagnostics(&self, file: &Path) -> Vec<Diagnostic> {
        self.lock()
            .get(file)
            .map(|list| list.diagnostics.clone())
            .unwrap_or_default()
    }

    /// Move to the next diagnostic located in `file`.
    pub fn next(&self, file: &Path) -> Option<Diagnostic> {
        self.step(file, next)
    }

    /// Move to the previous diagnostic located in `file`.
    pub fn prev(&self, file: &Path) -> Option<Diagnostic> {
        self.step(file, prev)
    }

    fn step(
        &self,
        file: &Path,
        walk: for<'a> fn(Cursor, &'a [Diagnostic], &Path) -> (Cursor, Option<&'a Diagnostic>),
    ) -> Option<Diagnostic> {
        let mut files = self.lock();
        let list = files.get_mut(file)?;
        let (cursor, found) = walk(list.cursor, &list.diagnostics, file);
        let found = found.cloned();
        list.cursor = cursor;
        found
    }
}
