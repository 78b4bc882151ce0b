//! User-facing notifications.
//!
//! The orchestrator never prints. It hands `Notification`s to a `Notifier`,
//! which the embedding layer (an editor, or the `gpp` binary) renders.

use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};

use serde::Serialize;

/// Notification level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Success,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Success => write!(f, "success"),
        }
    }
}

/// A message for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub text: String,
}

impl Notification {
    pub fn error(text: impl Into<String>) -> Self {
        Notification {
            level: Level::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Notification {
            level: Level::Warning,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Notification {
            level: Level::Success,
            text: text.into(),
        }
    }

    /// Format the notification for terminal output.
    pub fn format(&self, color: bool) -> String {
        let label = if color {
            match self.level {
                Level::Error => "\x1b[1;31merror\x1b[0m",
                Level::Warning => "\x1b[1;33mwarning\x1b[0m",
                Level::Success => "\x1b[1;32msuccess\x1b[0m",
            }
        } else {
            match self.level {
                Level::Error => "error",
                Level::Warning => "warning",
                Level::Success => "success",
            }
        };

        let mut output = String::new();
        let mut lines = self.text.lines();
        output.push_str(&format!("{}: {}\n", label, lines.next().unwrap_or("")));
        for line in lines {
            output.push_str(&format!("  {}\n", line));
        }
        output
    }

    /// Serialize as a single JSON line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Receiver of notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// How `ShellNotifier` renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Prints notifications to stderr.
#[derive(Debug, Clone)]
pub struct ShellNotifier {
    format: OutputFormat,
    color: bool,
}

impl ShellNotifier {
    /// Create a notifier; colour is used only when stderr is a terminal.
    pub fn new(format: OutputFormat, no_color: bool) -> Self {
        ShellNotifier {
            format,
            color: !no_color && io::stderr().is_terminal(),
        }
    }
}

impl Notifier for ShellNotifier {
    fn notify(&self, notification: Notification) {
        let rendered = match self.format {
            OutputFormat::Human => notification.format(self.color),
            OutputFormat::Json => format!("{}\n", notification.to_json()),
        };
        let mut stderr = io::stderr().lock();
        let _ = stderr.write_all(rendered.as_bytes());
    }
}

/// Keeps every notification in memory, in delivery order.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of what has been delivered so far.
    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Notifications of a single level.
    pub fn of_level(&self, level: Level) -> Vec<Notification> {
        self.notifications()
            .into_iter()
            .filter(|n| n.level == level)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(notification);
        }
    }
}
