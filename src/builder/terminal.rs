//! Opening a terminal window that runs the compiled program.
//!
//! Each Linux terminal emulator is described by a row in a launch table:
//! its executable, how it takes the command to run, and how it is kept open
//! after the program exits. Adding an emulator means adding a row.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::builder::toolchain::CommandSpec;
use crate::core::platform::Platform;
use crate::util::errors::BuildError;
use crate::util::process::ProcessBuilder;

/// Terminal emulator preference on Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LinuxTerminal {
    #[default]
    XTerm,
    GnomeTerminal,
    Konsole,
    Xfce4Terminal,
    PantheonTerminal,
    URxvt,
    MateTerminal,
}

impl LinuxTerminal {
    pub const ALL: [LinuxTerminal; 7] = [
        LinuxTerminal::XTerm,
        LinuxTerminal::GnomeTerminal,
        LinuxTerminal::Konsole,
        LinuxTerminal::Xfce4Terminal,
        LinuxTerminal::PantheonTerminal,
        LinuxTerminal::URxvt,
        LinuxTerminal::MateTerminal,
    ];

    /// The name shown in the editor's settings.
    pub fn display_name(&self) -> &'static str {
        match self {
            LinuxTerminal::XTerm => "XTerm",
            LinuxTerminal::GnomeTerminal => "GNOME Terminal",
            LinuxTerminal::Konsole => "Konsole",
            LinuxTerminal::Xfce4Terminal => "xfce4-terminal",
            LinuxTerminal::PantheonTerminal => "pantheon-terminal",
            LinuxTerminal::URxvt => "URxvt",
            LinuxTerminal::MateTerminal => "MATE Terminal",
        }
    }

    /// How to launch this emulator.
    pub fn launch_spec(&self) -> LaunchSpec {
        use ExecStyle::{Joined, Trailing};
        use HoldPolicy::{Flag, Shell};

        let (executable, exec, hold) = match self {
            LinuxTerminal::XTerm => ("xterm", Trailing("-e"), Flag("-hold")),
            LinuxTerminal::GnomeTerminal => ("gnome-terminal", Trailing("--"), Shell),
            LinuxTerminal::Konsole => ("konsole", Trailing("-e"), Flag("--hold")),
            LinuxTerminal::Xfce4Terminal => ("xfce4-terminal", Joined("--command"), Flag("--hold")),
            LinuxTerminal::PantheonTerminal => ("pantheon-terminal", Joined("-e"), Shell),
            LinuxTerminal::URxvt => ("urxvt", Trailing("-e"), Flag("-hold")),
            LinuxTerminal::MateTerminal => ("mate-terminal", Trailing("-x"), Shell),
        };
        LaunchSpec {
            executable,
            exec,
            hold,
        }
    }
}

impl fmt::Display for LinuxTerminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for LinuxTerminal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LinuxTerminal::ALL
            .into_iter()
            .find(|t| {
                let variant = format!("{:?}", t);
                let spec = t.launch_spec();
                wanted.eq_ignore_ascii_case(t.display_name())
                    || wanted.eq_ignore_ascii_case(&variant)
                    || wanted.eq_ignore_ascii_case(spec.executable)
            })
            .ok_or_else(|| format!("unknown terminal '{}'", s))
    }
}

impl<'de> Deserialize<'de> for LinuxTerminal {
    /// Unknown names fall back to XTerm instead of rejecting the whole file.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(name.parse().unwrap_or_else(|e| {
            tracing::warn!("{}; falling back to {}", e, LinuxTerminal::default());
            LinuxTerminal::default()
        }))
    }
}

/// How an emulator is told what to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStyle {
    /// `<flag> program args...` as separate arguments.
    Trailing(&'static str),
    /// `<flag> "program args..."` as one argument the emulator splits itself.
    Joined(&'static str),
}

/// How the window stays open after the program exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPolicy {
    /// The emulator has a flag for it.
    Flag(&'static str),
    /// Wrap the program in `sh`, which waits for Enter afterwards.
    Shell,
}

/// One row of the launch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchSpec {
    pub executable: &'static str,
    pub exec: ExecStyle,
    pub hold: HoldPolicy,
}

/// Script run by `sh -c` for `HoldPolicy::Shell`; the program arrives as `$@`.
const HOLD_SCRIPT: &str = "\"$@\"; printf '\\nPress Enter to close...'; read -r _";

impl LaunchSpec {
    /// Build the emulator command running `program`.
    ///
    /// With `hold` the window is kept open after `program` exits.
    pub fn command(&self, program: Vec<String>, hold: bool) -> CommandSpec {
        let mut cmd = CommandSpec::new(self.executable);
        let mut program = program;

        if hold {
            match self.hold {
                HoldPolicy::Flag(flag) => cmd = cmd.arg(flag),
                HoldPolicy::Shell => {
                    let mut wrapped = vec![
                        "sh".to_string(),
                        "-c".to_string(),
                        HOLD_SCRIPT.to_string(),
                        "sh".to_string(),
                    ];
                    wrapped.append(&mut program);
                    program = wrapped;
                }
            }
        }

        match self.exec {
            ExecStyle::Trailing(flag) => cmd.arg(flag).args(program),
            ExecStyle::Joined(flag) => cmd.arg(flag).arg(join_quoted(&program)),
        }
    }
}

/// Join arguments into one string the emulator can split back, POSIX-style.
fn join_quoted(args: &[String]) -> String {
    args.iter()
        .map(|a| quote(a))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+,@%".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

/// Build the command that opens a terminal running `binary`.
///
/// In debug mode `<debugger> <binary>` runs instead and no hold is
/// requested, since the debugger prompt keeps the window open.
pub fn terminal_command(
    platform: Platform,
    binary: &Path,
    cwd: &Path,
    preference: LinuxTerminal,
    debug: bool,
    debugger: &str,
) -> CommandSpec {
    let binary = binary.display().to_string();

    let cmd = match platform {
        Platform::Windows if debug => CommandSpec::new(debugger).arg(binary).new_console(),
        Platform::Windows => CommandSpec::new("cmd")
            .args(["/K".to_string(), cmd_quote(&binary)])
            .raw_args()
            .new_console(),
        Platform::MacOs => CommandSpec::new("open").arg(binary),
        Platform::Linux => {
            let program = if debug {
                vec![debugger.to_string(), binary]
            } else {
                vec![binary]
            };
            preference.launch_spec().command(program, !debug)
        }
    };
    cmd.cwd(cwd)
}

/// Quote a path for `cmd /K`.
///
/// cmd strips the outermost pair of quotes from what follows `/K` and parses
/// the rest as a command line, so the path is wrapped twice. Inside quotes
/// `&`, `|`, `^`, `<`, `>` and parentheses are literal. Windows paths cannot
/// contain `"`.
fn cmd_quote(path: &str) -> String {
    format!("\"\"{}\"\"", path)
}

/// Starts processes without waiting for them.
pub trait Spawner: Send + Sync {
    fn spawn(&self, command: &CommandSpec) -> Result<(), BuildError>;
}

/// Spawns real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSpawner;

impl Spawner for ProcessSpawner {
    fn spawn(&self, command: &CommandSpec) -> Result<(), BuildError> {
        ProcessBuilder::from_spec(command).spawn_detached()
    }
}

/// Opens terminals for compiled programs.
#[derive(Clone)]
pub struct TerminalLauncher {
    platform: Platform,
    debugger: String,
    spawner: Arc<dyn Spawner>,
}

impl TerminalLauncher {
    pub fn new(platform: Platform, debugger: impl Into<String>, spawner: Arc<dyn Spawner>) -> Self {
        TerminalLauncher {
            platform,
            debugger: debugger.into(),
            spawner,
        }
    }

    /// Launcher for the host platform that spawns real processes.
    pub fn native(debugger: impl Into<String>) -> Self {
        Self::new(Platform::current(), debugger, Arc::new(ProcessSpawner))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Open a terminal running `binary` (or the debugger on it).
    ///
    /// Fire-and-forget: returns once the terminal has been started. Returns
    /// the command that was spawned.
    pub fn launch_in_terminal(
        &self,
        binary: &Path,
        cwd: &Path,
        preference: LinuxTerminal,
        debug: bool,
    ) -> Result<CommandSpec, BuildError> {
        let command = terminal_command(self.platform, binary, cwd, preference, debug, &self.debugger);
        tracing::info!("running `{}`", command.display_command());
        self.spawner.spawn(&command)?;
        Ok(command)
    }
}

impl fmt::Debug for TerminalLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalLauncher")
            .field("platform", &self.platform)
            .field("debugger", &self.debugger)
            .finish_non_exhaustive()
    }
}
