//! Compiler-facing pieces.
//!
//! Building compiler commands, reading their diagnostics, and opening a
//! terminal for the resulting program.

pub mod diagnostics;
pub mod terminal;
pub mod toolchain;

pub use diagnostics::{Diagnostic, DiagnosticTracker, Severity};
pub use terminal::{LinuxTerminal, TerminalLauncher};
pub use toolchain::{CommandSpec, Toolchain};
