//! gpp - compile C/C++ sources and run the result in a terminal
//!
//! This crate provides the library behind the `gpp` binary and editor
//! integrations: compiler invocation, diagnostic navigation, terminal
//! launching and the build orchestration that ties them together.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test doubles for unit tests.
///
/// This module is only available when running tests. It provides a
/// scripted fake compiler and recording/failing collaborators.
#[cfg(test)]
pub mod test_support;

pub use builder::diagnostics::{Diagnostic, DiagnosticTracker};
pub use core::invocation::{BuildInvocation, BuildResult, Outcome, SourceFile};
pub use core::language::Language;
pub use ops::compile::{BuildReport, BuildState, CompileRequest, Orchestrator};
pub use util::config::Config;
pub use util::errors::BuildError;
