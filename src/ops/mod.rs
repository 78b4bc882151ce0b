//! High-level operations.

pub mod compile;
pub mod sentinel;

pub use compile::{BuildReport, BuildState, CompileRequest, EditorBuffers, NoEditor, Orchestrator};
pub use sentinel::{clear_sentinel, read_sentinel, write_sentinel, SENTINEL_FILE_NAME};
