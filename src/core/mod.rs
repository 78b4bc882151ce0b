//! Core data structures.
//!
//! Value types describing one compile attempt:
//! - Languages and language detection
//! - Source files, invocations and results
//! - Host platform families

pub mod invocation;
pub mod language;
pub mod platform;

pub use invocation::{BuildInvocation, BuildResult, Outcome, SourceFile};
pub use language::{ExtensionDetector, Language, LanguageDetector};
pub use platform::Platform;
