//! Source languages and language detection.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source language of a compile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "C", alias = "c")]
    C,
    #[serde(rename = "C++", alias = "c++", alias = "cpp", alias = "cxx")]
    Cxx,
}

impl Language {
    /// Get the language name as the editor reports it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cxx => "C++",
        }
    }

    /// Resolve an editor language tag such as `"C"` or `"C++"`.
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "c" => Some(Language::C),
            "c++" | "cpp" | "cxx" => Some(Language::Cxx),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the language of a file the caller did not tag.
///
/// Editors own grammar registries; this crate only asks.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, path: &Path) -> Option<Language>;
}

const C_EXTENSIONS: &[&str] = &["c", "h"];
const CXX_EXTENSIONS: &[&str] = &["cpp", "cc", "cxx", "c++", "cp", "hpp", "hh", "hxx", "h++", "ino"];

/// Detects the language from the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionDetector;

impl LanguageDetector for ExtensionDetector {
    fn detect(&self, path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?;
        if C_EXTENSIONS.contains(&ext) {
            return Some(Language::C);
        }
        // `.C` is C++ by gcc's convention
        if ext == "C" {
            return Some(Language::Cxx);
        }
        let ext = ext.to_ascii_lowercase();
        if CXX_EXTENSIONS.contains(&ext.as_str()) {
            Some(Language::Cxx)
        } else {
            None
        }
    }
}
