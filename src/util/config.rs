//! Configuration file support.
//!
//! Two locations are read, later ones overriding earlier ones field by field:
//! - Global: `<config dir>/gpp/config.toml` - user-wide defaults
//! - Project: `.gpp/config.toml` next to the primary source, or `--config`
//!
//! Every key accepts both its snake_case name and the camelCase name the
//! editor package uses (`addCompilingErr`, `runAfterCompile`, ...).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::terminal::LinuxTerminal;

/// Resolved configuration for compile-and-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    /// Write `compiling_error.txt` next to the source when compiling fails
    pub add_compiling_err: bool,
    /// Run the program in a terminal after a successful compile
    pub run_after_compile: bool,
    /// Report compiler warnings of a successful compile
    pub show_warnings: bool,
    /// Put the binary in the platform temp directory instead of next to the source
    pub compile_to_temp_directory: bool,
    /// Extension appended to the binary name, empty for none
    pub file_extension: String,
    /// C compiler executable
    pub c_compiler: String,
    /// C++ compiler executable
    pub cpp_compiler: String,
    /// Whitespace-separated C compiler options
    pub c_compiler_options: String,
    /// Whitespace-separated C++ compiler options
    pub cpp_compiler_options: String,
    /// Terminal emulator used on Linux
    pub linux_terminal: LinuxTerminal,
    /// Jump to the first diagnostic after a failing compile
    pub goto_first_error: bool,
    /// Debugger front-end used for debug runs
    pub debugger: String,
    /// Flags a debug build adds before the sources
    pub debug_flags: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            add_compiling_err: true,
            run_after_compile: true,
            show_warnings: true,
            compile_to_temp_directory: true,
            file_extension: String::new(),
            c_compiler: "gcc".to_string(),
            cpp_compiler: "g++".to_string(),
            c_compiler_options: String::new(),
            cpp_compiler_options: String::new(),
            linux_terminal: LinuxTerminal::default(),
            goto_first_error: false,
            debugger: "gdb".to_string(),
            debug_flags: vec!["-g".to_string()],
        }
    }
}

/// One configuration file; unset keys leave lower layers untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    #[serde(alias = "addCompilingErr")]
    pub add_compiling_err: Option<bool>,
    #[serde(alias = "runAfterCompile")]
    pub run_after_compile: Option<bool>,
    #[serde(alias = "showWarnings")]
    pub show_warnings: Option<bool>,
    #[serde(alias = "compileToTempDirectory")]
    pub compile_to_temp_directory: Option<bool>,
    #[serde(alias = "fileExtension")]
    pub file_extension: Option<String>,
    #[serde(alias = "cCompiler")]
    pub c_compiler: Option<String>,
    #[serde(alias = "cppCompiler")]
    pub cpp_compiler: Option<String>,
    #[serde(alias = "cCompilerOptions")]
    pub c_compiler_options: Option<String>,
    #[serde(alias = "cppCompilerOptions")]
    pub cpp_compiler_options: Option<String>,
    #[serde(alias = "linuxTerminal")]
    pub linux_terminal: Option<LinuxTerminal>,
    #[serde(alias = "gotoFirstError")]
    pub goto_first_error: Option<bool>,
    pub debugger: Option<String>,
    #[serde(alias = "debugFlags")]
    pub debug_flags: Option<Vec<String>>,
}

impl ConfigLayer {
    /// Load a layer from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        Self::parse(&contents).with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Parse a layer from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load a layer, falling back to an empty one if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
            Self::default()
        })
    }
}

impl Config {
    /// Apply a layer on top of this config.
    pub fn merge(&mut self, layer: ConfigLayer) {
        if let Some(v) = layer.add_compiling_err {
            self.add_compiling_err = v;
        }
        if let Some(v) = layer.run_after_compile {
            self.run_after_compile = v;
        }
        if let Some(v) = layer.show_warnings {
            self.show_warnings = v;
        }
        if let Some(v) = layer.compile_to_temp_directory {
            self.compile_to_temp_directory = v;
        }
        if let Some(v) = layer.file_extension {
            self.file_extension = v;
        }
        if let Some(v) = layer.c_compiler {
            self.c_compiler = v;
        }
        if let Some(v) = layer.cpp_compiler {
            self.cpp_compiler = v;
        }
        if let Some(v) = layer.c_compiler_options {
            self.c_compiler_options = v;
        }
        if let Some(v) = layer.cpp_compiler_options {
            self.cpp_compiler_options = v;
        }
        if let Some(v) = layer.linux_terminal {
            self.linux_terminal = v;
        }
        if let Some(v) = layer.goto_first_error {
            self.goto_first_error = v;
        }
        if let Some(v) = layer.debugger {
            self.debugger = v;
        }
        if let Some(v) = layer.debug_flags {
            self.debug_flags = v;
        }
    }

    /// Serialize the resolved config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

/// Load merged configuration from the given files, lowest precedence first.
pub fn load_config(paths: &[PathBuf]) -> Config {
    let mut config = Config::default();
    for path in paths {
        config.merge(ConfigLayer::load_or_default(path));
    }
    config
}

/// Get the global config path (`<config dir>/gpp/config.toml`).
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gpp").map(|d| d.config_dir().join("config.toml"))
}

/// Get the project config path (`.gpp/config.toml` under `dir`).
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(".gpp").join("config.toml")
}

/// The usual layering: global, then project, then an explicit file.
pub fn config_search_paths(project_dir: &Path, explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(global) = global_config_path() {
        paths.push(global);
    }
    paths.push(project_config_path(project_dir));
    if let Some(path) = explicit {
        paths.push(path.to_path_buf());
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.add_compiling_err);
        assert!(config.run_after_compile);
        assert!(config.compile_to_temp_directory);
        assert!(!config.goto_first_error);
        assert_eq!(config.c_compiler, "gcc");
        assert_eq!(config.cpp_compiler, "g++");
        assert_eq!(config.linux_terminal, LinuxTerminal::XTerm);
    }

    #[test]
    fn test_camel_case_keys() {
        let layer = ConfigLayer::parse(
            r#"
            addCompilingErr = false
            cppCompilerOptions = "-Wall -O2"
            linuxTerminal = "GNOME Terminal"
            gotoFirstError = true
            "#,
        )
        .unwrap();

        let mut config = Config::default();
        config.merge(layer);
        assert!(!config.add_compiling_err);
        assert_eq!(config.cpp_compiler_options, "-Wall -O2");
        assert_eq!(config.linux_terminal, LinuxTerminal::GnomeTerminal);
        assert!(config.goto_first_error);
        assert!(config.run_after_compile);
    }

    #[test]
    fn test_later_layers_win() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");
        std::fs::write(&global, "c_compiler = \"clang\"\nshow_warnings = false\n").unwrap();
        std::fs::write(&project, "c_compiler = \"tcc\"\n").unwrap();

        let config = load_config(&[global, project]);
        assert_eq!(config.c_compiler, "tcc");
        assert!(!config.show_warnings);
    }

    #[test]
    fn test_missing_and_broken_files_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let broken = tmp.path().join("broken.toml");
        std::fs::write(&broken, "run_after_compile = \"maybe").unwrap();

        let config = load_config(&[tmp.path().join("missing.toml"), broken]);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = Config {
            file_extension: "out".to_string(),
            linux_terminal: LinuxTerminal::Konsole,
            ..Config::default()
        };
        let text = config.to_toml().unwrap();
        let mut reloaded = Config::default();
        reloaded.merge(ConfigLayer::parse(&text).unwrap());
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_project_config_path() {
        assert_eq!(
            project_config_path(Path::new("/work")),
            PathBuf::from("/work/.gpp/config.toml")
        );
    }
}
