//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// gpp - compile a C/C++ file and run it in a terminal
#[derive(Parser)]
#[command(name = "gpp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile files and run the result
    Build(BuildArgs),

    /// Show or walk the errors of the last failed build
    Errors(ErrorsArgs),

    /// List supported terminal emulators
    Terminals(TerminalsArgs),

    /// Print the resolved configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Source files, in the order the compiler receives them
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// The file acted on (defaults to the first file)
    #[arg(long)]
    pub primary: Option<PathBuf>,

    /// Language of the primary file (C or C++), detected from the extension if omitted
    #[arg(long = "lang")]
    pub language: Option<String>,

    /// Build with debug symbols and run under the debugger
    #[arg(short, long)]
    pub debug: bool,

    /// Do not run the program after compiling
    #[arg(long)]
    pub no_run: bool,

    /// Extra config file, applied after the global and project files
    #[arg(long, env = "GPP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for notifications
    #[arg(long, value_enum, default_value = "human")]
    pub message_format: MessageFormat,
}

#[derive(Args)]
pub struct ErrorsArgs {
    /// Source file whose errors to show
    pub file: PathBuf,

    /// Move forward N errors from the start
    #[arg(long, conflicts_with = "prev")]
    pub next: Option<usize>,

    /// Move backward N errors from the start
    #[arg(long)]
    pub prev: Option<usize>,
}

#[derive(Args)]
pub struct TerminalsArgs {
    /// Extra config file, applied after the global and project files
    #[arg(long, env = "GPP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Directory whose `.gpp/config.toml` applies (defaults to the current directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Extra config file, applied after the global and project files
    #[arg(long, env = "GPP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
