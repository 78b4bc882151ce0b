//! `gpp terminals` command

use anyhow::Result;

use crate::cli::TerminalsArgs;
use gpp::builder::terminal::{ExecStyle, HoldPolicy, LinuxTerminal};
use gpp::util::config::{config_search_paths, load_config};
use gpp::util::process::find_executable;

pub fn execute(args: TerminalsArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = load_config(&config_search_paths(&cwd, args.config.as_deref()));

    println!("{:<2}{:<20}{:<20}{:<12}{:<12}{}", "", "TERMINAL", "EXECUTABLE", "EXEC", "HOLD", "INSTALLED");
    for terminal in LinuxTerminal::ALL {
        let spec = terminal.launch_spec();
        let marker = if terminal == config.linux_terminal { "*" } else { "" };
        let exec = match spec.exec {
            ExecStyle::Trailing(flag) | ExecStyle::Joined(flag) => flag,
        };
        let hold = match spec.hold {
            HoldPolicy::Flag(flag) => flag,
            HoldPolicy::Shell => "(shell)",
        };
        let installed = if find_executable(spec.executable).is_some() {
            "yes"
        } else {
            "no"
        };
        println!(
            "{:<2}{:<20}{:<20}{:<12}{:<12}{}",
            marker,
            terminal.display_name(),
            spec.executable,
            exec,
            hold,
            installed
        );
    }

    Ok(())
}
