//! `gpp config` command

use anyhow::Result;

use crate::cli::ConfigArgs;
use crate::commands::absolute;
use gpp::util::config::{config_search_paths, load_config};

pub fn execute(args: ConfigArgs) -> Result<()> {
    let dir = match args.dir {
        Some(ref d) => absolute(d)?,
        None => std::env::current_dir()?,
    };
    let paths = config_search_paths(&dir, args.config.as_deref());
    for path in &paths {
        tracing::debug!(
            "config layer {} ({})",
            path.display(),
            if path.exists() { "found" } else { "missing" }
        );
    }

    print!("{}", load_config(&paths).to_toml()?);
    Ok(())
}
