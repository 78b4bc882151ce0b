//! `gpp errors` command
//!
//! Reads `compiling_error.txt` next to the file and shows its diagnostics.

use anyhow::Result;

use crate::cli::ErrorsArgs;
use crate::commands::{absolute, parent_dir};
use gpp::builder::diagnostics::{self, DiagnosticTracker};
use gpp::ops::sentinel::read_sentinel;

pub fn execute(args: ErrorsArgs) -> Result<()> {
    let file = absolute(&args.file)?;
    let stderr = read_sentinel(&parent_dir(&file))?;
    if stderr.is_empty() {
        eprintln!("no errors recorded for {}", file.display());
        return Ok(());
    }

    let tracker = DiagnosticTracker::new();
    tracker.reset(&file, diagnostics::parse(&stderr).collect());

    let steps = match (args.next, args.prev) {
        (Some(n), _) => Some((n, true)),
        (None, Some(n)) => Some((n, false)),
        (None, None) => None,
    };

    match steps {
        Some((n, forward)) => {
            for _ in 0..n {
                let found = if forward {
                    tracker.next(&file)
                } else {
                    tracker.prev(&file)
                };
                match found {
                    Some(d) => println!("{}", d),
                    None => {
                        eprintln!("no errors in {}", file.display());
                        break;
                    }
                }
            }
        }
        None => {
            let mut shown = 0;
            for d in tracker.diagnostics(&file).iter().filter(|d| d.is_in(&file)) {
                println!("{}", d);
                shown += 1;
            }
            if shown == 0 {
                eprintln!("no errors in {}", file.display());
            }
        }
    }

    Ok(())
}
