//! `gpp build` command

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::cli::{BuildArgs, MessageFormat};
use crate::commands::{absolute, parent_dir};
use gpp::builder::diagnostics::Diagnostic;
use gpp::core::invocation::Outcome;
use gpp::ops::compile::{BuildReport, CompileRequest, Orchestrator};
use gpp::util::config::{config_search_paths, load_config};
use gpp::util::notify::{OutputFormat, ShellNotifier};

/// Machine-readable summary printed to stdout with `--message-format json`.
#[derive(Serialize)]
struct BuildSummary<'a> {
    reason: &'static str,
    source: &'a PathBuf,
    outcome: Outcome,
    exit_code: Option<i32>,
    diagnostics: &'a [Diagnostic],
    #[serde(skip_serializing_if = "Option::is_none")]
    sentinel: Option<&'a PathBuf>,
    launched: bool,
}

pub fn execute(args: BuildArgs, no_color: bool) -> Result<i32> {
    let files = args
        .files
        .iter()
        .map(|f| absolute(f))
        .collect::<Result<Vec<_>>>()?;
    let primary = match args.primary {
        Some(ref p) => absolute(p)?,
        None => files
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("no source files given"))?,
    };

    let mut config = load_config(&config_search_paths(
        &parent_dir(&primary),
        args.config.as_deref(),
    ));
    if args.no_run {
        config.run_after_compile = false;
    }

    let format = match args.message_format {
        MessageFormat::Human => OutputFormat::Human,
        MessageFormat::Json => OutputFormat::Json,
    };
    let notifier = Arc::new(ShellNotifier::new(format, no_color));
    let orchestrator = Orchestrator::new(config, notifier);

    let request = CompileRequest {
        files,
        primary: Some(primary.clone()),
        language: args.language,
        debug: args.debug,
    };

    let spinner = if format == OutputFormat::Human && io::stderr().is_terminal() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Compiling {}", primary.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let (tx, rx) = mpsc::channel();
    let handle = orchestrator.compile_async(request, move |result| {
        let _ = tx.send(result);
    });
    let result = rx.recv();
    let _ = handle.join();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let report = match result {
        Ok(Ok(report)) => report,
        // Already reported through the notifier.
        Ok(Err(_)) => return Ok(1),
        Err(_) => return Err(anyhow!("build thread exited without a result")),
    };

    if format == OutputFormat::Json {
        print_summary(&report)?;
    }

    Ok(if report.outcome() == Outcome::Failure { 1 } else { 0 })
}

fn print_summary(report: &BuildReport) -> Result<()> {
    let summary = BuildSummary {
        reason: "build-finished",
        source: &report.source,
        outcome: report.outcome(),
        exit_code: report.result.exit_code(),
        diagnostics: &report.diagnostics,
        sentinel: report.sentinel.as_ref(),
        launched: report.launched.is_some(),
    };
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
