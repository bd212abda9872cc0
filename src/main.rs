//! The main entry point for the `html-fixer` command-line application.
//!
//! This file parses command-line arguments, merges them with the optional
//! configuration file and maps the run summary onto the process exit code.

use anyhow::Context;
use html_fixer::cli::{self, Args};
use html_fixer::config::ConfigLoader;
use html_fixer::file_finder::{FinderOptions, find_files};
use html_fixer::processor::{BatchOptions, ProcessSummary, process_paths_with};
use html_fixer::{OutputFormat, OutputFormatter, logging};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let args = cli::parse_args();
    logging::init(args.verbose, args.quiet);

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let current_dir = std::env::current_dir().context("Cannot determine the current directory")?;
    let cwd = match &args.cwd {
        Some(dir) => current_dir.join(dir),
        None => current_dir,
    };

    let config = ConfigLoader::load(args.config.as_deref(), &cwd)?;

    let mut exclude = config.exclude;
    exclude.extend(args.exclude);
    let options = BatchOptions {
        mode: args.mode.or(config.mode).unwrap_or_default(),
        dry_run: args.dry_run,
        cwd: Some(cwd.clone()),
        workers: args.workers.or(config.workers),
        exclude,
        respect_ignore: !args.no_ignore && config.respect_ignore.unwrap_or(true),
    };
    let format = args
        .format
        .as_deref()
        .or(config.format.as_deref())
        .map(OutputFormat::from)
        .unwrap_or_default();

    if options.dry_run && !args.quiet && format == OutputFormat::Text {
        println!("Dry run mode - no files will be modified\n");
    }
    tracing::debug!("Patterns: {}", args.patterns.join(", "));
    tracing::debug!("Mode: {}", options.mode);

    let finder = FinderOptions {
        exclude: options.exclude.clone(),
        respect_ignore: options.respect_ignore,
        ..FinderOptions::new(&cwd)
    };
    let files = find_files(&args.patterns, &finder)?;

    let progress = if args.quiet || args.verbose {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let summary = process_paths_with(&files, &options, |_| progress.inc(1))?;
    progress.finish_and_clear();

    if failures_go_to_stderr(format, args.quiet, args.verbose) {
        for file in summary.files.iter().filter(|f| !f.is_success()) {
            error!("{}", file.error().unwrap_or("unknown error"));
        }
    }

    if !args.quiet || format != OutputFormat::Text {
        let formatter = OutputFormatter::new(format, options.mode, options.dry_run, args.verbose)
            .with_base_dir(&cwd);
        let stdout = std::io::stdout();
        formatter.write_summary(&mut stdout.lock(), &summary)?;
    }

    Ok(ExitCode::from(exit_code(&summary, options.dry_run)))
}

/// The verbose text report and the JSON/CSV reports list failures themselves;
/// everywhere else each failure is logged once on stderr.
fn failures_go_to_stderr(format: OutputFormat, quiet: bool, verbose: bool) -> bool {
    format == OutputFormat::Text && (quiet || !verbose)
}

/// 1 when any file failed, or when a dry run found files that need escaping.
fn exit_code(summary: &ProcessSummary, dry_run: bool) -> u8 {
    if summary.has_failures() || (dry_run && summary.has_pending_changes()) {
        1
    } else {
        0
    }
}
