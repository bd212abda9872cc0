use crate::entities::EscapeMode;
use crate::errors::{Error, Result};
use crate::escaper::{EscapeResult, escape};
use crate::file_finder::{FinderOptions, find_files};
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Options for processing a single file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessOptions {
    /// Which characters to escape.
    pub mode: EscapeMode,
    /// If `true`, changes will be calculated but not written to disk.
    pub dry_run: bool,
}

/// Options for a whole run over a set of patterns.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub mode: EscapeMode,
    pub dry_run: bool,
    /// Directory the patterns are resolved against. Defaults to the process
    /// working directory.
    pub cwd: Option<PathBuf>,
    /// The number of parallel worker threads. Defaults to the number of
    /// logical CPU cores.
    pub workers: Option<usize>,
    /// Globs for files to leave alone.
    pub exclude: Vec<String>,
    /// Skip hidden and ignored files while expanding patterns.
    pub respect_ignore: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            mode: EscapeMode::default(),
            dry_run: false,
            cwd: None,
            workers: None,
            exclude: Vec::new(),
            respect_ignore: true,
        }
    }
}

impl BatchOptions {
    fn file_options(&self) -> ProcessOptions {
        ProcessOptions {
            mode: self.mode,
            dry_run: self.dry_run,
        }
    }
}

/// The outcome of processing one file.
///
/// A failed read or write is recorded here as a message; it never aborts
/// the surrounding batch.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: std::result::Result<EscapeResult, String>,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The escape result, present iff the file was processed successfully.
    pub fn escape_result(&self) -> Option<&EscapeResult> {
        self.outcome.as_ref().ok()
    }

    /// The error message, present iff processing failed.
    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }

    pub fn has_changes(&self) -> bool {
        self.escape_result().is_some_and(|r| r.has_changes)
    }

    pub fn escaped_count(&self) -> usize {
        self.escape_result().map_or(0, |r| r.escaped_count)
    }
}

/// Aggregated statistics for a run.
#[derive(Debug, Clone, Default)]
pub struct ProcessSummary {
    pub total_files: usize,
    pub files_with_changes: usize,
    pub total_entities_escaped: usize,
    pub failed_files: usize,
    pub files: Vec<FileResult>,
}

impl ProcessSummary {
    /// Folds one file's outcome into the totals.
    pub fn push(&mut self, file: FileResult) {
        self.total_files += 1;
        match &file.outcome {
            Ok(result) => {
                if result.has_changes {
                    self.files_with_changes += 1;
                }
                self.total_entities_escaped += result.escaped_count;
            }
            Err(_) => self.failed_files += 1,
        }
        self.files.push(file);
    }

    pub fn has_failures(&self) -> bool {
        self.failed_files > 0
    }

    /// `true` if at least one file was (or in a dry run, would be) changed.
    pub fn has_pending_changes(&self) -> bool {
        self.files_with_changes > 0
    }
}

impl FromIterator<FileResult> for ProcessSummary {
    fn from_iter<I: IntoIterator<Item = FileResult>>(iter: I) -> Self {
        let mut summary = ProcessSummary::default();
        for file in iter {
            summary.push(file);
        }
        summary
    }
}

/// Escapes one file in place.
///
/// Reads the file as UTF-8, escapes it and, unless this is a dry run, writes
/// the result back when anything changed. Any I/O failure is captured in the
/// returned `FileResult`.
pub fn process_file(path: &Path, options: &ProcessOptions) -> FileResult {
    let outcome = fix_file(path, options).map_err(|e| e.to_string());

    match &outcome {
        Ok(result) if result.has_changes => debug!(
            "{}: {} {} entities",
            path.display(),
            if options.dry_run { "would fix" } else { "fixed" },
            result.escaped_count
        ),
        Ok(_) => debug!("{}: no changes needed", path.display()),
        Err(e) => debug!("{}", e),
    }

    FileResult {
        path: path.to_path_buf(),
        outcome,
    }
}

fn fix_file(path: &Path, options: &ProcessOptions) -> Result<EscapeResult> {
    let content = fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
    let result = escape(&content, options.mode);

    if result.has_changes && !options.dry_run {
        write_atomically(path, &result.content)?;
    }

    Ok(result)
}

/// Replaces the contents of `path` through a temp file in the same directory,
/// keeping the original permissions.
///
/// Symlinks are resolved first so the link target is rewritten and the link
/// itself stays in place.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let target = fs::canonicalize(path).map_err(|e| Error::write(path, e))?;
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| Error::write(path, e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::write(path, e))?;

    let perms = fs::metadata(&target)
        .map_err(|e| Error::write(path, e))?
        .permissions();
    fs::set_permissions(temp_file.path(), perms).map_err(|e| Error::write(path, e))?;

    temp_file.persist(&target)?;
    Ok(())
}

/// Expands `patterns` and escapes every matched file.
///
/// Files are processed in parallel; their results are collected in file
/// order and folded into the summary afterwards. Per-file failures only show
/// up in the summary. An `Err` means the run itself could not start: an
/// invalid pattern, an unknown working directory or a thread pool failure.
pub fn process_files(patterns: &[String], options: &BatchOptions) -> Result<ProcessSummary> {
    let cwd = match &options.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir()?,
    };

    let finder = FinderOptions {
        exclude: options.exclude.clone(),
        respect_ignore: options.respect_ignore,
        ..FinderOptions::new(cwd)
    };
    let files = find_files(patterns, &finder)?;
    info!("Matched {} files", files.len());

    let summary = process_paths(&files, options)?;
    info!(
        "Processed {} files: {} with changes, {} entities, {} failed",
        summary.total_files,
        summary.files_with_changes,
        summary.total_entities_escaped,
        summary.failed_files
    );

    Ok(summary)
}

/// Processes an already expanded file list.
pub fn process_paths(files: &[PathBuf], options: &BatchOptions) -> Result<ProcessSummary> {
    process_paths_with(files, options, |_| {})
}

/// Like [`process_paths`], calling `on_file` once per finished file.
///
/// `on_file` runs on the worker threads, so it must be thread safe.
pub fn process_paths_with<F>(
    files: &[PathBuf],
    options: &BatchOptions,
    on_file: F,
) -> Result<ProcessSummary>
where
    F: Fn(&FileResult) + Sync,
{
    if files.is_empty() {
        return Ok(ProcessSummary::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.unwrap_or_else(num_cpus::get))
        .build()?;

    let file_options = options.file_options();
    let results: Vec<FileResult> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = process_file(path, &file_options);
                on_file(&result);
                result
            })
            .collect()
    });

    Ok(results.into_iter().collect())
}
