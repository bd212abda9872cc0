//! `html_fixer` escapes unescaped HTML entities in source files.
//!
//! It provides the core logic for the `html-fixer` command-line tool but can
//! also be embedded in other tools. The main components are:
//!
//! - `entities`: the essential and extended character catalogs and the
//!   recognizer for references that are already escaped.
//! - `escaper`: escaping of a single string, never touching existing
//!   references such as `&amp;` or `&#39;`.
//! - `processor`: escaping files in place, alone or in parallel batches,
//!   with per-file outcomes folded into a run summary.
//! - `file_finder`: expansion of glob patterns into a file list.
//! - `config`: loading defaults from `.html-fixer.yaml`.
//! - `output_formatter`: text, JSON and CSV run reports.

pub mod cli;
pub mod config;
pub mod entities;
pub mod errors;
pub mod escaper;
pub mod file_finder;
pub mod logging;
pub mod output_formatter;
pub mod processor;

// Re-export main types for easier access by library users.
pub use entities::{EntityCatalog, EscapeMode, get_entity_map, is_escaped_entity};
pub use errors::{Error, Result};
pub use escaper::{EscapeResult, escape, has_unescaped_entities};
pub use file_finder::{FinderOptions, find_files};
pub use output_formatter::{OutputFormat, OutputFormatter};
pub use processor::{
    BatchOptions, FileResult, ProcessOptions, ProcessSummary, process_file, process_files,
};
