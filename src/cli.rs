use crate::entities::EscapeMode;
use clap::Parser;
use std::path::PathBuf;

/// Fast, safe escaping of unescaped HTML entities.
///
/// `html-fixer` rewrites raw `&`, `<`, `>`, `"` and `'` (plus typographic
/// symbols in extended mode) into entity references across every file the
/// given glob patterns match. Existing references such as `&amp;` or `&#39;`
/// are never escaped twice.
#[derive(Parser, Debug)]
#[command(
    name = "html-fixer",
    author,
    version,
    about = "Fast, safe CLI tool for escaping unescaped HTML entities",
    long_about = "html-fixer - Escape unescaped HTML entities without double-escaping.

QUICK EXAMPLES:
  html-fixer 'src/**/*.jsx'                     # Fix every JSX file under src/
  html-fixer 'src/**/*.jsx' --dry-run           # Exit 1 if anything would change (CI)
  html-fixer '**/*.html' -m extended            # Also escape ©, —, €, → ...
  html-fixer '**/*.html' -e 'dist/**' -f json   # Skip build output, JSON report

Configuration is read from .html-fixer.yaml in the working directory when present:
  mode: extended
  exclude: ['dist/**', 'vendor/**']
  workers: 4"
)]
pub struct Args {
    /// Glob patterns for files to process (e.g. "src/**/*.jsx").
    #[arg(required = true, value_name = "PATTERNS")]
    pub patterns: Vec<String>,

    /// Preview changes without modifying files. Exits with 1 if any file would change.
    #[arg(short, long)]
    pub dry_run: bool,

    /// Escaping mode: essential or extended. Defaults to essential.
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<EscapeMode>,

    /// Show every processed file.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to a YAML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory that patterns are resolved against. Defaults to the current directory.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// A comma-separated list of globs for files to skip.
    #[arg(short = 'e', long = "exclude", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// The number of parallel worker threads to use. Defaults to the number of logical CPU cores.
    #[arg(short = 'w', long = "workers", env = "HTML_FIXER_WORKERS")]
    pub workers: Option<usize>,

    /// Include hidden files and files excluded by .gitignore.
    #[arg(long)]
    pub no_ignore: bool,

    /// The report format (`text`, `json` or `csv`).
    #[arg(short = 'f', long = "format")]
    pub format: Option<String>,
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
