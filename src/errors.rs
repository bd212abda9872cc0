use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in `html-fixer`.
///
/// Per-file problems never escape the batch processor as this type; they are
/// rendered into the failing `FileResult` instead. Only run-level problems
/// (a bad pattern, a bad config, an invalid mode) are returned to the caller.
#[derive(Error, Debug)]
pub enum Error {
    /// An error related to file system I/O.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An escaping mode other than `essential` or `extended` was requested.
    #[error("Invalid mode: {0}. Must be 'essential' or 'extended'.")]
    InvalidMode(String),

    /// A file could not be read or written.
    #[error("{action} {} failed: {source}", .path.display())]
    FileAccess {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// A glob pattern could not be compiled.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    /// An error that occurred while building the Rayon thread pool.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// An error related to persisting a temporary file.
    #[error("Tempfile error: {0}")]
    TempFile(#[from] tempfile::PersistError),

    /// An error that occurred while parsing a YAML configuration file.
    #[error("Config parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A general configuration-related error.
    #[error("Config error: {0}")]
    Config(String),

    /// An error related to CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An error related to JSON serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, html_fixer::errors::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileAccess {
            action: "Reading",
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileAccess {
            action: "Writing",
            path: path.into(),
            source,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Config(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Config(s.to_string())
    }
}
