use crate::entities::EscapeMode;
use crate::errors::Result;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Name of the project-level configuration file.
pub const CONFIG_FILE_NAME: &str = ".html-fixer.yaml";

/// Settings read from a YAML configuration file.
///
/// Every field is optional; command-line flags take precedence over these.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FixerConfig {
    /// Escaping mode to use when `--mode` is not given.
    pub mode: Option<EscapeMode>,
    /// Globs for files that should never be touched.
    pub exclude: Vec<String>,
    /// Number of worker threads.
    pub workers: Option<usize>,
    /// Whether hidden and git-ignored files are skipped.
    pub respect_ignore: Option<bool>,
    /// Report format: `text`, `json` or `csv`.
    pub format: Option<String>,
}

/// A utility for locating and loading `FixerConfig` files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds an explicitly requested configuration file.
    ///
    /// The search order is:
    /// 1. The path itself, if it is absolute or exists relative to the current directory.
    /// 2. A path relative to `working_dir`.
    /// 3. Inside the `~/.html-fixer` directory.
    pub fn find_config(config_path: &Path, working_dir: &Path) -> Result<PathBuf> {
        if config_path.exists() {
            return Ok(config_path.to_path_buf());
        }

        let in_working_dir = working_dir.join(config_path);
        if in_working_dir.exists() {
            return Ok(in_working_dir);
        }

        let mut tried_locations = vec![
            config_path.display().to_string(),
            in_working_dir.display().to_string(),
        ];

        if let Some(home_dir) = Self::home_config_dir() {
            let home_config = home_dir.join(config_path);
            if home_config.exists() {
                return Ok(home_config);
            }
            tried_locations.push(home_config.display().to_string());
        }

        Err(format!(
            "Config file '{}' not found. Searched in:\n  - {}",
            config_path.display(),
            tried_locations.join("\n  - ")
        )
        .into())
    }

    /// Looks for an implicit configuration file: `.html-fixer.yaml` in
    /// `working_dir`, then `~/.html-fixer/config.yaml`.
    pub fn discover(working_dir: &Path) -> Option<PathBuf> {
        let project_config = working_dir.join(CONFIG_FILE_NAME);
        if project_config.is_file() {
            return Some(project_config);
        }

        Self::home_config_dir()
            .map(|dir| dir.join("config.yaml"))
            .filter(|path| path.is_file())
    }

    /// Resolves and loads the configuration for a run.
    ///
    /// An explicit path that cannot be found is an error. Without one, a
    /// missing implicit config simply yields the defaults.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<FixerConfig> {
        let path = match explicit {
            Some(path) => Some(Self::find_config(path, working_dir)?),
            None => Self::discover(working_dir),
        };

        match path {
            Some(path) => {
                tracing::debug!("Using config file: {}", path.display());
                Self::load_config(&path)
            }
            None => Ok(FixerConfig::default()),
        }
    }

    /// Loads a `FixerConfig` from a YAML file.
    pub fn load_config(path: &Path) -> Result<FixerConfig> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    fn home_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".html-fixer"))
    }
}
