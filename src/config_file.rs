//! Settings file handling for cmdgroup

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runner::{Runner, default_shell};

/// Errors that can occur while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unable to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to parse YAML settings file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON settings file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Unable to determine a data directory; set HOME, XDG_DATA_HOME or --data-file")]
    NoDataDir,
    #[error("Invalid settings: {0}")]
    Validation(String),
}

/// Contents of an optional settings file. Every field may be omitted.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub data_file: Option<PathBuf>,
    pub shell: Option<String>,
    pub shell_args: Option<Vec<String>>,
    pub working_dir: Option<PathBuf>,
}

/// Environment variable naming a settings file
pub const CONFIG_ENV: &str = "CMDGROUP_CONFIG";
/// Environment variable naming the catalog data file
pub const DATA_FILE_ENV: &str = "CMDGROUP_DATA_FILE";

const APP_DIR: &str = "cmdgroup";
const DATA_FILENAME: &str = "command_groups.json";

/// List of supported settings file names
const FILENAMES: [&str; 3] = ["config.json", "config.yaml", "config.yml"];

impl Settings {
    /// Loads and parses a settings file. Relative paths inside it resolve against the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist, `ConfigError::Read`
    /// if it cannot be read, or `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Settings, ConfigError> {
        if !file.exists() {
            return Err(ConfigError::ConfigNotFound(file.to_path_buf()));
        }
        let contents = std::fs::read_to_string(file).map_err(|e| ConfigError::Read {
            path: file.to_path_buf(),
            source: e,
        })?;
        let mut settings: Settings = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        if let Some(base) = file.parent() {
            settings.data_file = settings.data_file.map(|p| resolve(base, p));
            settings.working_dir = settings.working_dir.map(|p| resolve(base, p));
        }
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.shell.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ConfigError::Validation("shell must not be empty".to_string()));
        }
        Ok(())
    }

    /// Looks for a settings file in the user's config directory.
    #[must_use]
    pub fn find_config() -> Option<PathBuf> {
        let dir = config_home()?.join(APP_DIR);
        debug!("Searching for settings file in {}", dir.display());
        FILENAMES.iter().map(|f| dir.join(f)).find(|p| {
            let found = p.exists();
            if found {
                info!("Found settings file: {}", p.display());
            }
            found
        })
    }

    /// Load settings from an explicit file, `CMDGROUP_CONFIG`, or the default location.
    /// A missing default file yields empty settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an explicitly named file is missing or any file fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path),
            None => match Self::find_config() {
                Some(path) => Self::from_file(&path),
                None => Ok(Settings::default()),
            },
        }
    }

    /// Resolve the catalog data file: CLI flag, then `CMDGROUP_DATA_FILE`, then the
    /// settings file, then the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoDataDir` if nothing names a location and no data
    /// directory can be derived from the environment.
    pub fn data_file(&self, flag: Option<&Path>) -> Result<PathBuf, ConfigError> {
        if let Some(path) = flag {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = std::env::var_os(DATA_FILE_ENV) {
            return Ok(PathBuf::from(path));
        }
        if let Some(ref path) = self.data_file {
            return Ok(path.clone());
        }
        data_home()
            .map(|dir| dir.join(APP_DIR).join(DATA_FILENAME))
            .ok_or(ConfigError::NoDataDir)
    }

    /// Build the command runner described by these settings, falling back to the
    /// platform shell for anything left unset
    #[must_use]
    pub fn runner(&self) -> Runner {
        let (shell, shell_args) = default_shell();
        Runner::new(
            self.shell.clone().unwrap_or(shell),
            self.shell_args.clone().unwrap_or(shell_args),
            self.working_dir.clone(),
        )
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn config_home() -> Option<PathBuf> {
    env_dir("XDG_CONFIG_HOME").or_else(|| env_dir("HOME").map(|h| h.join(".config")))
}

fn data_home() -> Option<PathBuf> {
    env_dir("XDG_DATA_HOME").or_else(|| env_dir("HOME").map(|h| h.join(".local/share")))
}
