//! Process configuration.
//!
//! # Responsibility
//! - Resolve default locations for the config file, database, review-load
//!   log and log directory.
//! - Load and validate the list of inbox files.
//! - Carry review tuning (`ReviewSettings`) as an explicit value.
//!
//! # Invariants
//! - Configuration is built once per run and passed by reference; nothing
//!   here is global.
//! - Every inbox path in a loaded `AppConfig` exists and is a regular file.

use crate::model::note::{DEFAULT_EASE_FACTOR, INITIAL_INTERVAL};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "spaced-inbox";
const CONFIG_FILE_NAME: &str = "config.txt";
const DB_FILE_NAME: &str = "data.db";
const REVIEW_LOAD_FILE_NAME: &str = "review-load.csv";
const LOG_DIR_NAME: &str = "logs";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    /// Platform has no config/data directory to derive defaults from.
    NoDefaultDirectory(&'static str),
    ConfigNotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    MissingInbox(PathBuf),
    NoInboxes(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDefaultDirectory(kind) => {
                write!(f, "could not determine the default {kind} directory")
            }
            Self::ConfigNotFound(path) => write!(
                f,
                "config file not found at `{}`; create it with one inbox file path per line",
                path.display()
            ),
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::MissingInbox(path) => write!(
                f,
                "inbox file `{}` not found or not a regular file; expand abbreviations such as `~/`",
                path.display()
            ),
            Self::NoInboxes(path) => write!(
                f,
                "config file `{}` does not list any inbox files",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Review tuning shared by the reconciler and the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSettings {
    /// Interval (days) for new and resurrected notes.
    pub initial_interval: i64,
    /// Ease factor (percent) for new and resurrected notes.
    pub default_ease_factor: i64,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            initial_interval: INITIAL_INTERVAL,
            default_ease_factor: DEFAULT_EASE_FACTOR,
        }
    }
}

/// File-system locations used by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_file: PathBuf,
    pub db_path: PathBuf,
    pub review_load_path: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    /// Resolves the platform default locations.
    pub fn default_paths() -> ConfigResult<Self> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoDefaultDirectory("config"))?
            .join(APP_DIR_NAME);
        let data_dir = dirs::data_local_dir()
            .ok_or(ConfigError::NoDefaultDirectory("data"))?
            .join(APP_DIR_NAME);
        Ok(Self::under(config_dir, data_dir))
    }

    /// Lays out all paths below explicit config/data directories.
    pub fn under(config_dir: impl AsRef<Path>, data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            config_file: config_dir.as_ref().join(CONFIG_FILE_NAME),
            db_path: data_dir.join(DB_FILE_NAME),
            review_load_path: data_dir.join(REVIEW_LOAD_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub inbox_paths: Vec<PathBuf>,
    pub db_path: PathBuf,
    pub review_load_path: PathBuf,
    pub log_dir: PathBuf,
    pub review: ReviewSettings,
}

impl AppConfig {
    /// Loads the inbox list named by `paths.config_file` and validates it.
    pub fn load(paths: AppPaths) -> ConfigResult<Self> {
        let inbox_paths = load_inbox_paths(&paths.config_file)?;
        Ok(Self {
            inbox_paths,
            db_path: paths.db_path,
            review_load_path: paths.review_load_path,
            log_dir: paths.log_dir,
            review: ReviewSettings::default(),
        })
    }
}

/// Extracts inbox paths from config file content.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_inbox_list(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}

/// Reads the config file and checks that every listed inbox is a file.
pub fn load_inbox_paths(config_file: &Path) -> ConfigResult<Vec<PathBuf>> {
    if !config_file.is_file() {
        return Err(ConfigError::ConfigNotFound(config_file.to_path_buf()));
    }
    let content = std::fs::read_to_string(config_file).map_err(|source| ConfigError::Io {
        path: config_file.to_path_buf(),
        source,
    })?;

    let paths = parse_inbox_list(&content);
    if let Some(missing) = paths.iter().find(|path| !path.is_file()) {
        return Err(ConfigError::MissingInbox(missing.clone()));
    }
    if paths.is_empty() {
        return Err(ConfigError::NoInboxes(config_file.to_path_buf()));
    }
    Ok(paths)
}
