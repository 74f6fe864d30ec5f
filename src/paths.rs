//! Per-user config, data and cache directories.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::PathsError;

pub const APP_NAME: &str = "timetasker";
pub const CONFIG_FILENAME: &str = "config.toml";
pub const COMPLETIONS_FILENAME: &str = "completions.json";
pub const LOG_FILENAME: &str = "timetasker.log";

/// Directory convention to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// XDG base directories.
    Posix,
    /// `%APPDATA%` and `%LOCALAPPDATA%`.
    Windows,
    /// Dot directory in the home directory.
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(unix) {
            Platform::Posix
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl ProjectDirs {
    /// Resolve directories for this process's platform and environment.
    pub fn resolve() -> Result<Self, PathsError> {
        Self::resolve_with(Platform::current(), |key| std::env::var_os(key), dirs::home_dir())
    }

    /// Resolve with an explicit platform, environment lookup and home directory.
    pub fn resolve_with(
        platform: Platform,
        env: impl Fn(&str) -> Option<OsString>,
        home: Option<PathBuf>,
    ) -> Result<Self, PathsError> {
        let home_dir = || home.clone().ok_or(PathsError::NoHome);

        match platform {
            Platform::Posix => {
                let base = |var: &str, fallback: &str| -> Result<PathBuf, PathsError> {
                    match env(var).map(PathBuf::from) {
                        Some(dir) if dir.is_absolute() => Ok(dir),
                        _ => Ok(home_dir()?.join(fallback)),
                    }
                };
                Ok(Self {
                    config_dir: base("XDG_CONFIG_HOME", ".config")?.join(APP_NAME),
                    data_dir: base("XDG_DATA_HOME", ".local/share")?.join(APP_NAME),
                    cache_dir: base("XDG_CACHE_HOME", ".cache")?.join(APP_NAME),
                })
            }
            Platform::Windows => {
                let appdata = env("APPDATA")
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
                    .ok_or(PathsError::MissingVar("APPDATA"))?;
                let local = env("LOCALAPPDATA")
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| appdata.join("Local"));
                Ok(Self {
                    config_dir: appdata.join(APP_NAME),
                    data_dir: appdata.join(APP_NAME).join("data"),
                    cache_dir: local.join(APP_NAME).join("cache"),
                })
            }
            Platform::Other => {
                let root = home_dir()?.join(format!(".{APP_NAME}"));
                Ok(Self {
                    config_dir: root.clone(),
                    data_dir: root.join("data"),
                    cache_dir: root.join("cache"),
                })
            }
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILENAME)
    }

    pub fn completions_file(&self) -> PathBuf {
        self.cache_dir.join(COMPLETIONS_FILENAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.cache_dir.join(LOG_FILENAME)
    }
}
