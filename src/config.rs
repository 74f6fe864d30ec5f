//! Configuration loading.
//!
//! The config file is optional TOML:
//!
//! ```toml
//! [timer]
//! work_interval = "25m"
//! notify = true
//! ```
//!
//! Command-line overrides win over the file, the file wins over defaults.
//! Everything is resolved once at startup into [`Settings`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::duration::parse_duration;
use crate::error::ConfigError;
use crate::paths::ProjectDirs;

pub const DEFAULT_WORK_INTERVAL: &str = "25m";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub timer: TimerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Length of one work interval, e.g. `25m` or `1h15m`.
    pub work_interval: String,
    /// Show a desktop notification when an interval completes.
    pub notify: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_interval: DEFAULT_WORK_INTERVAL.into(),
            notify: true,
        }
    }
}

impl Config {
    /// Load the config at `path`, or the defaults if there is no file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub work_interval: Option<Duration>,
    pub no_notify: bool,
}

/// Everything the application needs, resolved and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub work_interval: Duration,
    pub notify: bool,
    pub completions_file: PathBuf,
}

impl Settings {
    pub fn resolve(config: &Config, overrides: &Overrides, dirs: &ProjectDirs) -> Result<Self, ConfigError> {
        let work_interval = match overrides.work_interval {
            Some(interval) => interval,
            None => parse_duration(&config.timer.work_interval)?,
        };
        if work_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }

        Ok(Self {
            work_interval,
            notify: config.timer.notify && !overrides.no_notify,
            completions_file: dirs.completions_file(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DurationError;

    fn dirs(root: &Path) -> ProjectDirs {
        ProjectDirs {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            cache_dir: root.join("cache"),
        }
    }

    #[test]
    fn missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());

        let settings = Settings::resolve(&config, &Overrides::default(), &dirs(tmp.path())).unwrap();
        assert_eq!(settings.work_interval, Duration::from_secs(1500));
        assert!(settings.notify);
        assert_eq!(settings.completions_file, tmp.path().join("cache").join("completions.json"));
    }

    #[test]
    fn reads_timer_section() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[timer]\nwork_interval = \"1h15m\"\nnotify = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.timer.work_interval, "1h15m");

        let settings = Settings::resolve(&config, &Overrides::default(), &dirs(tmp.path())).unwrap();
        assert_eq!(settings.work_interval, Duration::from_secs(4500));
        assert!(!settings.notify);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[timer]\nnotify = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.timer.work_interval, DEFAULT_WORK_INTERVAL);
    }

    #[test]
    fn command_line_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let overrides = Overrides {
            work_interval: Some(Duration::from_secs(3000)),
            no_notify: true,
        };
        let settings = Settings::resolve(&Config::default(), &overrides, &dirs(tmp.path())).unwrap();
        assert_eq!(settings.work_interval, Duration::from_secs(3000));
        assert!(!settings.notify);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[timer\nwork_interval = ").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn malformed_interval_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.timer.work_interval = "twenty".into();

        let err = Settings::resolve(&config, &Overrides::default(), &dirs(tmp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Interval(DurationError::UnknownUnit { .. })));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.timer.work_interval = "".into();

        let err = Settings::resolve(&config, &Overrides::default(), &dirs(tmp.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroInterval));
    }
}
