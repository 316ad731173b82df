//! Configuration management for blinkctl.
//!
//! Loads configuration from ${BLINKCTL_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub mod paths {
    //! Path resolution for blinkctl configuration and log files.
    //!
    //! BLINKCTL_HOME resolution order:
    //! 1. BLINKCTL_HOME environment variable (if set)
    //! 2. ~/.config/blinkctl (default)

    use std::path::PathBuf;

    /// Returns the blinkctl home directory.
    pub fn blinkctl_home() -> PathBuf {
        if let Ok(home) = std::env::var("BLINKCTL_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".blinkctl"),
            |h| h.join(".config").join("blinkctl"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        blinkctl_home().join("config.toml")
    }

    /// Returns the default log file path.
    pub fn log_path() -> PathBuf {
        blinkctl_home().join("blinkctl.log")
    }
}

fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Named pipe the device writes status bytes to.
    pub input_pipe: PathBuf,

    /// Named pipe the device reads commands from.
    pub output_pipe: PathBuf,

    /// Bound on each blocking read in milliseconds.
    pub poll_timeout_ms: u64,

    /// Aggregation window in seconds.
    pub window_secs: u64,

    /// Log file override.
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub const DEFAULT_INPUT_PIPE: &'static str = "/tmp/prga-hw08.out";
    pub const DEFAULT_OUTPUT_PIPE: &'static str = "/tmp/prga-hw08.in";
    pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 10;
    pub const DEFAULT_WINDOW_SECS: u64 = 5;

    /// Loads configuration from the default path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Writes the commented default config to `path`, creating parent dirs.
    ///
    /// # Errors
    /// Fails if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// # Errors
    /// Returns an error naming the first out-of-range value.
    pub fn validate(&self) -> Result<()> {
        if self.poll_timeout_ms == 0 {
            anyhow::bail!("poll_timeout_ms must be at least 1");
        }
        if self.window_secs == 0 {
            anyhow::bail!("window_secs must be at least 1");
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Log file to write to: the configured one or the default under home.
    pub fn log_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(paths::log_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_pipe: PathBuf::from(Self::DEFAULT_INPUT_PIPE),
            output_pipe: PathBuf::from(Self::DEFAULT_OUTPUT_PIPE),
            poll_timeout_ms: Self::DEFAULT_POLL_TIMEOUT_MS,
            window_secs: Self::DEFAULT_WINDOW_SECS,
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_timeout(), Duration::from_millis(10));
        assert_eq!(config.window(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "window_secs = 2\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.window_secs, 2);
        assert_eq!(config.poll_timeout_ms, 10);
        assert_eq!(config.input_pipe, PathBuf::from("/tmp/prga-hw08.out"));
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "window_secs = \"soon\"\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("poll_timeout_ms = 10"));
        assert!(contents.contains("# log_file ="));
        assert_eq!(Config::load_from(&config_path).unwrap(), Config::default());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = Config {
            poll_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            window_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_log_path_prefers_override() {
        let config = Config {
            log_file: Some(PathBuf::from("/tmp/x.log")),
            ..Config::default()
        };
        assert_eq!(config.log_path(), PathBuf::from("/tmp/x.log"));
    }
}
