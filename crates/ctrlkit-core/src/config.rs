/*!
 * Configuration management for ctrlkit.
 *
 * This module loads the defaults used by the poller, the command executor and
 * the device probe, optionally overridden by a file and environment variables.
 */
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use config::{Config as ConfigLib, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Core configuration for ctrlkit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Timeout poller defaults
    #[serde(default)]
    pub polling: PollingConfig,

    /// Fire-and-poll command defaults
    #[serde(default)]
    pub command: CommandConfig,

    /// Device state probe configuration
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to include the event target in log lines
    #[serde(default = "default_true")]
    pub with_target: bool,
}

/// Timeout poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Total time the predicate has to succeed, in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub timeout_ms: u64,

    /// Sleep between predicate calls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

/// Fire-and-poll command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Sleep between completion checks, in milliseconds
    #[serde(default = "default_command_interval_ms")]
    pub interval_ms: u64,

    /// Deadline for a command to complete in milliseconds (0 means wait forever)
    #[serde(default)]
    pub timeout_ms: u64,
}

/// Device state probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Root of the sysfs class hierarchy
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: String,

    /// Device subsystem to enumerate
    #[serde(default = "default_subsystem")]
    pub subsystem: String,

    /// Attribute holding the device state
    #[serde(default = "default_state_attribute")]
    pub attribute: String,

    /// Attribute value meaning the device is operational
    #[serde(default = "default_operating_value")]
    pub operating_value: String,
}

impl PollingConfig {
    /// The timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl CommandConfig {
    /// The completion poll interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// The command deadline, if one is configured
    pub fn deadline(&self) -> Option<Duration> {
        match self.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: true,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_poll_timeout_ms(),
            interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_command_interval_ms(),
            timeout_ms: 0, // Unbounded
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            sysfs_root: default_sysfs_root(),
            subsystem: default_subsystem(),
            attribute: default_state_attribute(),
            operating_value: default_operating_value(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_poll_timeout_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_command_interval_ms() -> u64 {
    100
}

fn default_sysfs_root() -> String {
    "/sys/class".to_string()
}

fn default_subsystem() -> String {
    "fpga_manager".to_string()
}

fn default_state_attribute() -> String {
    "state".to_string()
}

fn default_operating_value() -> String {
    "operating".to_string()
}

/// A builder for creating a configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<String>,
    environment_prefix: Option<String>,
    override_with: Option<Config>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file path
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Set the environment variable prefix for configuration
    pub fn with_environment_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.environment_prefix = Some(prefix.as_ref().to_string());
        self
    }

    /// Override with an existing config
    pub fn override_with(mut self, config: Config) -> Self {
        self.override_with = Some(config);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        if let Some(config) = self.override_with {
            debug!("Using caller-provided configuration");
            return Ok(config);
        }

        let default_config = Config::default();
        let mut config_builder = ConfigLib::builder().add_source(
            ConfigLib::try_from(&default_config)
                .map_err(|e| Error::config(format!("Failed to create default config: {}", e)))?,
        );

        if let Some(config_file) = self.config_file {
            let path = Path::new(&config_file);
            if path.exists() {
                debug!("Loading configuration from {}", config_file);
                config_builder = config_builder.add_source(File::with_name(&config_file));
            } else {
                debug!("Configuration file {} does not exist, using defaults", config_file);
            }
        }

        if let Some(prefix) = self.environment_prefix {
            debug!("Loading configuration from environment variables with prefix {}", prefix);
            config_builder = config_builder.add_source(
                Environment::with_prefix(&prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config_lib = config_builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build configuration: {}", e)))?;

        let config: Config = config_lib
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize configuration: {}", e)))?;

        info!("Configuration loaded successfully");
        Ok(config)
    }
}

/// A thread-safe reference to a configuration
#[derive(Debug, Clone)]
pub struct SharedConfig(Arc<Config>);

impl SharedConfig {
    /// Create a new SharedConfig
    pub fn new(config: Config) -> Self {
        Self(Arc::new(config))
    }

    /// Get a reference to the config
    pub fn get(&self) -> &Config {
        &self.0
    }
}

impl From<Config> for SharedConfig {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}

impl AsRef<Config> for SharedConfig {
    fn as_ref(&self) -> &Config {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs::File as FsFile;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.polling.interval(), Duration::from_millis(10));
        assert_eq!(config.command.interval(), Duration::from_millis(100));
        assert_eq!(config.command.deadline(), None);
        assert_eq!(config.probe.subsystem, "fpga_manager");
        assert_eq!(config.probe.operating_value, "operating");
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.probe.sysfs_root, "/sys/class");
        assert_eq!(config.polling.timeout_ms, 1000);
    }

    #[test]
    fn test_config_builder_with_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("ctrlkit.toml");

        {
            let mut file = FsFile::create(&file_path)?;
            file.write_all(br#"
                [logging]
                level = "debug"

                [command]
                timeout_ms = 2500

                [probe]
                subsystem = "fpga_region"
            "#)?;
        }

        let config = ConfigBuilder::new()
            .with_config_file(file_path)
            .build()?;

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.command.deadline(), Some(Duration::from_millis(2500)));
        assert_eq!(config.command.interval_ms, 100);
        assert_eq!(config.probe.subsystem, "fpga_region");
        assert_eq!(config.probe.attribute, "state");

        Ok(())
    }

    #[test]
    fn test_config_builder_missing_file_uses_defaults() -> Result<()> {
        let config = ConfigBuilder::new()
            .with_config_file("/nonexistent/ctrlkit.toml")
            .build()?;
        assert_eq!(config.logging.level, "info");
        Ok(())
    }

    #[test]
    fn test_config_builder_with_env() -> Result<()> {
        env::set_var("CTRLKIT_TEST__POLLING__INTERVAL_MS", "25");
        env::set_var("CTRLKIT_TEST__LOGGING__LEVEL", "trace");

        let config = ConfigBuilder::new()
            .with_environment_prefix("CTRLKIT_TEST")
            .build()?;

        assert_eq!(config.polling.interval_ms, 25);
        assert_eq!(config.logging.level, "trace");

        env::remove_var("CTRLKIT_TEST__POLLING__INTERVAL_MS");
        env::remove_var("CTRLKIT_TEST__LOGGING__LEVEL");

        Ok(())
    }

    #[test]
    fn test_override_with() -> Result<()> {
        let mut custom = Config::default();
        custom.polling.timeout_ms = 5;
        let config = ConfigBuilder::new().override_with(custom).build()?;
        assert_eq!(config.polling.timeout_ms, 5);
        Ok(())
    }

    #[test]
    fn test_shared_config() {
        let shared = SharedConfig::new(Config::default());
        let shared2 = shared.clone();
        assert_eq!(shared2.get().probe.attribute, "state");
        assert_eq!(shared.as_ref().logging.level, "info");
    }
}
