/*!
 * Logging functionality for ctrlkit.
 *
 * This module provides tracing setup and the injectable [`Logger`]
 * capability. Operations that accept an `Option<&dyn Logger>` stay silent
 * when given `None`.
 */
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Sink for diagnostic messages handed to ctrlkit operations by the caller
pub trait Logger: Send + Sync {
    /// Log an error
    fn error(&self, msg: &str);

    /// Log a warning
    fn warning(&self, msg: &str);

    /// Log a debug message
    fn debug(&self, msg: &str);

    /// Log a trace message
    fn trace(&self, msg: &str);
}

/// A [`Logger`] that forwards to `tracing` events tagged with a component name
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl TracingLogger {
    /// Create a logger for the given component
    pub fn new<S: Into<String>>(component: S) -> Self {
        Self {
            component: component.into(),
        }
    }
}

impl Logger for TracingLogger {
    fn error(&self, msg: &str) {
        tracing::error!(component = %self.component, "{}", msg);
    }

    fn warning(&self, msg: &str) {
        tracing::warn!(component = %self.component, "{}", msg);
    }

    fn debug(&self, msg: &str) {
        tracing::debug!(component = %self.component, "{}", msg);
    }

    fn trace(&self, msg: &str) {
        tracing::trace!(component = %self.component, "{}", msg);
    }
}

/// Initialize the logging system with default configuration
pub fn init() -> Result<()> {
    init_with_filter("info")
}

/// Initialize the logging system with a specific filter
///
/// # Arguments
///
/// * `filter` - The log filter string (e.g., "info", "debug", "ctrlkit_core=trace")
pub fn init_with_filter(filter: &str) -> Result<()> {
    install(filter, true)
}

/// Initialize the logging system from a [`LoggingConfig`]
pub fn init_with_config(config: &LoggingConfig) -> Result<()> {
    install(&config.level, config.with_target)
}

fn install(filter: &str, with_target: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(with_target))
        .with(filter)
        .try_init()
        .map_err(|e| Error::runtime(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_fails() {
        // Whichever call comes second in this process must fail
        let first = init();
        let second = init_with_filter("debug");
        assert!(first.is_err() || second.is_err());
        if let Err(e) = second {
            assert!(matches!(e, Error::Runtime(_)));
        }
    }

    #[test]
    fn test_tracing_logger_without_subscriber() {
        let logger = TracingLogger::new("FPGA");

        // No subscriber required for these to be no-ops
        logger.error("e");
        logger.warning("w");
        logger.debug("d");
        logger.trace("t");
    }
}
