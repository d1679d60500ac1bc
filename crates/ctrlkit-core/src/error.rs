/*!
 * Error types for the ctrlkit core crate.
 */
use thiserror::Error;

/// Error type for ctrlkit core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A compat number does not have the (major, minor[, build]) shape
    #[error("Format error: {0}")]
    Format(String),

    /// Compat numbers are incompatible
    #[error("Version mismatch: {0}")]
    VersionMismatch(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime error
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ctrlkit core operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new format error
    pub fn format<S: AsRef<str>>(msg: S) -> Self {
        Error::Format(msg.as_ref().to_string())
    }

    /// Create a new version mismatch error
    pub fn version_mismatch<S: AsRef<str>>(msg: S) -> Self {
        Error::VersionMismatch(msg.as_ref().to_string())
    }

    /// Create a new configuration error
    pub fn config<S: AsRef<str>>(msg: S) -> Self {
        Error::Config(msg.as_ref().to_string())
    }

    /// Create a new runtime error
    pub fn runtime<S: AsRef<str>>(msg: S) -> Self {
        Error::Runtime(msg.as_ref().to_string())
    }
}
