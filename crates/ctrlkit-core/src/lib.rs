/*!
 * ctrlkit Core
 *
 * This crate provides the coordination primitives used by ctrlkit: a
 * timeout-bounded poller, a scoped lock guard, compat number negotiation,
 * string normalization helpers, configuration and logging.
 */

#![warn(missing_docs)]

pub mod codec;
pub mod compat;
pub mod config;
pub mod error;
pub mod lock;
pub mod logging;
pub mod poll;
pub mod prelude;
pub mod types;

/// Re-export of dependencies that are part of the public API
pub mod deps {
    pub use anyhow;
    pub use serde;
    pub use tokio;
    pub use tracing;
}

/// ctrlkit core crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library initialization
pub fn init() -> Result<(), error::Error> {
    logging::init()?;
    tracing::info!("ctrlkit Core {} initialized", VERSION);
    Ok(())
}
