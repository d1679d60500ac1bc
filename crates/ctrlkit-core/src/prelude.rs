/*!
 * Prelude module for ctrlkit Core.
 *
 * This module re-exports commonly used types and functions from the ctrlkit
 * core crate to make them easier to import.
 */

// Re-export error types
pub use crate::error::{Error, Result};

// Re-export core types
pub use crate::types::Value;

// Re-export config types
pub use crate::config::{Config, ConfigBuilder, SharedConfig};

// Re-export coordination primitives
pub use crate::compat::{check_compat, CompatCheck, CompatNumber, Compatibility};
pub use crate::lock::{lock_guard, with_lock, BlockingLock, LockGuard, Lockable};
pub use crate::poll::{poll_with_timeout, poll_with_timeout_async, try_poll_with_timeout, Poller};

// Re-export string helpers
pub use crate::codec::{str2bool, to_binary_str, to_native_str, to_utf8_str};

// Re-export logging
pub use crate::logging::{Logger, TracingLogger};
pub use tracing::{debug, error, info, trace, warn};

// Re-export core initialization
pub use crate::init;
