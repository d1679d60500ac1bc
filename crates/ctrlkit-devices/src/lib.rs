/*!
 * ctrlkit Devices
 *
 * This crate bridges synchronous callers to device backends: fire-and-poll
 * command execution against async-capable targets, and best-effort device
 * state probing through an attribute provider such as sysfs.
 */

#![warn(missing_docs)]

// Re-export core types
pub use ctrlkit_core::prelude;

pub mod command;
pub mod probe;

pub use command::{exec_async, AsyncCapable, CancelFlag, CommandExecutor, ExecError};
pub use probe::{
    check_device_state, check_fpga_state, DeviceAttributeProvider, DeviceHandle, DeviceProbe,
    SysfsDevice, SysfsProvider,
};

/// ctrlkit devices crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the device layer
pub fn init() -> Result<(), ctrlkit_core::error::Error> {
    tracing::info!("ctrlkit Devices {} initialized", VERSION);
    Ok(())
}
