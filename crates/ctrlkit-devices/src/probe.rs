/*!
 * Device state probing.
 *
 * A best-effort health check: enumerate the devices of a subsystem, read a
 * state attribute from one of them and compare it with the value meaning
 * "operational". Failures never escape; they are logged and reported as
 * `false`.
 */
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ctrlkit_core::config::ProbeConfig;
use ctrlkit_core::logging::Logger;

/// A device exposing named string attributes
pub trait DeviceHandle {
    /// Device name within its subsystem
    fn name(&self) -> &str;

    /// Read a named attribute
    fn attribute(&self, name: &str) -> io::Result<String>;
}

/// An enumerable source of device handles
pub trait DeviceAttributeProvider {
    /// Handle type for enumerated devices
    type Handle: DeviceHandle;

    /// List the devices of a subsystem, in a stable order.
    ///
    /// An absent subsystem is not an error and yields an empty list.
    fn list_devices(&self, subsystem: &str) -> io::Result<Vec<Self::Handle>>;
}

/// Device attribute provider backed by the sysfs class hierarchy
#[derive(Debug, Clone)]
pub struct SysfsProvider {
    root: PathBuf,
}

/// A device directory under `<root>/<subsystem>/`
#[derive(Debug, Clone)]
pub struct SysfsDevice {
    name: String,
    path: PathBuf,
}

impl SysfsProvider {
    /// Provider rooted at `root`, normally `/sys/class`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Provider for the running system's `/sys/class`
    pub fn system() -> Self {
        Self::new(ProbeConfig::default().sysfs_root)
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(&config.sysfs_root)
    }

    /// Root of the class hierarchy
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DeviceAttributeProvider for SysfsProvider {
    type Handle = SysfsDevice;

    fn list_devices(&self, subsystem: &str) -> io::Result<Vec<SysfsDevice>> {
        let entries = match fs::read_dir(self.root.join(subsystem)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut devices = Vec::new();
        for entry in entries {
            let path = entry?.path();
            // Class entries are symlinks into /sys/devices; is_dir follows them
            if !path.is_dir() {
                continue;
            }
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            devices.push(SysfsDevice { name, path });
        }
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(devices)
    }
}

impl SysfsDevice {
    /// Directory holding the device attributes
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DeviceHandle for SysfsDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> io::Result<String> {
        Ok(fs::read_to_string(self.path.join(name))?.trim().to_string())
    }
}

/// Which subsystem, attribute and value define "operational"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProbe {
    subsystem: String,
    attribute: String,
    operating_value: String,
}

impl Default for DeviceProbe {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

impl DeviceProbe {
    /// Probe for `attribute == operating_value` on devices of `subsystem`
    pub fn new<S: Into<String>>(subsystem: S, attribute: S, operating_value: S) -> Self {
        Self {
            subsystem: subsystem.into(),
            attribute: attribute.into(),
            operating_value: operating_value.into(),
        }
    }

    /// Create a probe from configuration
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            subsystem: config.subsystem.clone(),
            attribute: config.attribute.clone(),
            operating_value: config.operating_value.clone(),
        }
    }

    /// Subsystem whose devices are enumerated
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Read the state attribute of device `index`.
    ///
    /// Returns `Ok(None)` when the subsystem has no devices.
    pub fn read_state<P>(&self, provider: &P, index: usize) -> io::Result<Option<String>>
    where
        P: DeviceAttributeProvider + ?Sized,
    {
        let devices = provider.list_devices(&self.subsystem)?;
        if devices.is_empty() {
            return Ok(None);
        }
        let device = devices.get(index).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "no device at index {} in subsystem '{}' ({} present)",
                    index,
                    self.subsystem,
                    devices.len()
                ),
            )
        })?;
        device.attribute(&self.attribute).map(Some)
    }

    /// Whether device `index` reports the operating value.
    ///
    /// Never fails: no devices, a missing index or an unreadable attribute all
    /// yield `false`, errors being reported to `log` when one is given.
    pub fn check<P>(&self, provider: &P, index: usize, log: Option<&dyn Logger>) -> bool
    where
        P: DeviceAttributeProvider + ?Sized,
    {
        match self.read_state(provider, index) {
            Ok(Some(state)) => {
                if let Some(log) = log {
                    log.trace(&format!("Device state ({}): {}", self.subsystem, state));
                }
                state == self.operating_value
            }
            Ok(None) => false,
            Err(e) => {
                if let Some(log) = log {
                    log.error(&format!("Error while checking device state: {}", e));
                }
                false
            }
        }
    }
}

/// Whether device `index` of the FPGA manager subsystem is operating
pub fn check_device_state<P>(provider: &P, index: usize, log: Option<&dyn Logger>) -> bool
where
    P: DeviceAttributeProvider + ?Sized,
{
    DeviceProbe::default().check(provider, index, log)
}

/// [`check_device_state`] against the running system's sysfs
pub fn check_fpga_state(index: usize, log: Option<&dyn Logger>) -> bool {
    check_device_state(&SysfsProvider::system(), index, log)
}
