//! Device record assembly
//!
//! Reads the sysfs attributes of every enumerated bus address, resolves
//! the codes through the ID database and builds one [`PciDevice`] per
//! address. A device whose attributes cannot be read is dropped and its
//! failure recorded; the remaining devices are still assembled. A failed
//! name lookup keeps the device with the `"Unknown <kind>"` name.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::attribute::AttributeSpec;
use super::enumerate::enumerate_devices;
use super::error::{AssemblyError, DeviceFailure, PciError};
use super::ids::{IdDatabase, Lookup};
use crate::modalias::AliasIndex;

pub const PATH_SYS_BUS_PCI_DEVICES: &str = "/sys/bus/pci/devices";
pub const PATH_SYS_DEVICES: &str = "/sys/devices";

/// Subsystem vendor of devices without subsystem information
pub const NO_SUBSYSTEM_VENDOR: &str = "0000";

/// One enumerated PCI function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciDevice {
    /// Bus address (e.g., "0000:02:00.4")
    #[serde(rename = "Bus")]
    pub bus: String,
    #[serde(rename = "VendorID")]
    pub vendor_id: String,
    #[serde(rename = "DeviceID")]
    pub device_id: String,
    /// Base class + subclass (e.g., "0604")
    #[serde(rename = "Class")]
    pub class: String,
    #[serde(rename = "SubsysVendor")]
    pub subsys_vendor: String,
    #[serde(rename = "SubsysDevice")]
    pub subsys_device: String,
    #[serde(rename = "Irq")]
    pub irq: String,
    #[serde(rename = "Revision")]
    pub revision: String,
    #[serde(rename = "VendorName")]
    pub vendor_name: String,
    #[serde(rename = "DeviceName")]
    pub device_name: String,
    #[serde(rename = "DeviceClass")]
    pub device_class: String,
    /// Empty when the device reports no subsystem vendor
    #[serde(rename = "Subsystem")]
    pub subsystem: String,
    /// Name of `subsys_vendor`, empty with the subsystem
    #[serde(skip)]
    pub subsys_vendor_name: String,
    /// Modules able to drive the device, comma separated
    #[serde(rename = "KernelModule")]
    pub kernel_module: String,
    #[serde(rename = "KernelModuleAlias")]
    pub kernel_module_alias: String,
    /// Driver currently bound, empty if none
    #[serde(rename = "KernelDriver")]
    pub kernel_driver: String,
}

impl PciDevice {
    /// Bus address without the `0000:` domain
    pub fn short_bus(&self) -> &str {
        self.bus.strip_prefix("0000:").unwrap_or(&self.bus)
    }
}

/// Sysfs locations read by the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsLayout {
    /// Directory of per-device entries (`/sys/bus/pci/devices`)
    pub devices_root: PathBuf,
    /// Parent of the `pci<domain:bus>` trees (`/sys/devices`)
    pub driver_root: PathBuf,
}

impl Default for SysfsLayout {
    fn default() -> Self {
        Self {
            devices_root: PathBuf::from(PATH_SYS_BUS_PCI_DEVICES),
            driver_root: PathBuf::from(PATH_SYS_DEVICES),
        }
    }
}

impl SysfsLayout {
    pub fn new(devices_root: impl Into<PathBuf>, driver_root: impl Into<PathBuf>) -> Self {
        Self {
            devices_root: devices_root.into(),
            driver_root: driver_root.into(),
        }
    }

    pub fn attribute_path(&self, bus: &str, attribute: &str) -> PathBuf {
        self.devices_root.join(bus).join(attribute)
    }

    /// `uevent` of `bus`: `<driver_root>/pci<bus[0..7]>/<bus>/uevent` when
    /// present, the device entry's own `uevent` otherwise.
    pub fn uevent_path(&self, bus: &str) -> PathBuf {
        if let Some(domain) = bus.get(0..7) {
            let path = self
                .driver_root
                .join(format!("pci{}", domain))
                .join(bus)
                .join("uevent");
            if path.exists() {
                return path;
            }
        }
        self.attribute_path(bus, "uevent")
    }
}

/// Result of one assembly run
#[derive(Debug, Default)]
pub struct Assembly {
    pub devices: Vec<PciDevice>,
    pub failures: Vec<DeviceFailure>,
}

impl Assembly {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Split into the usable records and, if any device failed, the
    /// combined error.
    pub fn into_parts(self) -> (Vec<PciDevice>, Option<AssemblyError>) {
        let error = if self.failures.is_empty() {
            None
        } else {
            Some(AssemblyError {
                failures: self.failures,
            })
        };
        (self.devices, error)
    }
}

/// Builds [`PciDevice`] records from sysfs
#[derive(Debug, Clone, Default)]
pub struct DeviceAssembler {
    layout: SysfsLayout,
    ids: Option<IdDatabase>,
    aliases: Option<AliasIndex>,
}

impl DeviceAssembler {
    /// Without an ID database every name resolves to `"Unknown <kind>"`.
    pub fn new(layout: SysfsLayout, ids: Option<IdDatabase>) -> Self {
        Self {
            layout,
            ids,
            aliases: None,
        }
    }

    pub fn with_aliases(mut self, aliases: AliasIndex) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn layout(&self) -> &SysfsLayout {
        &self.layout
    }

    /// Assemble every device under the devices root.
    ///
    /// Fails only if the root itself cannot be walked.
    pub fn assemble(&self) -> Result<Assembly, PciError> {
        let mut assembly = Assembly::default();

        for bus in enumerate_devices(&self.layout.devices_root)? {
            self.assemble_device(&bus, &mut assembly);
        }

        debug!(
            "Assembled {} PCI devices ({} failures)",
            assembly.devices.len(),
            assembly.failures.len()
        );
        Ok(assembly)
    }

    /// Add the record of `bus` to `assembly`.
    ///
    /// An unreadable attribute drops the device. A failed name lookup keeps
    /// it with the sentinel name. Either way the failure is recorded.
    pub fn assemble_device(&self, bus: &str, assembly: &mut Assembly) {
        let mut failures = Vec::new();
        match self.read_device(bus, &mut failures) {
            Ok(device) => assembly.devices.push(device),
            Err(failure) => failures.push(failure),
        }
        for failure in &failures {
            warn!("{}", failure);
        }
        assembly.failures.extend(failures);
    }

    fn read_device(
        &self,
        bus: &str,
        lookup_failures: &mut Vec<DeviceFailure>,
    ) -> Result<PciDevice, DeviceFailure> {
        let fail = |attribute: &str| {
            let bus = bus.to_string();
            let attribute = attribute.to_string();
            move |error: PciError| DeviceFailure {
                bus,
                attribute,
                error,
            }
        };
        let read = |attribute: &str, spec: AttributeSpec| {
            spec.read(&self.layout.attribute_path(bus, attribute))
                .map_err(fail(attribute))
        };

        let device_id = read("device", AttributeSpec::HEX16)?;
        let vendor_id = read("vendor", AttributeSpec::HEX16)?;
        let class = read("class", AttributeSpec::HEX16)?;
        let subsys_device = read("subsystem_device", AttributeSpec::HEX16)?;
        let subsys_vendor = read("subsystem_vendor", AttributeSpec::HEX16)?;
        let kernel_module_alias = read("modalias", AttributeSpec::RAW)?;
        let irq = read("irq", AttributeSpec::RAW)?;
        let revision = read("revision", AttributeSpec::HEX8)?;

        let kernel_driver = kernel_driver(&self.layout.uevent_path(bus)).map_err(fail("uevent"))?;

        let mut resolve = |attribute: &str, query: Lookup<'_>| -> String {
            let Some(ids) = &self.ids else {
                return query.kind().unknown();
            };
            match ids.lookup(query) {
                Ok(name) => name,
                Err(error) => {
                    lookup_failures.push(fail(attribute)(error));
                    query.kind().unknown()
                }
            }
        };

        let vendor_name = resolve("vendor name", Lookup::Vendor { vendor: &vendor_id });
        let device_name = resolve(
            "device name",
            Lookup::Device {
                vendor: &vendor_id,
                device: &device_id,
            },
        );
        let device_class = resolve("class name", Lookup::Class { class: &class });
        let (subsystem, subsys_vendor_name) = if subsys_vendor == NO_SUBSYSTEM_VENDOR {
            (String::new(), String::new())
        } else {
            let subsystem = resolve(
                "subsystem name",
                Lookup::Subsystem {
                    vendor: &subsys_vendor,
                    device: &subsys_device,
                },
            );
            let subsys_vendor_name = if subsys_vendor == vendor_id {
                vendor_name.clone()
            } else {
                resolve(
                    "subsystem vendor name",
                    Lookup::Vendor {
                        vendor: &subsys_vendor,
                    },
                )
            };
            (subsystem, subsys_vendor_name)
        };

        let kernel_module = self
            .aliases
            .as_ref()
            .map(|aliases| aliases.modules_for(&kernel_module_alias).join(", "))
            .unwrap_or_default();

        debug!("Assembled {} [{}:{}]", bus, vendor_id, device_id);

        Ok(PciDevice {
            bus: bus.to_string(),
            vendor_id,
            device_id,
            class,
            subsys_vendor,
            subsys_device,
            irq,
            revision,
            vendor_name,
            device_name,
            device_class,
            subsystem,
            subsys_vendor_name,
            kernel_module,
            kernel_module_alias,
            kernel_driver,
        })
    }
}

/// Driver name from the first `uevent` token, empty when unbound
fn kernel_driver(uevent: &Path) -> Result<String, PciError> {
    let first = AttributeSpec::RAW.read(uevent)?;
    Ok(first
        .strip_prefix("DRIVER=")
        .map(str::to_string)
        .unwrap_or_default())
}
