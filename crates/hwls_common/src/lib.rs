//! hwls common - hardware inventory from sysfs and procfs
//!
//! - [`pci`]: PCI devices with names resolved through pci.ids
//! - [`irq`]: interrupt counters from /proc/interrupts
//! - [`modalias`]: kernel modules able to drive a device
//! - [`config`]: file and environment configuration

pub mod config;
pub mod irq;
pub mod modalias;
pub mod pci;

pub use config::HwlsConfig;
pub use irq::Interrupt;
pub use pci::{Assembly, DeviceAssembler, IdDatabase, PciDevice, PciError};
