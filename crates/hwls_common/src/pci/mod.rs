//! PCI device inventory
//!
//! Sources:
//! - /sys/bus/pci/devices/*/{vendor,device,class,...} - raw codes
//! - /sys/devices/pci<domain:bus>/*/uevent - bound driver
//! - pci.ids - vendor, device, class and subsystem names

pub mod assemble;
pub mod attribute;
pub mod enumerate;
pub mod error;
pub mod ids;

pub use assemble::*;
pub use attribute::{read_attribute, AttributeSpec};
pub use enumerate::enumerate_devices;
pub use error::*;
pub use ids::*;
