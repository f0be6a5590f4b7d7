//! lspci renderings

use hwls_common::pci::PciDevice;
use serde::Serialize;

/// How device names are shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameMode {
    /// `Class: Vendor Device`
    #[default]
    Text,
    /// `0604: 1022:1633`
    Numeric,
    /// Names followed by bracketed codes
    Both,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableOptions {
    pub names: NameMode,
    /// Keep the `0000:` domain on bus addresses
    pub domain_numbers: bool,
    /// 0 = one line per device, 1 = subsystem and driver, 2 = also IRQ
    pub verbosity: u8,
    pub kernel_drivers: bool,
}

fn bracket(s: &str) -> String {
    format!("[{}]", s)
}

/// Headline text of one device
pub fn describe(device: &PciDevice, names: NameMode) -> String {
    let mut line = match names {
        NameMode::Text => format!(
            "{}: {} {}",
            device.device_class, device.vendor_name, device.device_name
        ),
        NameMode::Numeric => format!(
            "{}: {}:{}",
            device.class, device.vendor_id, device.device_id
        ),
        NameMode::Both => format!(
            "{} {}: {} {} {}",
            device.device_class,
            bracket(&device.class),
            device.vendor_name,
            device.device_name,
            bracket(&format!("{}:{}", device.vendor_id, device.device_id))
        ),
    };

    if device.revision != "00" {
        line.push_str(&format!(" (rev {})", device.revision));
    }
    line
}

/// Indented detail lines shown below the headline
fn details(device: &PciDevice, options: &TableOptions) -> Vec<String> {
    let mut lines = Vec::new();

    if options.verbosity >= 1 && !device.subsystem.is_empty() {
        let vendor = if device.subsys_vendor_name.is_empty() {
            &device.vendor_name
        } else {
            &device.subsys_vendor_name
        };
        lines.push(format!("Subsystem: {} {}", vendor, device.subsystem));
    }
    if options.verbosity >= 2 && device.irq != "0" {
        lines.push(format!("Interrupt: pin A routed to IRQ {}", device.irq));
    }
    if options.kernel_drivers || options.verbosity >= 1 {
        if !device.kernel_driver.is_empty() {
            lines.push(format!("Kernel driver in use: {}", device.kernel_driver));
        }
        if !device.kernel_module.is_empty() {
            lines.push(format!("Kernel modules: {}", device.kernel_module));
        }
    }

    lines
}

/// Aligned two-column listing, bus address first
pub fn render_table(devices: &[PciDevice], options: &TableOptions) -> String {
    let bus = |d: &PciDevice| -> String {
        if options.domain_numbers {
            d.bus.clone()
        } else {
            d.short_bus().to_string()
        }
    };
    let width = devices.iter().map(|d| bus(d).len()).max().unwrap_or(0);

    let mut out = String::new();
    for device in devices {
        out.push_str(&format!(
            "{:<width$} {}\n",
            bus(device),
            describe(device, options.names),
            width = width
        ));
        for detail in details(device, options) {
            out.push_str(&format!("{:<width$} {}\n", "", detail, width = width));
        }
    }
    out
}

#[derive(Serialize)]
struct PciDocument<'a> {
    pcidevices: &'a [PciDevice],
}

/// `{"pcidevices": [...]}` with four-space indentation
pub fn render_json(devices: &[PciDevice]) -> serde_json::Result<String> {
    super::to_json_indented(&PciDocument { pcidevices: devices }, b"    ")
}
