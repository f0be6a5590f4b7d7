//! PCI assembly over fixture sysfs trees
//!
//! Each test builds a device tree shaped like /sys/bus/pci/devices in a
//! temporary directory and resolves names against tests/fixtures/pci.ids.

use std::fs;
use std::path::{Path, PathBuf};

use hwls_common::pci::{
    DeviceAssembler, IdDatabase, LookupKind, PciError, SysfsLayout,
};
use tempfile::TempDir;

struct Device<'a> {
    bus: &'a str,
    vendor: &'a str,
    device: &'a str,
    class: &'a str,
    subsystem_vendor: &'a str,
    subsystem_device: &'a str,
    revision: &'a str,
    irq: &'a str,
    uevent: &'a str,
}

const DEVICES: &[Device<'static>] = &[
    Device {
        bus: "0000:00:00.0",
        vendor: "0x1022",
        device: "0x1630",
        class: "0x060000",
        subsystem_vendor: "0x0000",
        subsystem_device: "0x0000",
        revision: "0x00",
        irq: "0",
        uevent: "PCI_CLASS=60000\nPCI_ID=1022:1630",
    },
    Device {
        bus: "0000:00:01.1",
        vendor: "0x1022",
        device: "0x1633",
        class: "0x060400",
        subsystem_vendor: "0x0000",
        subsystem_device: "0x0000",
        revision: "0x00",
        irq: "27",
        uevent: "DRIVER=pcieport\nPCI_CLASS=60400",
    },
    Device {
        bus: "0000:02:00.0",
        vendor: "0x10ec",
        device: "0x8168",
        class: "0x020000",
        subsystem_vendor: "0x10ec",
        subsystem_device: "0x8168",
        revision: "0x15",
        irq: "36",
        uevent: "DRIVER=r8169\nPCI_CLASS=20000",
    },
    Device {
        bus: "0000:02:00.4",
        vendor: "0x10ec",
        device: "0x816d",
        class: "0x088000",
        subsystem_vendor: "0x0000",
        subsystem_device: "0x0000",
        revision: "0x0e",
        irq: "255",
        uevent: "PCI_CLASS=88000",
    },
    Device {
        bus: "0000:05:00.3",
        vendor: "0x1022",
        device: "0x1639",
        class: "0x0c0330",
        subsystem_vendor: "0x17aa",
        subsystem_device: "0x5095",
        revision: "0x00",
        irq: "41",
        uevent: "DRIVER=xhci_hcd\nPCI_CLASS=C0330",
    },
];

fn fixture_ids() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("pci.ids")
}

fn modalias(dev: &Device<'_>) -> String {
    let hex = |s: &str| s.trim_start_matches("0x").to_uppercase();
    let class = hex(dev.class);
    format!(
        "pci:v0000{}d0000{}sv0000{}sd0000{}bc{}sc{}i{}",
        hex(dev.vendor),
        hex(dev.device),
        hex(dev.subsystem_vendor),
        hex(dev.subsystem_device),
        &class[0..2],
        &class[2..4],
        &class[4..6]
    )
}

fn write_tree(root: &Path, devices: &[Device<'_>]) {
    for dev in devices {
        let dir = root.join(dev.bus);
        fs::create_dir_all(&dir).unwrap();
        let attrs = [
            ("vendor", dev.vendor.to_string()),
            ("device", dev.device.to_string()),
            ("class", dev.class.to_string()),
            ("subsystem_vendor", dev.subsystem_vendor.to_string()),
            ("subsystem_device", dev.subsystem_device.to_string()),
            ("revision", dev.revision.to_string()),
            ("irq", dev.irq.to_string()),
            ("modalias", modalias(dev)),
            ("uevent", dev.uevent.to_string()),
        ];
        for (name, value) in attrs {
            fs::write(dir.join(name), format!("{}\n", value)).unwrap();
        }
    }
}

fn assembler(root: &Path) -> DeviceAssembler {
    let ids = IdDatabase::open(fixture_ids()).unwrap();
    DeviceAssembler::new(
        SysfsLayout::new(root, root.join("no-domain-tree")),
        Some(ids),
    )
}

#[test]
fn test_fixture_registry_lookups() {
    let ids = IdDatabase::open(fixture_ids()).unwrap();

    assert_eq!(
        ids.lookup_kind(LookupKind::Vendor, "1022", "", "", "").unwrap(),
        "Advanced Micro Devices, Inc. [AMD]"
    );
    assert_eq!(
        ids.lookup_kind(LookupKind::Device, "1022", "1630", "", "").unwrap(),
        "Renoir Root Complex"
    );
    assert_eq!(
        ids.lookup_kind(LookupKind::Class, "", "", "0c03", "").unwrap(),
        "USB controller"
    );
    // Subsystem entries are not tied to their parent device: the first
    // 17aa:5095 line in the file wins
    assert_eq!(
        ids.lookup_kind(LookupKind::Subsystem, "17aa", "", "", "5095").unwrap(),
        "Renoir [Radeon RX Vega 6 (Ryzen 4000/5000 Mobile Series)]"
    );
    assert_eq!(
        ids.lookup_kind(LookupKind::Device, "17aa", "1630", "", "").unwrap(),
        "Unknown device"
    );
}

#[test]
fn test_assemble_all_valid_devices() {
    let root = TempDir::new().unwrap();
    write_tree(root.path(), DEVICES);

    let assembly = assembler(root.path()).assemble().unwrap();
    assert!(assembly.is_complete());

    let (devices, error) = assembly.into_parts();
    assert!(error.is_none());
    assert_eq!(devices.len(), DEVICES.len());

    let smbus = devices.iter().find(|d| d.bus == "0000:02:00.4").unwrap();
    assert_eq!(smbus.vendor_id, "10ec");
    assert_eq!(smbus.device_id, "816d");
    assert_eq!(smbus.vendor_name, "Realtek Semiconductor Co., Ltd.");
    assert_eq!(smbus.device_name, "RTL811x EP Bridge (SMBus)");
    assert_eq!(smbus.device_class, "System peripheral");
    assert_eq!(smbus.revision, "0e");
    assert_eq!(smbus.subsystem, "");
    assert_eq!(smbus.kernel_driver, "");
}

#[test]
fn test_assembled_record_fields() {
    let root = TempDir::new().unwrap();
    write_tree(root.path(), DEVICES);

    let (devices, _) = assembler(root.path()).assemble().unwrap().into_parts();

    let nic = devices.iter().find(|d| d.bus == "0000:02:00.0").unwrap();
    assert_eq!(nic.class, "0200");
    assert_eq!(nic.device_class, "Ethernet controller");
    assert_eq!(
        nic.device_name,
        "RTL8111/8168/8211/8411 PCI Express Gigabit Ethernet Controller"
    );
    assert_eq!(nic.subsys_vendor, "10ec");
    assert_eq!(nic.subsys_device, "8168");
    assert_eq!(
        nic.subsystem,
        "RTL8111/8168 PCI Express Gigabit Ethernet controller"
    );
    assert_eq!(nic.irq, "36");
    assert_eq!(nic.revision, "15");
    assert_eq!(nic.kernel_driver, "r8169");
    assert_eq!(
        nic.kernel_module_alias,
        "pci:v000010ECd00008168sv000010ECsd00008168bc02sc00i00"
    );

    let host = devices.iter().find(|d| d.bus == "0000:00:00.0").unwrap();
    assert_eq!(host.device_class, "Host bridge");
    assert_eq!(host.vendor_name, "Advanced Micro Devices, Inc. [AMD]");
    assert_eq!(host.device_name, "Renoir Root Complex");

    assert_eq!(nic.subsys_vendor_name, "Realtek Semiconductor Co., Ltd.");

    // Subsystem from another vendor carries that vendor's name
    let xhci = devices.iter().find(|d| d.bus == "0000:05:00.3").unwrap();
    assert_eq!(xhci.vendor_name, "Advanced Micro Devices, Inc. [AMD]");
    assert_eq!(xhci.subsys_vendor, "17aa");
    assert_eq!(xhci.subsys_vendor_name, "Lenovo");

    let bridge = devices.iter().find(|d| d.bus == "0000:00:01.1").unwrap();
    assert_eq!(bridge.device_class, "PCI bridge");
    assert_eq!(bridge.kernel_driver, "pcieport");
}

#[test]
fn test_unreadable_device_is_skipped() {
    let root = TempDir::new().unwrap();
    write_tree(root.path(), DEVICES);
    fs::remove_file(root.path().join("0000:00:01.1").join("vendor")).unwrap();

    let assembly = assembler(root.path()).assemble().unwrap();
    assert!(!assembly.is_complete());

    let (devices, error) = assembly.into_parts();
    assert_eq!(devices.len(), DEVICES.len() - 1);
    assert!(devices.iter().all(|d| d.bus != "0000:00:01.1"));

    let error = error.expect("combined error");
    assert_eq!(error.buses().collect::<Vec<_>>(), vec!["0000:00:01.1"]);
    assert_eq!(error.failures[0].attribute, "vendor");
    assert!(matches!(error.failures[0].error, PciError::NotFound { .. }));
    assert!(error
        .to_string()
        .contains("failed to read vendor value from bus 0000:00:01.1"));
}

#[test]
fn test_several_failures_are_all_reported() {
    let root = TempDir::new().unwrap();
    write_tree(root.path(), DEVICES);
    fs::remove_file(root.path().join("0000:00:00.0").join("class")).unwrap();
    fs::write(root.path().join("0000:05:00.3").join("revision"), "0\n").unwrap();

    let (devices, error) = assembler(root.path()).assemble().unwrap().into_parts();
    assert_eq!(devices.len(), DEVICES.len() - 2);

    let error = error.expect("combined error");
    let failures: Vec<(&str, &str)> = error
        .failures
        .iter()
        .map(|f| (f.bus.as_str(), f.attribute.as_str()))
        .collect();
    assert_eq!(
        failures,
        vec![("0000:00:00.0", "class"), ("0000:05:00.3", "revision")]
    );
    assert!(matches!(
        error.failures[1].error,
        PciError::InvalidRange { .. }
    ));
}

#[test]
fn test_database_read_failure_keeps_every_device() {
    let root = TempDir::new().unwrap();
    let devices_root = root.path().join("bus");
    write_tree(&devices_root, DEVICES);

    // Opening a directory succeeds, reading it does not
    let ids = IdDatabase::open(root.path()).unwrap();
    let assembler = DeviceAssembler::new(
        SysfsLayout::new(&devices_root, root.path().join("no-domain-tree")),
        Some(ids),
    );

    let assembly = assembler.assemble().unwrap();
    assert!(!assembly.is_complete());

    let (devices, error) = assembly.into_parts();
    assert_eq!(devices.len(), DEVICES.len());
    for (device, fixture) in devices.iter().zip(DEVICES) {
        assert_eq!(device.bus, fixture.bus);
        assert_eq!(device.vendor_id, fixture.vendor.trim_start_matches("0x"));
        assert_eq!(device.vendor_name, "Unknown vendor");
        assert_eq!(device.device_name, "Unknown device");
        assert_eq!(device.device_class, "Unknown class");
    }

    let error = error.expect("combined error");
    assert!(error
        .failures
        .iter()
        .all(|f| matches!(f.error, PciError::Lookup { .. })));
    assert!(error
        .to_string()
        .contains("failed to read vendor name value from bus 0000:00:00.0"));
}

#[test]
fn test_assembly_is_repeatable() {
    let root = TempDir::new().unwrap();
    write_tree(root.path(), DEVICES);
    let assembler = assembler(root.path());

    let (first, _) = assembler.assemble().unwrap().into_parts();
    let (second, _) = assembler.assemble().unwrap().into_parts();
    assert_eq!(first, second);
}

#[test]
fn test_driver_from_domain_tree() {
    let root = TempDir::new().unwrap();
    let devices_root = root.path().join("bus");
    let driver_root = root.path().join("devices");
    write_tree(&devices_root, &DEVICES[..1]);

    let domain = driver_root.join("pci0000:00").join("0000:00:00.0");
    fs::create_dir_all(&domain).unwrap();
    fs::write(domain.join("uevent"), "DRIVER=amd_root\n").unwrap();

    let assembler = DeviceAssembler::new(
        SysfsLayout::new(&devices_root, &driver_root),
        Some(IdDatabase::open(fixture_ids()).unwrap()),
    );
    let (devices, error) = assembler.assemble().unwrap().into_parts();
    assert!(error.is_none());
    assert_eq!(devices[0].kernel_driver, "amd_root");
}

#[test]
fn test_missing_root_is_fatal() {
    let root = TempDir::new().unwrap();
    let err = assembler(&root.path().join("missing"))
        .assemble()
        .unwrap_err();
    assert!(matches!(err, PciError::Walk { .. }));
}
