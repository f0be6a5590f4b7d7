//! Bus address enumeration
//!
//! `/sys/bus/pci/devices` holds one symlink per device, named by bus
//! address (e.g. `0000:02:00.4`). Fixture trees use plain directories.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use super::error::PciError;

/// List the bus addresses under `root`, sorted by name.
///
/// Only the first level is visited and links are not followed. Plain
/// files at that level are not devices and are skipped.
pub fn enumerate_devices(root: &Path) -> Result<Vec<String>, PciError> {
    let mut devices = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| PciError::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        let file_type = entry.file_type();
        if !(file_type.is_dir() || file_type.is_symlink()) {
            continue;
        }

        devices.push(entry.file_name().to_string_lossy().to_string());
    }

    debug!("Found {} PCI devices under {}", devices.len(), root.display());
    Ok(devices)
}
