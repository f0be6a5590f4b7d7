//! lspci command

use std::io::Write;

use anyhow::{Context, Result};
use hwls_common::modalias::AliasIndex;
use hwls_common::pci::{DeviceAssembler, IdDatabase};
use hwls_common::HwlsConfig;
use tracing::{debug, warn};

use crate::cli::LspciCli;
use crate::output::pci::{render_json, render_table, NameMode};

/// List PCI devices to `out`.
///
/// Returns `false` when some devices could not be read; the readable ones
/// are still printed.
pub fn run(cli: &LspciCli, config: &HwlsConfig, out: &mut dyn Write) -> Result<bool> {
    let mut options = cli.table_options(config.output.domain_numbers);

    let ids = match IdDatabase::locate(&config.paths.pci_ids_candidates()) {
        Ok(ids) => Some(ids),
        Err(e) => {
            if !cli.json && options.names != NameMode::Numeric {
                warn!("Cannot open pci.ids file ({}), defaulting to numeric", e);
            }
            options.names = NameMode::Numeric;
            None
        }
    };

    let mut assembler = DeviceAssembler::new(config.paths.sysfs_layout(), ids);
    if cli.json || cli.wants_kernel_info() {
        if let Some(aliases) = load_aliases(config) {
            assembler = assembler.with_aliases(aliases);
        }
    }

    let assembly = assembler.assemble().with_context(|| {
        format!(
            "Failed to enumerate PCI devices in {}",
            config.paths.pci_devices.display()
        )
    })?;
    // Each failure was already logged by the assembler
    let complete = assembly.is_complete();
    let devices = assembly.devices;

    let rendered = if cli.json {
        let mut json = render_json(&devices).context("Failed to serialize PCI devices")?;
        json.push('\n');
        json
    } else {
        render_table(&devices, &options)
    };
    out.write_all(rendered.as_bytes())
        .context("Failed to write output")?;

    Ok(complete)
}

fn load_aliases(config: &HwlsConfig) -> Option<AliasIndex> {
    let path = config.paths.modules_alias_path()?;
    match AliasIndex::load(&path) {
        Ok(index) => Some(index),
        Err(e) => {
            debug!("Kernel modules unavailable, {}: {}", path.display(), e);
            None
        }
    }
}
