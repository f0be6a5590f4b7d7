//! lspci - list PCI devices with names from pci.ids
//!
//! Reads /sys/bus/pci/devices and resolves vendor, device and class codes
//! through the PCI ID database.

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use hwls::cli::LspciCli;
use hwls::{commands, logging};
use hwls_common::HwlsConfig;

fn main() -> Result<ExitCode> {
    let cli = LspciCli::parse();
    logging::init();

    let config = HwlsConfig::load(cli.config.as_deref())?;
    let complete = commands::lspci::run(&cli, &config, &mut io::stdout().lock())?;

    Ok(if complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
