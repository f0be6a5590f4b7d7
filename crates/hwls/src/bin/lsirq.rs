//! lsirq - display kernel interrupt counters

use std::io;

use anyhow::Result;
use clap::Parser;
use hwls::cli::LsirqCli;
use hwls::{commands, logging};
use hwls_common::HwlsConfig;

fn main() -> Result<()> {
    let cli = LsirqCli::parse();
    logging::init();

    let config = HwlsConfig::load(cli.config.as_deref())?;
    commands::lsirq::run(&cli, &config, &mut io::stdout().lock())
}
