//! lsirq command

use std::io::Write;

use anyhow::{Context, Result};
use hwls_common::irq::read_interrupts;
use hwls_common::HwlsConfig;

use crate::cli::LsirqCli;
use crate::output::irq::{render_json, render_pairs, render_table};

/// Print the interrupt table, busiest first
pub fn run(cli: &LsirqCli, config: &HwlsConfig, out: &mut dyn Write) -> Result<()> {
    let interrupts = read_interrupts(&config.paths.proc_interrupts)?;

    let rendered = if cli.json {
        let mut json = render_json(&interrupts).context("Failed to serialize interrupts")?;
        json.push('\n');
        json
    } else if cli.pairs {
        render_pairs(&interrupts)
    } else {
        render_table(&interrupts, !cli.noheadings)
    };

    out.write_all(rendered.as_bytes())
        .context("Failed to write output")
}
