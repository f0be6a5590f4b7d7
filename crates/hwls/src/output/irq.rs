//! lsirq renderings

use hwls_common::irq::Interrupt;
use serde::Serialize;

/// `IRQ TOTAL NAME` columns, optionally without the heading
pub fn render_table(interrupts: &[Interrupt], headings: bool) -> String {
    let mut out = String::new();
    if headings && !interrupts.is_empty() {
        out.push_str(&format!("{:>3} {:>8} {}\n", "IRQ", "TOTAL", "NAME"));
    }
    for interrupt in interrupts {
        out.push_str(&format!(
            "{:>3} {:>8} {}\n",
            interrupt.irq, interrupt.total, interrupt.name
        ));
    }
    out
}

/// `IRQ="0" TOTAL="44" NAME="IO-APIC 2-edge timer"` lines
pub fn render_pairs(interrupts: &[Interrupt]) -> String {
    interrupts
        .iter()
        .map(|i| {
            format!(
                "IRQ=\"{}\" TOTAL=\"{}\" NAME=\"{}\"\n",
                i.irq, i.total, i.name
            )
        })
        .collect()
}

#[derive(Serialize)]
struct IrqDocument<'a> {
    interrupts: &'a [Interrupt],
}

/// `{"interrupts": [...]}`, tab indented
pub fn render_json(interrupts: &[Interrupt]) -> serde_json::Result<String> {
    super::to_json_indented(&IrqDocument { interrupts }, b"\t")
}
