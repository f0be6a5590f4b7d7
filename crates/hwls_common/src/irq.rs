//! Interrupt counters from /proc/interrupts
//!
//! The first line names the online CPUs; every following line is an IRQ
//! label, one counter per CPU, then a free-form description:
//!
//! ```text
//!            CPU0       CPU1
//!   0:         44          0   IO-APIC   2-edge      timer
//! NMI:          0          0   Non-maskable interrupts
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const PATH_PROC_INTERRUPTS: &str = "/proc/interrupts";

#[derive(Error, Debug)]
pub enum IrqError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Totals for one interrupt line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interrupt {
    #[serde(rename = "Irq")]
    pub irq: String,
    /// Sum over all CPUs
    #[serde(rename = "Total")]
    pub total: u64,
    #[serde(rename = "Name")]
    pub name: String,
}

/// Read and parse an interrupts table, busiest first
pub fn read_interrupts(path: &Path) -> Result<Vec<Interrupt>, IrqError> {
    let contents = fs::read_to_string(path).map_err(|source| IrqError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let interrupts = parse_interrupts(&contents);
    debug!("Parsed {} interrupt lines from {}", interrupts.len(), path.display());
    Ok(interrupts)
}

pub fn parse_interrupts(contents: &str) -> Vec<Interrupt> {
    let mut lines = contents.lines();
    let cpus = match lines.next() {
        Some(header) => header.matches("CPU").count(),
        None => return Vec::new(),
    };

    let mut interrupts: Vec<Interrupt> = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_line(line, cpus))
        .collect();

    // Stable: equal totals keep table order
    interrupts.sort_by(|a, b| b.total.cmp(&a.total));
    interrupts
}

fn parse_line(line: &str, cpus: usize) -> Interrupt {
    let mut words = line.split_whitespace();
    let irq = words.next().unwrap_or_default().replace(':', "");

    // Lines like ERR/MIS carry a single counter, so stop at the first
    // non-numeric word
    let mut total = 0u64;
    let mut name: Vec<&str> = Vec::new();
    for (i, word) in words.enumerate() {
        if i < cpus && name.is_empty() {
            if let Ok(n) = word.parse::<u64>() {
                total += n;
                continue;
            }
        }
        name.push(word);
    }

    Interrupt {
        irq,
        total,
        name: name.join(" "),
    }
}
