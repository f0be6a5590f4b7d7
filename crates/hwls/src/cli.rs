//! Command line definitions for lspci and lsirq

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::output::pci::{NameMode, TableOptions};

// Version is embedded at build time
pub const VERSION: &str = env!("HWLS_VERSION");

#[derive(Parser, Debug, Default)]
#[command(name = "lspci")]
#[command(
    about = "lspci lists detailed information about all PCI buses and devices in the system",
    long_about = None
)]
#[command(version = VERSION)]
pub struct LspciCli {
    /// Use JSON output format
    #[arg(short, long)]
    pub json: bool,

    /// Show numeric IDs (-nn shows both names and numbers)
    #[arg(short = 'n', long = "numeric", action = ArgAction::Count)]
    pub numeric: u8,

    /// Show both textual and numeric IDs (names & numbers)
    #[arg(long = "numtext", visible_alias = "nn")]
    pub numtext: bool,

    /// Always show domain numbers
    #[arg(short = 'D', long = "domainshow")]
    pub domain_numbers: bool,

    /// Show kernel drivers handling each device
    #[arg(short = 'k', long = "kerneldrivers")]
    pub kernel_drivers: bool,

    /// Be verbose (-vv for very verbose)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Be very verbose
    #[arg(long = "veryverbose", visible_alias = "vv")]
    pub very_verbose: bool,

    /// Read configuration from this file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl LspciCli {
    pub fn name_mode(&self) -> NameMode {
        if self.numtext || self.numeric >= 2 {
            NameMode::Both
        } else if self.numeric == 1 {
            NameMode::Numeric
        } else {
            NameMode::Text
        }
    }

    pub fn verbosity(&self) -> u8 {
        if self.very_verbose {
            2
        } else {
            self.verbose.min(2)
        }
    }

    /// Whether driver and module details are displayed at all
    pub fn wants_kernel_info(&self) -> bool {
        self.kernel_drivers || self.verbosity() > 0
    }

    pub fn table_options(&self, domain_numbers: bool) -> TableOptions {
        TableOptions {
            names: self.name_mode(),
            domain_numbers: self.domain_numbers || domain_numbers,
            verbosity: self.verbosity(),
            kernel_drivers: self.kernel_drivers,
        }
    }
}

#[derive(Parser, Debug, Default)]
#[command(name = "lsirq")]
#[command(about = "Utility to display kernel interrupt information.", long_about = None)]
#[command(version = VERSION)]
pub struct LsirqCli {
    /// Don't print headings
    #[arg(short, long = "noheadings")]
    pub noheadings: bool,

    /// Use key="value" output format
    #[arg(short, long)]
    pub pairs: bool,

    /// Use JSON output format
    #[arg(short, long)]
    pub json: bool,

    /// Read configuration from this file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
