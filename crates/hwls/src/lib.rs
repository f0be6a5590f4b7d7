//! hwls - lspci and lsirq front-ends
//!
//! The binaries are thin wrappers around [`commands`]; everything they
//! print is produced by [`output`].

pub mod cli;
pub mod commands;
pub mod logging;
pub mod output;
