//! Command implementations shared by the binaries

pub mod lsirq;
pub mod lspci;
