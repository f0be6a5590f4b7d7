//! Error types for the PCI pipeline.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PciError {
    #[error("{} not found", path.display())]
    NotFound { path: PathBuf },

    #[error("permission denied reading {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("invalid range {start}:{end} for value of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to scan ID database {}: {source}", path.display())]
    Lookup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("class code must have 4 hex digits, got {class:?}")]
    InvalidClassCode { class: String },
}

impl PciError {
    /// Map an open/read failure onto the typed variants.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PciError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::PermissionDenied => PciError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => PciError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PciError::NotFound { .. })
    }
}

/// One bus address that could not be assembled.
#[derive(Debug)]
pub struct DeviceFailure {
    pub bus: String,
    /// Attribute or step that failed (e.g. "vendor", "uevent", "vendor name")
    pub attribute: String,
    pub error: PciError,
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to read {} value from bus {}: {}",
            self.attribute, self.bus, self.error
        )
    }
}

/// Every per-device failure of one assembly run.
#[derive(Debug)]
pub struct AssemblyError {
    pub failures: Vec<DeviceFailure>,
}

impl AssemblyError {
    pub fn buses(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.bus.as_str())
    }
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AssemblyError {}
