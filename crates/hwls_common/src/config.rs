//! hwls configuration
//!
//! Config file: ~/.config/hwls/config.toml or /etc/hwls/config.toml
//!
//! ```toml
//! [paths]
//! pci_devices = "/sys/bus/pci/devices"
//! pci_ids = "/usr/share/hwdata/pci.ids"
//!
//! [output]
//! domain_numbers = true
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::irq::PATH_PROC_INTERRUPTS;
use crate::modalias;
use crate::pci::{SysfsLayout, PATH_SYS_BUS_PCI_DEVICES, PATH_SYS_DEVICES, PCI_IDS_CANDIDATES};

/// Explicit config file
pub const ENV_CONFIG: &str = "HWLS_CONFIG";
/// Explicit pci.ids location
pub const ENV_PCI_IDS: &str = "HWLS_PCI_IDS";
/// Prefix for the sysfs roots (e.g. a captured sysfs snapshot)
pub const ENV_SYSFS_ROOT: &str = "HWLS_SYSFS_ROOT";

/// Input locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_pci_devices")]
    pub pci_devices: PathBuf,

    #[serde(default = "default_pci_driver_root")]
    pub pci_driver_root: PathBuf,

    /// pci.ids file; the usual system locations are searched when unset
    #[serde(default)]
    pub pci_ids: Option<PathBuf>,

    /// modules.alias; the running kernel's file is used when unset
    #[serde(default)]
    pub modules_alias: Option<PathBuf>,

    #[serde(default = "default_proc_interrupts")]
    pub proc_interrupts: PathBuf,
}

fn default_pci_devices() -> PathBuf {
    PathBuf::from(PATH_SYS_BUS_PCI_DEVICES)
}

fn default_pci_driver_root() -> PathBuf {
    PathBuf::from(PATH_SYS_DEVICES)
}

fn default_proc_interrupts() -> PathBuf {
    PathBuf::from(PATH_PROC_INTERRUPTS)
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pci_devices: default_pci_devices(),
            pci_driver_root: default_pci_driver_root(),
            pci_ids: None,
            modules_alias: None,
            proc_interrupts: default_proc_interrupts(),
        }
    }
}

impl PathsConfig {
    pub fn sysfs_layout(&self) -> SysfsLayout {
        SysfsLayout::new(&self.pci_devices, &self.pci_driver_root)
    }

    /// pci.ids locations to try, in order
    pub fn pci_ids_candidates(&self) -> Vec<PathBuf> {
        match &self.pci_ids {
            Some(path) => vec![path.clone()],
            None => PCI_IDS_CANDIDATES.iter().map(PathBuf::from).collect(),
        }
    }

    pub fn modules_alias_path(&self) -> Option<PathBuf> {
        self.modules_alias
            .clone()
            .or_else(modalias::default_alias_path)
    }

    /// Re-root both sysfs paths under `root`
    pub fn rebase_sysfs(&mut self, root: &Path) {
        for path in [&mut self.pci_devices, &mut self.pci_driver_root] {
            let relative = path
                .strip_prefix("/")
                .unwrap_or(path.as_path())
                .to_path_buf();
            *path = root.join(relative);
        }
    }
}

/// Output preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Always show the PCI domain (`0000:`) in bus addresses
    #[serde(default)]
    pub domain_numbers: bool,
}

/// Main hwls configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwlsConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl HwlsConfig {
    /// Get default user config path: ~/.config/hwls/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hwls").join("config.toml"))
    }

    /// Get system config path: /etc/hwls/config.toml
    pub fn system_config_path() -> PathBuf {
        PathBuf::from("/etc/hwls/config.toml")
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. `explicit` (command line)
    /// 2. $HWLS_CONFIG
    /// 3. User config (~/.config/hwls/config.toml)
    /// 4. System config (/etc/hwls/config.toml)
    /// 5. Defaults
    ///
    /// Environment overrides are applied on top.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::find(explicit) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn find(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(path) = std::env::var(ENV_CONFIG) {
            return Some(PathBuf::from(path));
        }
        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Some(user_path);
            }
        }
        let system_path = Self::system_config_path();
        if system_path.exists() {
            return Some(system_path);
        }
        None
    }

    /// Load from one file, no environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: HwlsConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(ENV_PCI_IDS) {
            self.paths.pci_ids = Some(PathBuf::from(path));
        }
        if let Ok(root) = std::env::var(ENV_SYSFS_ROOT) {
            self.paths.rebase_sysfs(Path::new(&root));
        }
    }
}
