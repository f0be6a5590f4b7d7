//! Kernel module resolution from `modules.alias`
//!
//! Each PCI device exports a modalias such as
//! `pci:v000010ECd00008168sv000017AAsd00005095bc02sc00i00`. The module
//! index maps glob patterns over that string to module names:
//!
//! ```text
//! alias pci:v000010ECd00008168sv*sd*bc*sc*i* r8169
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, warn};

/// Kernel release of the running system
pub fn kernel_release() -> Option<String> {
    fs::read_to_string("/proc/sys/kernel/osrelease")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `/lib/modules/<release>/modules.alias` for the running kernel
pub fn default_alias_path() -> Option<PathBuf> {
    kernel_release().map(|release| {
        PathBuf::from("/lib/modules")
            .join(release)
            .join("modules.alias")
    })
}

#[derive(Debug, Clone)]
struct AliasEntry {
    pattern: String,
    /// Text before the first wildcard; the modalias must start with it
    literal: String,
    module: String,
}

/// PCI alias patterns loaded from `modules.alias`
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    entries: Vec<AliasEntry>,
}

impl AliasIndex {
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let index = Self::parse(&contents);
        debug!(
            "Loaded {} PCI module aliases from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Parse `alias <pattern> <module>` lines, keeping the `pci:` ones.
    pub fn parse(contents: &str) -> Self {
        let entries = contents
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                if fields.next()? != "alias" {
                    return None;
                }
                let pattern = fields.next()?;
                let module = fields.next()?;
                if !pattern.starts_with("pci:") {
                    return None;
                }
                let literal = pattern
                    .split(['*', '?', '['])
                    .next()
                    .unwrap_or_default()
                    .to_string();
                Some(AliasEntry {
                    pattern: pattern.to_string(),
                    literal,
                    module: module.to_string(),
                })
            })
            .collect();

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Modules whose alias matches `modalias`, deduplicated, in file order
    pub fn modules_for(&self, modalias: &str) -> Vec<String> {
        let mut modules: Vec<String> = Vec::new();

        for entry in &self.entries {
            if !modalias.starts_with(&entry.literal) || modules.contains(&entry.module) {
                continue;
            }
            match glob_regex(&entry.pattern) {
                Ok(re) if re.is_match(modalias) => modules.push(entry.module.clone()),
                Ok(_) => {}
                Err(e) => warn!("Skipping alias pattern {}: {}", entry.pattern, e),
            }
        }

        modules
    }
}

/// Translate a shell glob (`*`, `?`, `[...]`) to an anchored regex.
fn glob_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::with_capacity(pattern.len() * 2 + 2);
    re.push('^');

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                re.push('[');
                if chars.clone().next() == Some('!') {
                    chars.next();
                    re.push('^');
                }
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    if matches!(c, '\\' | '[' | '&' | '~') {
                        re.push('\\');
                    }
                    re.push(c);
                }
                re.push(']');
            }
            _ => re.push_str(&regex::escape(&c.to_string())),
        }
    }

    re.push('$');
    Regex::new(&re)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIASES: &str = "\
# Aliases extracted from modules themselves.
alias pci:v000010ECd00008168sv*sd*bc*sc*i* r8169
alias pci:v000010ECd00008161sv*sd*bc*sc*i* r8169
alias pci:v*d*sv*sd*bc0Csc03i30* xhci_pci
alias pci:v00001022d*sv*sd*bc0Csc03i30* xhci_pci
alias pci:v00001002d*sv*sd*bc03sc0[02]i* amdgpu
alias usb:v0BDAp8153d*dc*dsc*dp*ic*isc*ip*in* r8152
alias acpi*:PNP0C09:* ec_sys
";

    #[test]
    fn test_parse_keeps_pci_aliases() {
        let index = AliasIndex::parse(ALIASES);
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_exact_device_match() {
        let index = AliasIndex::parse(ALIASES);
        let modules =
            index.modules_for("pci:v000010ECd00008168sv000017AAsd00005095bc02sc00i00");
        assert_eq!(modules, vec!["r8169"]);
    }

    #[test]
    fn test_class_wildcards_deduplicate() {
        let index = AliasIndex::parse(ALIASES);
        let modules =
            index.modules_for("pci:v00001022d00001639sv000017AAsd00005095bc0Csc03i30");
        assert_eq!(modules, vec!["xhci_pci"]);
    }

    #[test]
    fn test_bracket_class() {
        let index = AliasIndex::parse(ALIASES);
        let vga = "pci:v00001002d00001636sv000017AAsd00005095bc03sc00i00";
        let other = "pci:v00001002d00001637sv000017AAsd00005095bc03sc80i00";
        assert_eq!(index.modules_for(vga), vec!["amdgpu"]);
        assert!(index.modules_for(other).is_empty());
    }

    #[test]
    fn test_no_match() {
        let index = AliasIndex::parse(ALIASES);
        assert!(index.modules_for("pci:v00008086d00001237sv*").is_empty());
        assert!(AliasIndex::default().modules_for("pci:v0").is_empty());
    }

    #[test]
    fn test_glob_regex_escapes_literals() {
        let re = glob_regex("pci:v.d*").unwrap();
        assert!(re.is_match("pci:v.d1234"));
        assert!(!re.is_match("pci:vXd1234"));

        let re = glob_regex("a[!b]c").unwrap();
        assert!(re.is_match("axc"));
        assert!(!re.is_match("abc"));
    }
}
