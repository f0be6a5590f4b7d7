//! PCI ID database lookups
//!
//! Resolves vendor, device, class and subsystem codes against a `pci.ids`
//! registry file. Nothing is indexed: each lookup scans the registry from
//! the top and stops at the first matching line.
//!
//! Registry layout:
//! ```text
//! 1022  Advanced Micro Devices, Inc. [AMD]
//! \t1630  Renoir Root Complex
//! \t\t17aa 5095  ThinkPad E14 Gen 2
//! C 06  Bridge
//! \t04  PCI bridge
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::error::PciError;

/// Usual locations of the registry, in priority order
pub const PCI_IDS_CANDIDATES: &[&str] = &[
    "/usr/share/hwdata/pci.ids",
    "/usr/share/misc/pci.ids",
    "/usr/share/pci.ids",
    "./pci.ids",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Vendor,
    Device,
    Class,
    Subsystem,
}

impl LookupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Vendor => "vendor",
            LookupKind::Device => "device",
            LookupKind::Class => "class",
            LookupKind::Subsystem => "subsystem",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vendor" => Some(LookupKind::Vendor),
            "device" => Some(LookupKind::Device),
            "class" => Some(LookupKind::Class),
            "subsystem" => Some(LookupKind::Subsystem),
            _ => None,
        }
    }

    /// Placeholder returned when the registry has no entry
    pub fn unknown(&self) -> String {
        format!("Unknown {}", self.as_str())
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single registry query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<'a> {
    Vendor { vendor: &'a str },
    Device { vendor: &'a str, device: &'a str },
    /// `class` is the 4-digit base class + subclass code, e.g. `0604`
    Class { class: &'a str },
    Subsystem { vendor: &'a str, device: &'a str },
}

impl Lookup<'_> {
    pub fn kind(&self) -> LookupKind {
        match self {
            Lookup::Vendor { .. } => LookupKind::Vendor,
            Lookup::Device { .. } => LookupKind::Device,
            Lookup::Class { .. } => LookupKind::Class,
            Lookup::Subsystem { .. } => LookupKind::Subsystem,
        }
    }
}

/// Scan position relative to the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    AwaitingHeader,
    HeaderMatched,
}

/// Outcome of feeding one line to a [`Matcher`]
enum Step<'l> {
    Continue(ScanState),
    Found(&'l str),
}

/// Per-query matcher: one transition rule per lookup kind.
///
/// Header lines are unindented, non-comment lines. Any header that does not
/// match the query moves the scan back to `AwaitingHeader`, so a detail line
/// only resolves under its own vendor or class.
struct Matcher<'q> {
    header: Option<(&'q str, &'q str)>,
    detail: DetailRule<'q>,
}

enum DetailRule<'q> {
    /// Vendor lines resolve on the header itself
    Header,
    /// One tab, then this code
    Child(&'q str),
    /// Two tabs, then `<vendor> <device>`
    Subsystem(&'q str, &'q str),
}

impl<'q> Matcher<'q> {
    fn new(query: &Lookup<'q>) -> Result<Self, PciError> {
        Ok(match *query {
            Lookup::Vendor { vendor } => Matcher {
                header: Some(("", vendor)),
                detail: DetailRule::Header,
            },
            Lookup::Device { vendor, device } => Matcher {
                header: Some(("", vendor)),
                detail: DetailRule::Child(device),
            },
            Lookup::Class { class } => {
                let (base, sub) = split_class(class)?;
                Matcher {
                    header: Some(("C ", base)),
                    detail: DetailRule::Child(sub),
                }
            }
            Lookup::Subsystem { vendor, device } => Matcher {
                header: None,
                detail: DetailRule::Subsystem(vendor, device),
            },
        })
    }

    fn step<'l>(&self, state: ScanState, line: &'l str) -> Step<'l> {
        if line.starts_with('#') || line.trim().is_empty() {
            return Step::Continue(state);
        }

        match depth(line) {
            0 => {
                let Some((marker, code)) = self.header else {
                    return Step::Continue(state);
                };
                match line.strip_prefix(marker).and_then(|rest| after_code(rest, code)) {
                    Some(name) if matches!(self.detail, DetailRule::Header) => Step::Found(name),
                    Some(_) => Step::Continue(ScanState::HeaderMatched),
                    None => Step::Continue(ScanState::AwaitingHeader),
                }
            }
            1 => match self.detail {
                DetailRule::Child(code) if state == ScanState::HeaderMatched => {
                    match after_code(&line[1..], code) {
                        Some(name) => Step::Found(name),
                        None => Step::Continue(state),
                    }
                }
                _ => Step::Continue(state),
            },
            2 => match self.detail {
                DetailRule::Subsystem(vendor, device) => {
                    match after_code(&line[2..], vendor).and_then(|rest| after_code(rest, device)) {
                        Some(name) => Step::Found(name),
                        None => Step::Continue(state),
                    }
                }
                _ => Step::Continue(state),
            },
            _ => Step::Continue(state),
        }
    }
}

/// Number of leading tabs
fn depth(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b'\t').count()
}

/// If `text` starts with `code` followed by whitespace (or ends there),
/// return what follows the code with surrounding whitespace trimmed.
fn after_code<'l>(text: &'l str, code: &str) -> Option<&'l str> {
    if code.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(code)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

fn split_class(class: &str) -> Result<(&str, &str), PciError> {
    match (class.get(0..2), class.get(2..4)) {
        (Some(base), Some(sub)) => Ok((base, sub)),
        _ => Err(PciError::InvalidClassCode {
            class: class.to_string(),
        }),
    }
}

/// Where the registry text comes from
#[derive(Debug, Clone)]
enum Source {
    /// Reopened for every lookup
    File(PathBuf),
    Text(Arc<str>),
}

/// Read-only handle on a `pci.ids` registry
#[derive(Debug, Clone)]
pub struct IdDatabase {
    source: Source,
}

impl IdDatabase {
    /// Use the registry at `path`. The file is checked for readability
    /// here and reopened by every lookup.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PciError> {
        let path = path.as_ref();
        File::open(path).map_err(|e| PciError::from_io(path, e))?;
        Ok(Self {
            source: Source::File(path.to_path_buf()),
        })
    }

    /// Registry held in memory
    pub fn from_text(text: impl Into<Arc<str>>) -> Self {
        Self {
            source: Source::Text(text.into()),
        }
    }

    /// Open the first readable registry among `candidates`.
    ///
    /// Returns the error of the last candidate when none can be opened.
    pub fn locate<P: AsRef<Path>>(candidates: &[P]) -> Result<Self, PciError> {
        let mut last = None;
        for candidate in candidates {
            match Self::open(candidate) {
                Ok(db) => {
                    debug!("Using PCI ID database {}", candidate.as_ref().display());
                    return Ok(db);
                }
                Err(e) => last = Some(e),
            }
        }
        Err(last.unwrap_or_else(|| PciError::NotFound {
            path: PathBuf::from("pci.ids"),
        }))
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Source::File(path) => Some(path.as_path()),
            Source::Text(_) => None,
        }
    }

    /// Resolve `query` to its registry name.
    ///
    /// A miss yields `"Unknown <kind>"`; only read failures are errors.
    pub fn lookup(&self, query: Lookup<'_>) -> Result<String, PciError> {
        let matcher = Matcher::new(&query)?;

        let found = match &self.source {
            Source::File(path) => {
                let file = File::open(path).map_err(|e| PciError::from_io(path, e))?;
                scan(BufReader::new(file), &matcher).map_err(|source| PciError::Lookup {
                    path: path.clone(),
                    source,
                })?
            }
            Source::Text(text) => scan(Cursor::new(text.as_bytes()), &matcher).map_err(|source| {
                PciError::Lookup {
                    path: PathBuf::from("<memory>"),
                    source,
                }
            })?,
        };

        Ok(found.unwrap_or_else(|| {
            debug!("No PCI ID entry for {:?}", query);
            query.kind().unknown()
        }))
    }

    /// Five-argument form: `kind` selects which codes are used.
    /// For `Subsystem`, `vendor` and `subclass` carry the subsystem vendor
    /// and subsystem device codes.
    pub fn lookup_kind(
        &self,
        kind: LookupKind,
        vendor: &str,
        device: &str,
        class: &str,
        subclass: &str,
    ) -> Result<String, PciError> {
        let query = match kind {
            LookupKind::Vendor => Lookup::Vendor { vendor },
            LookupKind::Device => Lookup::Device { vendor, device },
            LookupKind::Class => Lookup::Class { class },
            LookupKind::Subsystem => Lookup::Subsystem {
                vendor,
                device: subclass,
            },
        };
        self.lookup(query)
    }

    pub fn vendor_name(&self, vendor: &str) -> Result<String, PciError> {
        self.lookup(Lookup::Vendor { vendor })
    }

    pub fn device_name(&self, vendor: &str, device: &str) -> Result<String, PciError> {
        self.lookup(Lookup::Device { vendor, device })
    }

    pub fn class_name(&self, class: &str) -> Result<String, PciError> {
        self.lookup(Lookup::Class { class })
    }

    pub fn subsystem_name(&self, vendor: &str, device: &str) -> Result<String, PciError> {
        self.lookup(Lookup::Subsystem { vendor, device })
    }
}

/// Feed `reader` to `matcher` line by line.
///
/// Registry text is not validated: bytes that are not UTF-8 are replaced,
/// so only a failing read ends the scan with an error.
fn scan<R: BufRead>(mut reader: R, matcher: &Matcher<'_>) -> std::io::Result<Option<String>> {
    let mut state = ScanState::AwaitingHeader;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        match matcher.step(state, line.trim_end_matches(['\n', '\r'])) {
            Step::Found(name) => return Ok(Some(name.to_string())),
            Step::Continue(next) => state = next,
        }
    }
}
