//! Sysfs attribute reading
//!
//! PCI attribute files hold a single line such as `0x10ec` or
//! `pci:v000010ECd0000816Dsv...`. Values are taken token by token and
//! optionally sliced to a byte range, so `0x10ec` becomes `10ec`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::error::PciError;

/// Token position and byte range to extract from an attribute file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    /// 1-based token index; 0 is treated as 1
    pub token: usize,
    pub start: usize,
    pub end: usize,
}

impl AttributeSpec {
    /// Four hex digits after the `0x` prefix (vendor, device, class, subsystem)
    pub const HEX16: Self = Self::range(2, 6);
    /// Two hex digits after the `0x` prefix (revision)
    pub const HEX8: Self = Self::range(2, 4);
    /// The first token, untouched
    pub const RAW: Self = Self::range(0, 0);

    pub const fn range(start: usize, end: usize) -> Self {
        Self {
            token: 1,
            start,
            end,
        }
    }

    pub fn read(&self, path: &Path) -> Result<String, PciError> {
        read_attribute(path, self.token, self.start, self.end)
    }
}

/// Read token `token` of `path` and return bytes `start..end` of it.
///
/// `start == end == 0` returns the whole token. Scanning stops after the
/// first line that yields the token.
pub fn read_attribute(
    path: &Path,
    token: usize,
    start: usize,
    end: usize,
) -> Result<String, PciError> {
    if start > end {
        return Err(PciError::InvalidRange { start, end, len: 0 });
    }

    let file = File::open(path).map_err(|e| PciError::from_io(path, e))?;
    let reader = BufReader::new(file);
    let wanted = token.max(1);

    let mut value: Vec<String> = Vec::new();
    let mut position = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| PciError::from_io(path, e))?;
        for word in line.split_whitespace() {
            position += 1;
            if position == wanted {
                value.push(word.to_string());
            }
        }
        if !value.is_empty() {
            break;
        }
    }

    slice(&value.join(" "), start, end)
}

/// Byte-range slice with bounds validation
pub(crate) fn slice(value: &str, start: usize, end: usize) -> Result<String, PciError> {
    if start == 0 && end == 0 {
        return Ok(value.to_string());
    }

    value
        .get(start..end)
        .filter(|_| start <= end)
        .map(str::to_string)
        .ok_or(PciError::InvalidRange {
            start,
            end,
            len: value.len(),
        })
}
