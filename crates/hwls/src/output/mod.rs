//! Text and JSON renderings for the hwls commands

pub mod irq;
pub mod pci;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Pretty JSON with a custom indent
pub(crate) fn to_json_indented<T: Serialize>(value: &T, indent: &[u8]) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(indent));
    value.serialize(&mut ser)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
