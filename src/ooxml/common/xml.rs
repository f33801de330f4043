//! Small XML helpers shared by every part serializer and parser.
use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use quick_xml::events::BytesStart;

use crate::ooxml::opc::error::{OpcError, Result};

/// Declaration written at the top of every XML part.
pub const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

static XML_ESCAPER: Lazy<Option<AhoCorasick>> =
    Lazy::new(|| AhoCorasick::new(["&", "<", ">", "\"", "'"]).ok());

/// Escape the five XML special characters for use in text or attribute values.
#[inline]
pub fn escape_xml(s: &str) -> String {
    match XML_ESCAPER.as_ref() {
        Some(ac) => ac.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"]),
        None => s
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;"),
    }
}

/// Value of the attribute whose local name is `name`, unescaped.
///
/// Namespace prefixes are ignored, so `r:id` is found by `b"id"`.
pub fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Parse an integer attribute value, tolerating surrounding whitespace.
pub fn parse_i64(value: &str) -> Option<i64> {
    atoi_simd::parse::<i64>(value.trim().as_bytes()).ok()
}

/// Narrow a parsed integer to `u32`. Negative or oversized values are an error
/// naming `what`, never truncated.
pub fn to_u32(value: i64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| OpcError::XmlError(format!("{} out of range: {}", what, value)))
}

/// Integer attribute narrowed with [`to_u32`]; `None` when absent or not a number.
pub fn u32_attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<u32>> {
    match attr_value(e, name)?.as_deref().and_then(parse_i64) {
        Some(value) => to_u32(value, &String::from_utf8_lossy(name)).map(Some),
        None => Ok(None),
    }
}

/// XML boolean: `1`/`true` are true, everything else false.
pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true")
}
