//! Bulk override text parser.
//!
//! Input is a list of `Key=Value` tokens separated by newlines or commas.
//! A bare `Key` token is an explicitly empty override. There is no escaping:
//! a value containing a comma is split into two tokens. That is a known
//! limitation of the format and is kept as-is.

use crate::overrides::OverrideMap;

/// Parse bulk text into an override fragment. The last occurrence of a key
/// wins; tokens whose key trims to empty are dropped.
pub fn parse_bulk(text: &str) -> OverrideMap {
    let mut fragment = OverrideMap::new();
    for segment in text.split(['\n', ',']) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (key, value) = match segment.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (segment, ""),
        };
        if key.is_empty() {
            continue;
        }
        fragment.insert(key.to_string(), value.to_string());
    }
    fragment
}
