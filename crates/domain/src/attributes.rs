//! Attribute pairs and the packed `k1=v1;k2=v2` codec.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single key/value attribute attached to a recording.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key (never empty).
    pub key: String,
    /// Attribute value (may be empty).
    pub value: String,
}

impl Attribute {
    /// Build an attribute from any string-like key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}={}", self.key, self.value)
    }
}

/// Decode a packed attribute string.
///
/// Segments are split on `;` and trimmed. Each segment is split on its first
/// `=`; key and value are trimmed. A segment without `=` yields an empty
/// value, and segments whose key is empty are dropped. Order is preserved.
///
/// ```
/// use scantel_domain::{Attribute, parse_attribute_string};
///
/// let parsed = parse_attribute_string("a=1; b = 2 ;c");
/// assert_eq!(
///     parsed,
///     vec![
///         Attribute::new("a", "1"),
///         Attribute::new("b", "2"),
///         Attribute::new("c", ""),
///     ]
/// );
/// ```
pub fn parse_attribute_string(packed: &str) -> Vec<Attribute> {
    packed
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            let key = key.trim();
            if key.is_empty() {
                None
            } else {
                Some(Attribute::new(key, value.trim()))
            }
        })
        .collect()
}
