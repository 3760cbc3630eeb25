//! The restricted value a style declaration may hold.
//!
//! A [`StyleLiteral`] is what the evaluator produces from a declaration site:
//! strings, numbers, booleans, `null`, and string-keyed mappings of further
//! literals. Mappings keep the author's key order (the compiler emits
//! declarations in that order), while [`StyleLiteral::canonical_json`] sorts
//! keys so that identity hashing is insensitive to it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A string-keyed mapping of literals, in author order.
pub type StyleMap = IndexMap<String, StyleLiteral>;

/// A statically known style value.
///
/// # Example
///
/// ```rust
/// use stylezx::StyleLiteral;
///
/// let style: StyleLiteral = serde_json::from_str(r#"{ "mx": 10, "bg": "red" }"#).unwrap();
/// assert!(style.is_object());
/// assert_eq!(style.canonical_json(), r#"{"bg":"red","mx":10}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleLiteral {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(StyleMap),
}

impl StyleLiteral {
    /// Returns the mapping if this literal is one.
    pub fn as_object(&self) -> Option<&StyleMap> {
        match self {
            StyleLiteral::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` for mapping literals.
    pub fn is_object(&self) -> bool {
        matches!(self, StyleLiteral::Object(_))
    }

    /// Returns the string if this literal is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StyleLiteral::String(s) => Some(s),
            _ => None,
        }
    }

    /// Renders a scalar the way it appears in a CSS declaration value.
    ///
    /// Returns `None` for mappings, which have no scalar form.
    pub fn to_css_string(&self) -> Option<String> {
        match self {
            StyleLiteral::Null => Some("null".to_string()),
            StyleLiteral::Bool(b) => Some(b.to_string()),
            StyleLiteral::Number(n) => Some(format_number(*n)),
            StyleLiteral::String(s) => Some(s.clone()),
            StyleLiteral::Object(_) => None,
        }
    }

    /// Serializes the literal as compact JSON with mapping keys sorted.
    ///
    /// Two literals that differ only in key insertion order produce the same
    /// text, at every nesting level.
    pub fn canonical_json(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            StyleLiteral::Null => out.push_str("null"),
            StyleLiteral::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            StyleLiteral::Number(n) => out.push_str(&format_number(*n)),
            StyleLiteral::String(s) => push_json_string(out, s),
            StyleLiteral::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                out.push('{');
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    push_json_string(out, key);
                    out.push(':');
                    map[key].write_canonical(out);
                }
                out.push('}');
            }
        }
    }
}

impl From<&str> for StyleLiteral {
    fn from(value: &str) -> Self {
        StyleLiteral::String(value.to_string())
    }
}

impl From<String> for StyleLiteral {
    fn from(value: String) -> Self {
        StyleLiteral::String(value)
    }
}

impl From<f64> for StyleLiteral {
    fn from(value: f64) -> Self {
        StyleLiteral::Number(value)
    }
}

impl From<i32> for StyleLiteral {
    fn from(value: i32) -> Self {
        StyleLiteral::Number(f64::from(value))
    }
}

impl From<bool> for StyleLiteral {
    fn from(value: bool) -> Self {
        StyleLiteral::Bool(value)
    }
}

impl From<StyleMap> for StyleLiteral {
    fn from(value: StyleMap) -> Self {
        StyleLiteral::Object(value)
    }
}

/// Formats a number the way JavaScript's `String(n)` does: shortest
/// round-trip digits, exponent form from `1e21` up and below `1e-6`.
///
/// Negative zero prints as `0`.
///
/// ```rust
/// use stylezx::literal::format_number;
///
/// assert_eq!(format_number(10.0), "10");
/// assert_eq!(format_number(0.5), "0.5");
/// assert_eq!(format_number(-4.0), "-4");
/// assert_eq!(format_number(-0.0), "0");
/// assert_eq!(format_number(1e21), "1e+21");
/// ```
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    ryu_js::Buffer::new().format(n).to_string()
}

fn push_json_string(out: &mut String, s: &str) {
    out.push_str(&serde_json::Value::String(s.to_string()).to_string());
}
