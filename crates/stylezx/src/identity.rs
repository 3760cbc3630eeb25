//! Content-hash class identity.
//!
//! A [`ClassIdentity`] is the first 32 bits of the MD5 digest of a literal's
//! canonical JSON (keys sorted at every level), so equal style objects get
//! equal identities no matter how their keys were ordered. The class name is
//! `<prefix>-<8 hex digits>`.
//!
//! Collisions are possible in principle and are not detected; at 32 bits the
//! chance is negligible for a realistic number of distinct style objects.

use std::fmt;

use crate::literal::StyleLiteral;

/// Stable hash of a style literal.
///
/// Orders by its numeric value, which is also the order of its hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassIdentity(u32);

impl ClassIdentity {
    /// Hashes a literal's canonical serialization.
    ///
    /// ```rust
    /// use stylezx::{ClassIdentity, StyleLiteral};
    ///
    /// let a: StyleLiteral = serde_json::from_str(r#"{"p": 1, "bg": "red"}"#).unwrap();
    /// let b: StyleLiteral = serde_json::from_str(r#"{"bg": "red", "p": 1}"#).unwrap();
    /// assert_eq!(ClassIdentity::of(&a), ClassIdentity::of(&b));
    /// ```
    pub fn of(literal: &StyleLiteral) -> Self {
        let digest = md5::compute(literal.canonical_json().as_bytes());
        Self(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
    }

    /// Builds an identity from its 8-digit hex form.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Self)
    }

    /// The 8-digit lowercase hex form.
    pub fn hex(&self) -> String {
        format!("{:08x}", self.0)
    }

    /// The generated class name, `<prefix>-<hex>`.
    pub fn class_name(&self, prefix: &str) -> String {
        format!("{}-{:08x}", prefix, self.0)
    }
}

impl fmt::Display for ClassIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Shorthand for [`ClassIdentity::of`].
pub fn identify(literal: &StyleLiteral) -> ClassIdentity {
    ClassIdentity::of(literal)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::literal::StyleMap;
    use proptest::prelude::*;

    fn scalar() -> impl Strategy<Value = StyleLiteral> {
        prop_oneof![
            Just(StyleLiteral::Null),
            any::<bool>().prop_map(StyleLiteral::Bool),
            (-1000i32..1000).prop_map(|n| StyleLiteral::Number(f64::from(n) / 4.0)),
            "[a-z#0-9 ]{0,8}".prop_map(StyleLiteral::String),
        ]
    }

    proptest! {
        #[test]
        fn identity_ignores_insertion_order(
            entries in prop::collection::btree_map("[a-zA-Z&:]{1,6}", scalar(), 1..8),
            seed in any::<u64>(),
        ) {
            let forward: StyleMap = entries.clone().into_iter().collect();
            let mut shuffled: Vec<_> = entries.into_iter().collect();
            // deterministic rotation plus reversal from the seed
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            if seed % 2 == 0 {
                shuffled.reverse();
            }
            let backward: StyleMap = shuffled.into_iter().collect();

            let a = StyleLiteral::Object(forward);
            let b = StyleLiteral::Object(backward);
            prop_assert_eq!(identify(&a), identify(&b));
            prop_assert_eq!(a.canonical_json(), b.canonical_json());
        }
    }
}
