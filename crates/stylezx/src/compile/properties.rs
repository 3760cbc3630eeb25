//! Property-name resolution: shorthand aliases, case conversion, and the
//! unitless-property set.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// Shorthand aliases and the longhands they expand to.
///
/// An entry with several longhands applies one value to every one of them, so
/// it may only name symmetric edges (left + right, top + bottom). Anything
/// asymmetric gets one alias per edge.
pub static ALIASES: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let entries: [(&'static str, &'static [&'static str]); 21] = [
        ("m", &["margin"]),
        ("mt", &["margin-top"]),
        ("mr", &["margin-right"]),
        ("mb", &["margin-bottom"]),
        ("ml", &["margin-left"]),
        ("mx", &["margin-left", "margin-right"]),
        ("my", &["margin-top", "margin-bottom"]),
        ("p", &["padding"]),
        ("pt", &["padding-top"]),
        ("pr", &["padding-right"]),
        ("pb", &["padding-bottom"]),
        ("pl", &["padding-left"]),
        ("px", &["padding-left", "padding-right"]),
        ("py", &["padding-top", "padding-bottom"]),
        ("bg", &["background-color"]),
        ("w", &["width"]),
        ("h", &["height"]),
        ("minW", &["min-width"]),
        ("maxW", &["max-width"]),
        ("minH", &["min-height"]),
        ("maxH", &["max-height"]),
    ];
    entries.into_iter().collect()
});

/// Properties whose numeric values take no unit (kebab-case).
pub static UNITLESS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "animation-iteration-count",
        "aspect-ratio",
        "border-image-outset",
        "border-image-slice",
        "border-image-width",
        "box-flex",
        "box-flex-group",
        "box-ordinal-group",
        "column-count",
        "columns",
        "fill-opacity",
        "flex",
        "flex-grow",
        "flex-negative",
        "flex-order",
        "flex-positive",
        "flex-shrink",
        "flood-opacity",
        "font-weight",
        "grid-area",
        "grid-column",
        "grid-column-end",
        "grid-column-span",
        "grid-column-start",
        "grid-row",
        "grid-row-end",
        "grid-row-span",
        "grid-row-start",
        "line-clamp",
        "line-height",
        "opacity",
        "order",
        "orphans",
        "scale",
        "stop-opacity",
        "stroke-dasharray",
        "stroke-dashoffset",
        "stroke-miterlimit",
        "stroke-opacity",
        "stroke-width",
        "tab-size",
        "widows",
        "z-index",
        "zoom",
    ]
    .into_iter()
    .collect()
});

/// Resolves a style key to the CSS property names it declares.
///
/// ```rust
/// use stylezx::compile::resolve_property;
///
/// assert_eq!(resolve_property("mx"), vec!["margin-left", "margin-right"]);
/// assert_eq!(resolve_property("fontSize"), vec!["font-size"]);
/// assert_eq!(resolve_property("--gap"), vec!["--gap"]);
/// ```
pub fn resolve_property(key: &str) -> Vec<String> {
    match ALIASES.get(key) {
        Some(longhands) => longhands.iter().map(|s| s.to_string()).collect(),
        None => vec![to_kebab_case(key)],
    }
}

/// Converts a camel-case property name to kebab case.
///
/// Custom properties (`--x`) and names that are already kebab case pass
/// through. Vendor names gain their leading dash: `WebkitTransition` becomes
/// `-webkit-transition`, `msTransform` becomes `-ms-transform`.
pub fn to_kebab_case(name: &str) -> String {
    if name.starts_with("--") {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len() + 4);
    if name.starts_with("ms") && name[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        out.push('-');
    }
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Returns true when numbers for `property` are emitted without `px`.
pub fn is_unitless(property: &str) -> bool {
    property.starts_with("--") || UNITLESS.contains(property)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("backgroundColor"), "background-color");
        assert_eq!(to_kebab_case("color"), "color");
        assert_eq!(to_kebab_case("font-size"), "font-size");
        assert_eq!(to_kebab_case("borderTopLeftRadius"), "border-top-left-radius");
    }

    #[test]
    fn test_kebab_case_vendor_prefixes() {
        assert_eq!(to_kebab_case("WebkitTransition"), "-webkit-transition");
        assert_eq!(to_kebab_case("MozAppearance"), "-moz-appearance");
        assert_eq!(to_kebab_case("msTransform"), "-ms-transform");
        // not a vendor prefix
        assert_eq!(to_kebab_case("msx"), "msx");
    }

    #[test]
    fn test_custom_properties_untouched() {
        assert_eq!(to_kebab_case("--brandColor"), "--brandColor");
        assert!(is_unitless("--gap"));
    }

    #[test]
    fn test_single_longhand_aliases() {
        for (alias, expected) in [
            ("m", "margin"),
            ("mt", "margin-top"),
            ("mr", "margin-right"),
            ("mb", "margin-bottom"),
            ("ml", "margin-left"),
            ("p", "padding"),
            ("pt", "padding-top"),
            ("pr", "padding-right"),
            ("pb", "padding-bottom"),
            ("pl", "padding-left"),
            ("bg", "background-color"),
            ("w", "width"),
            ("h", "height"),
            ("minW", "min-width"),
            ("maxW", "max-width"),
            ("minH", "min-height"),
            ("maxH", "max-height"),
        ] {
            assert_eq!(resolve_property(alias), vec![expected], "alias {}", alias);
        }
    }

    #[test]
    fn test_multi_longhand_aliases_are_symmetric() {
        assert_eq!(resolve_property("mx"), vec!["margin-left", "margin-right"]);
        assert_eq!(resolve_property("my"), vec!["margin-top", "margin-bottom"]);
        assert_eq!(resolve_property("px"), vec!["padding-left", "padding-right"]);
        assert_eq!(resolve_property("py"), vec!["padding-top", "padding-bottom"]);

        // Every multi-longhand alias names one axis: both edges share a
        // property family and are opposite edges.
        for (alias, longhands) in ALIASES.iter() {
            if longhands.len() < 2 {
                continue;
            }
            assert_eq!(longhands.len(), 2, "alias {}", alias);
            let edges: Vec<&str> = longhands
                .iter()
                .map(|l| l.rsplit('-').next().unwrap_or(""))
                .collect();
            let family: Vec<&str> = longhands
                .iter()
                .map(|l| l.split('-').next().unwrap_or(""))
                .collect();
            assert_eq!(family[0], family[1], "alias {}", alias);
            let mut sorted = edges.clone();
            sorted.sort();
            assert!(
                sorted == ["left", "right"] || sorted == ["bottom", "top"],
                "alias {} mixes edges {:?}",
                alias,
                edges
            );
        }
    }

    #[test]
    fn test_unitless_set() {
        assert!(is_unitless("opacity"));
        assert!(is_unitless("z-index"));
        assert!(is_unitless("line-height"));
        assert!(is_unitless("flex-grow"));
        assert!(!is_unitless("font-size"));
        assert!(!is_unitless("margin-left"));
        // checked on kebab names only
        assert!(!is_unitless("zIndex"));
    }
}
