use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::Value;

/// Flattened theme: CSS custom property name to value, sorted by name.
///
/// Two themes with the same flattened content render byte-identical blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeVariables {
    vars: BTreeMap<String, String>,
}

impl ThemeVariables {
    /// Walks `value` and records one variable per leaf.
    ///
    /// A leaf's name is `--<prefix>-` followed by its path joined with `-`.
    /// Array elements use their index as the path segment. Strings are used
    /// as is; numbers, booleans, and `null` use their literal form.
    pub fn flatten(value: &Value, prefix: &str) -> Self {
        let mut vars = BTreeMap::new();
        let root = format!("--{}", prefix);
        // a bare scalar has no path to name it by
        if value.is_object() || value.is_array() {
            walk(value, &root, &mut vars);
        }
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Renders a rule block for `selector`, one declaration per line.
    pub fn to_block(&self, selector: &str) -> String {
        let mut css = format!("{} {{\n", selector);
        for (name, value) in &self.vars {
            let _ = writeln!(css, "  {}: {};", name, value);
        }
        css.push('}');
        css
    }

    /// Renders the global `:root` block.
    ///
    /// ```rust
    /// use stylezx::theme::ThemeValue;
    ///
    /// let theme = ThemeValue::from_json_str(r#"{"colors": {"primary": "red"}, "radius": 4}"#).unwrap();
    /// assert_eq!(
    ///     theme.flatten("theme").to_root_block(),
    ///     ":root {\n  --theme-colors-primary: red;\n  --theme-radius: 4;\n}"
    /// );
    /// ```
    pub fn to_root_block(&self) -> String {
        self.to_block(":root")
    }

    /// Renders declarations for an inline `style` attribute, as used on the
    /// wrapper element of a scoped theme.
    pub fn to_inline_style(&self) -> String {
        self.vars
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl<'a> IntoIterator for &'a ThemeVariables {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

fn walk(value: &Value, name: &str, vars: &mut BTreeMap<String, String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                walk(child, &format!("{}-{}", name, key), vars);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, &format!("{}-{}", name, i), vars);
            }
        }
        Value::String(s) => {
            vars.insert(name.to_string(), s.clone());
        }
        other => {
            vars.insert(name.to_string(), other.to_string());
        }
    }
}
