use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::variables::ThemeVariables;
use super::ThemeError;

/// A nested mapping of theme tokens.
///
/// The root is always a mapping; leaves are strings, numbers, booleans, or
/// `null`, and arrays are allowed anywhere below the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ThemeValue(Value);

impl Default for ThemeValue {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl TryFrom<Value> for ThemeValue {
    type Error = ThemeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(ThemeError::NotAMapping(value_kind(&value)))
        }
    }
}

impl From<ThemeValue> for Value {
    fn from(theme: ThemeValue) -> Self {
        theme.0
    }
}

impl ThemeValue {
    /// An empty theme.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_str(source: &str) -> Result<Self, ThemeError> {
        let value: Value = serde_json::from_str(source)?;
        Self::try_from(value)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, ThemeError> {
        let value: Value = serde_yaml::from_str(source)?;
        Self::try_from(value)
    }

    /// Reads a theme file, choosing the format by extension (`.json`,
    /// `.yaml`, `.yml`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ThemeError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ThemeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
            other => Err(ThemeError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Looks up a dotted path such as `colors.primary`. Array elements are
    /// addressed by index.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.0, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// Deep-merges `overrides` onto a copy of `self`.
    ///
    /// Mappings merge key by key and arrays index by index; any other
    /// override value replaces what it lands on. `self` is not modified.
    pub fn merged(&self, overrides: &ThemeValue) -> ThemeValue {
        let mut out = self.0.clone();
        merge_into(&mut out, &overrides.0);
        ThemeValue(out)
    }

    /// Flattens to CSS custom properties named `--<prefix>-<path>`.
    pub fn flatten(&self, prefix: &str) -> ThemeVariables {
        ThemeVariables::flatten(&self.0, prefix)
    }
}

fn merge_into(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(base), Value::Object(over)) => {
            for (key, value) in over {
                match base.get_mut(key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(base), Value::Array(over)) => {
            for (i, value) in over.iter().enumerate() {
                match base.get_mut(i) {
                    Some(existing) => merge_into(existing, value),
                    None => base.push(value.clone()),
                }
            }
        }
        (target, value) => *target = value.clone(),
    }
}

pub(super) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn theme(value: Value) -> ThemeValue {
        ThemeValue::try_from(value).unwrap()
    }

    #[test]
    fn test_scoped_merge_keeps_siblings() {
        let parent = theme(json!({"colors": {"primary": "red", "text": "black"}}));
        let overrides = theme(json!({"colors": {"primary": "blue"}}));
        let merged = parent.merged(&overrides);
        assert_eq!(
            merged.as_json(),
            &json!({"colors": {"primary": "blue", "text": "black"}})
        );
        // parent untouched
        assert_eq!(
            parent.as_json(),
            &json!({"colors": {"primary": "red", "text": "black"}})
        );
    }

    #[test]
    fn test_merge_adds_new_keys() {
        let parent = theme(json!({"a": 1}));
        let merged = parent.merged(&theme(json!({"b": {"c": 2}})));
        assert_eq!(merged.as_json(), &json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn test_merge_scalar_replaces_mapping_and_back() {
        let parent = theme(json!({"a": {"x": 1}, "b": 2}));
        let merged = parent.merged(&theme(json!({"a": "flat", "b": {"y": 3}})));
        assert_eq!(merged.as_json(), &json!({"a": "flat", "b": {"y": 3}}));
    }

    #[test]
    fn test_merge_arrays_by_index() {
        let parent = theme(json!({"shadows": ["a", "b", "c"]}));
        let merged = parent.merged(&theme(json!({"shadows": ["x"]})));
        assert_eq!(merged.as_json(), &json!({"shadows": ["x", "b", "c"]}));
        let longer = parent.merged(&theme(json!({"shadows": ["x", "y", "z", "w"]})));
        assert_eq!(longer.as_json(), &json!({"shadows": ["x", "y", "z", "w"]}));
    }

    #[test]
    fn test_root_must_be_mapping() {
        assert!(matches!(
            ThemeValue::try_from(json!([1, 2])),
            Err(ThemeError::NotAMapping("array"))
        ));
        assert!(matches!(
            ThemeValue::from_json_str("\"red\""),
            Err(ThemeError::NotAMapping("string"))
        ));
    }

    #[test]
    fn test_from_yaml() {
        let t = ThemeValue::from_yaml_str("colors:\n  primary: '#646cff'\nspacing:\n  small: 8\n")
            .unwrap();
        assert_eq!(t.get("colors.primary"), Some(&json!("#646cff")));
        assert_eq!(t.get("spacing.small"), Some(&json!(8)));
        assert_eq!(t.get("spacing.large"), None);
    }

    #[test]
    fn test_get_array_index() {
        let t = theme(json!({"shadows": ["a", "b"]}));
        assert_eq!(t.get("shadows.1"), Some(&json!("b")));
        assert_eq!(t.get("shadows.x"), None);
    }

    #[test]
    fn test_deserialize_rejects_non_mapping() {
        assert!(serde_json::from_str::<ThemeValue>("[1]").is_err());
        let t: ThemeValue = serde_json::from_str(r#"{"a": 1}"#).unwrap();
        assert_eq!(t.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("theme.yaml");
        std::fs::write(&yaml, "colors:\n  primary: red\n").unwrap();
        let json_path = dir.path().join("theme.json");
        std::fs::write(&json_path, r#"{"colors": {"primary": "blue"}}"#).unwrap();
        let toml = dir.path().join("theme.toml");
        std::fs::write(&toml, "").unwrap();

        assert_eq!(
            ThemeValue::load(&yaml).unwrap().get("colors.primary"),
            Some(&json!("red"))
        );
        assert_eq!(
            ThemeValue::load(&json_path).unwrap().get("colors.primary"),
            Some(&json!("blue"))
        );
        assert!(matches!(
            ThemeValue::load(&toml),
            Err(ThemeError::UnsupportedFormat(ext)) if ext == "toml"
        ));
        assert!(matches!(
            ThemeValue::load(dir.path().join("missing.json")),
            Err(ThemeError::Io { .. })
        ));
    }
}
