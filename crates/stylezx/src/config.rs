//! Pipeline configuration.
//!
//! Every field has a default, so an empty file (or no file) gives the stock
//! behaviour. Files are read as YAML or JSON depending on their extension.
//!
//! ```yaml
//! # stylezx.yaml
//! attribute: zx
//! class_prefix: app
//! theme_prefix: theme
//! extensions: [jsx, tsx]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Error returned when a configuration cannot be loaded or is invalid.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config file extension '{0}' (expected .json, .yaml, or .yml)")]
    UnsupportedFormat(String),
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    /// JSX attribute holding a style declaration.
    pub attribute: String,
    /// Attribute the generated class name is merged into.
    pub class_attribute: String,
    /// Generated class names are `<class_prefix>-<hash>`.
    pub class_prefix: String,
    /// Theme references are `$<theme_prefix>.<path>` and variables
    /// `--<theme_prefix>-<path>`.
    pub theme_prefix: String,
    /// Name of the static style-map factory function.
    pub styles_factory: String,
    /// Import injected into every transformed file.
    pub virtual_module: String,
    /// File extensions the transform applies to.
    pub extensions: Vec<String>,
    pub inject_import: bool,
    /// File name of the final stylesheet asset.
    pub css_file_name: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            attribute: "zx".to_string(),
            class_attribute: "className".to_string(),
            class_prefix: "zx".to_string(),
            theme_prefix: "theme".to_string(),
            styles_factory: "createStyles".to_string(),
            virtual_module: "virtual:style-zx.css".to_string(),
            extensions: ["js", "jsx", "ts", "tsx"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            inject_import: true,
            css_file_name: "style-zx.css".to_string(),
        }
    }
}

impl StyleConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        // an empty YAML document is `null`, not an empty mapping
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file, choosing the format by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    /// Checks that names used to build CSS and JSX are well formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_identifier("attribute", &self.attribute, true)?;
        check_identifier("class_attribute", &self.class_attribute, true)?;
        check_identifier("class_prefix", &self.class_prefix, true)?;
        check_identifier("theme_prefix", &self.theme_prefix, true)?;
        check_identifier("styles_factory", &self.styles_factory, false)?;
        if self.virtual_module.is_empty() {
            return Err(ConfigError::Invalid {
                field: "virtual_module",
                reason: "must not be empty".to_string(),
            });
        }
        if self.css_file_name.is_empty() || self.css_file_name.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                field: "css_file_name",
                reason: format!("'{}' must be a plain file name", self.css_file_name),
            });
        }
        Ok(())
    }

    /// The id the host resolves the injected import to.
    pub fn resolved_virtual_module(&self) -> String {
        format!("\0{}", self.virtual_module)
    }

    /// Returns true when `path` has one of the configured extensions.
    pub fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}

/// Accepts ASCII identifiers, plus `-` after the first character when
/// `dashes` is set.
fn check_identifier(field: &'static str, value: &str, dashes: bool) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || (c == '-' && dashes));
    if starts_ok && rest_ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("'{}' is not a valid identifier", value),
        })
    }
}
