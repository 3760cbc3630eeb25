//! Theme values, CSS-variable flattening, and the theme store.
//!
//! This module provides:
//!
//! - [`ThemeValue`]: a nested mapping of design tokens, loadable from YAML or
//!   JSON, with deep merge
//! - [`ThemeVariables`]: the flattened `--theme-*` custom properties of a
//!   theme, rendered as a `:root` block or an inline style
//! - [`ThemeStore`]: the active theme plus subscribers; [`global`] is the
//!   process-wide instance
//! - [`ScopedTheme`] / [`derive_scoped`]: a parent theme with an override
//!   merged in, never aliasing the parent
//!
//! Style declarations refer to tokens as `$theme.colors.primary`; the
//! compiler turns that into `var(--theme-colors-primary)` and the value is
//! supplied at run time by the variables rendered here.
//!
//! # Example
//!
//! ```rust
//! use stylezx::theme::{ThemeStore, ThemeValue};
//!
//! let store = ThemeStore::default();
//! store.set_theme(ThemeValue::from_yaml_str("colors:\n  primary: red\n  text: black\n").unwrap());
//!
//! let scoped = store.derive_scoped(&ThemeValue::from_json_str(r#"{"colors": {"primary": "blue"}}"#).unwrap());
//! assert_eq!(
//!     scoped.variables().to_inline_style(),
//!     "--theme-colors-primary: blue; --theme-colors-text: black"
//! );
//! ```

mod store;
mod value;
mod variables;

use std::path::PathBuf;

pub use store::{derive_scoped, global, ScopedTheme, Subscription, ThemeStore, DEFAULT_THEME_PREFIX};
pub use value::ThemeValue;
pub use variables::ThemeVariables;

/// Error returned when a theme cannot be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("failed to read theme file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid theme JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid theme YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("theme root must be a mapping, found {0}")]
    NotAMapping(&'static str),
    #[error("unsupported theme file extension '{0}' (expected .json, .yaml, or .yml)")]
    UnsupportedFormat(String),
}
