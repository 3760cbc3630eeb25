//! Style compilation: from a [`StyleMap`] and a class name to CSS text.
//!
//! For each key of a style object, in author order:
//!
//! 1. Keys beginning with `&`, `:` or `@` are nested selectors. Their value is
//!    compiled recursively and emitted as a sibling block after the primary
//!    block: `&` is replaced by the parent selector everywhere it appears,
//!    `:` keys are appended to the parent selector, and `@` keys wrap a block
//!    for the parent selector inside the at-rule. Output CSS is always flat.
//! 2. Other keys go through the alias table ([`resolve_property`]), so `mx`
//!    becomes `margin-left` and `margin-right`, and unknown camel-case keys
//!    become kebab case.
//! 3. Values: `$theme.a.b` becomes `var(--theme-a-b)`, numbers get a `px`
//!    suffix unless the property is unitless, everything else is printed as
//!    is.
//!
//! # Example
//!
//! ```rust
//! use stylezx::compile::compile;
//! use stylezx::StyleLiteral;
//!
//! let style: StyleLiteral =
//!     serde_json::from_str(r#"{ "mx": 10, "opacity": 0.5, "&:hover": { "bg": "$theme.colors.primary" } }"#)
//!         .unwrap();
//! let rule = compile(style.as_object().unwrap(), "zx-abc");
//!
//! assert_eq!(
//!     rule.css(),
//!     ".zx-abc {\n  margin-left: 10px;\n  margin-right: 10px;\n  opacity: 0.5;\n}\n\
//!      .zx-abc:hover {\n  background-color: var(--theme-colors-primary);\n}"
//! );
//! ```

mod properties;

use std::fmt;

use crate::literal::{format_number, StyleLiteral, StyleMap};

pub use properties::{is_unitless, resolve_property, to_kebab_case, ALIASES, UNITLESS};

/// The CSS produced for one class: a primary block followed by any nested
/// blocks. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledRule {
    class_name: String,
    css: String,
}

impl CompiledRule {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn css(&self) -> &str {
        &self.css
    }
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css)
    }
}

/// A recoverable problem found while compiling.
///
/// Compilation always produces a rule; warnings describe declarations that
/// were emitted on a best-effort basis or skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleWarning {
    /// A theme reference whose path is empty or has empty segments. It is
    /// still emitted as a variable reference.
    MalformedThemeReference { reference: String },
    /// A nested-selector key whose value is not an object; the block is skipped.
    NestedValueNotObject { key: String },
    /// A property whose value is an object; the declaration is skipped.
    ObjectValue { property: String },
}

impl fmt::Display for StyleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleWarning::MalformedThemeReference { reference } => {
                write!(f, "malformed theme reference '{}'", reference)
            }
            StyleWarning::NestedValueNotObject { key } => {
                write!(f, "nested selector '{}' must map to an object; skipped", key)
            }
            StyleWarning::ObjectValue { property } => {
                write!(
                    f,
                    "property '{}' has an object value; use a nested selector key instead",
                    property
                )
            }
        }
    }
}

/// Compiles style objects into CSS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleCompiler {
    theme_prefix: String,
}

impl Default for StyleCompiler {
    fn default() -> Self {
        Self::new("theme")
    }
}

impl StyleCompiler {
    /// Creates a compiler whose theme references are `$<theme_prefix>.<path>`
    /// and whose variables are `--<theme_prefix>-<path>`.
    pub fn new(theme_prefix: impl Into<String>) -> Self {
        Self {
            theme_prefix: theme_prefix.into(),
        }
    }

    pub fn theme_prefix(&self) -> &str {
        &self.theme_prefix
    }

    /// Compiles `style` for `.class_name`, discarding warnings.
    pub fn compile(&self, style: &StyleMap, class_name: &str) -> CompiledRule {
        self.compile_with_warnings(style, class_name).0
    }

    /// Compiles `style` for `.class_name`, returning warnings alongside.
    pub fn compile_with_warnings(
        &self,
        style: &StyleMap,
        class_name: &str,
    ) -> (CompiledRule, Vec<StyleWarning>) {
        let mut warnings = Vec::new();
        let css = self.compile_block(style, &format!(".{}", class_name), &mut warnings);
        let rule = CompiledRule {
            class_name: class_name.to_string(),
            css,
        };
        (rule, warnings)
    }

    fn compile_block(
        &self,
        style: &StyleMap,
        selector: &str,
        warnings: &mut Vec<StyleWarning>,
    ) -> String {
        let mut css = format!("{} {{", selector);
        let mut nested = String::new();

        for (key, value) in style {
            if let Some(marker) = key.chars().next().filter(|c| matches!(c, '&' | ':' | '@')) {
                let Some(inner) = value.as_object() else {
                    warnings.push(StyleWarning::NestedValueNotObject { key: key.clone() });
                    continue;
                };
                nested.push('\n');
                match marker {
                    '@' => {
                        let body = self.compile_block(inner, selector, warnings);
                        nested.push_str(&format!("{} {{\n{}\n}}", key, indent(&body)));
                    }
                    '&' => {
                        let child = key.replace('&', selector);
                        nested.push_str(&self.compile_block(inner, &child, warnings));
                    }
                    _ => {
                        let child = format!("{}{}", selector, key);
                        nested.push_str(&self.compile_block(inner, &child, warnings));
                    }
                }
                continue;
            }

            if value.is_object() {
                warnings.push(StyleWarning::ObjectValue {
                    property: key.clone(),
                });
                continue;
            }

            for property in resolve_property(key) {
                let resolved = self.resolve_value(&property, value, warnings);
                css.push_str(&format!("\n  {}: {};", property, resolved));
            }
        }

        css.push_str("\n}");
        css.push_str(&nested);
        css
    }

    fn resolve_value(
        &self,
        property: &str,
        value: &StyleLiteral,
        warnings: &mut Vec<StyleWarning>,
    ) -> String {
        match value {
            StyleLiteral::Number(n) if is_unitless(property) => format_number(*n),
            StyleLiteral::Number(n) => format!("{}px", format_number(*n)),
            StyleLiteral::String(s) => match self.theme_variable(s, warnings) {
                Some(var) => format!("var({})", var),
                None => s.clone(),
            },
            other => other.to_css_string().unwrap_or_default(),
        }
    }

    /// Maps `$theme.colors.primary` to `--theme-colors-primary`.
    ///
    /// Returns `None` for strings that are not theme references.
    fn theme_variable(&self, value: &str, warnings: &mut Vec<StyleWarning>) -> Option<String> {
        let path = value
            .strip_prefix('$')
            .and_then(|rest| rest.strip_prefix(self.theme_prefix.as_str()))
            .and_then(|rest| rest.strip_prefix('.'))?;

        let malformed = path.split('.').any(|segment| {
            segment.is_empty() || !segment.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        });
        if malformed {
            warnings.push(StyleWarning::MalformedThemeReference {
                reference: value.to_string(),
            });
        }
        Some(format!("--{}-{}", self.theme_prefix, path.replace('.', "-")))
    }
}

/// Compiles with the default theme prefix.
pub fn compile(style: &StyleMap, class_name: &str) -> CompiledRule {
    StyleCompiler::default().compile(style, class_name)
}

/// Compiles with the default theme prefix, returning warnings alongside.
pub fn compile_with_warnings(style: &StyleMap, class_name: &str) -> (CompiledRule, Vec<StyleWarning>) {
    StyleCompiler::default().compile_with_warnings(style, class_name)
}

fn indent(block: &str) -> String {
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("  {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
