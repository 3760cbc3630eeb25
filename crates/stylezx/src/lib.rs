//! Build-time compiler for static style objects attached to JSX elements.
//!
//! Authors write styles inline:
//!
//! ```jsx
//! <div className="card" zx={{ p: 4, bg: "$theme.colors.surface", "&:hover": { opacity: 0.8 } }} />
//! ```
//!
//! At build time every such declaration is evaluated statically, compiled to
//! a CSS rule under a content-hashed class name, and replaced in the source
//! by that class name. Equal declarations anywhere in the build share one
//! class and one rule. At the end of a build the stylesheet is pruned to the
//! classes the output still mentions.
//!
//! This crate provides:
//!
//! - [`syntax`]: locating declarations in JS/TS/JSX source ([`SourceParser`],
//!   with [`JsxScanner`] built in)
//! - [`eval`]: static evaluation of a declaration to a [`StyleLiteral`]
//! - [`compile`]: CSS generation with property aliases, unit policy, theme
//!   variable references, and nested selectors
//! - [`identity`]: the content hash behind each class name
//! - [`registry`] and [`usage`]: build-wide rules and per-file references
//! - [`transform`]: rewriting one source file
//! - [`prune`]: bundle-time reachability pruning
//! - [`theme`]: theme values, CSS variables, and the theme store
//! - [`pipeline`]: the host hooks, tying the above together
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use stylezx::StylePipeline;
//!
//! let pipeline = StylePipeline::default();
//! let out = pipeline
//!     .transform_file(Path::new("App.tsx"), r#"export const App = () => <div zx={{ mx: 10 }} />;"#)
//!     .unwrap()
//!     .unwrap();
//!
//! let class = &out.declarations[0].class_name;
//! assert!(out.code.contains(&format!("<div className=\"{}\" />", class)));
//!
//! let css = pipeline.finalize_bundle(&[out.code.as_str()]);
//! assert!(css.contains("margin-left: 10px;"));
//! assert!(css.contains("margin-right: 10px;"));
//! ```

pub mod compile;
pub mod config;
pub mod eval;
pub mod identity;
pub mod literal;
pub mod pipeline;
pub mod prune;
pub mod registry;
pub mod syntax;
pub mod theme;
pub mod transform;
pub mod usage;

pub use compile::{CompiledRule, StyleCompiler, StyleWarning};
pub use config::{ConfigError, StyleConfig};
pub use eval::{evaluate, evaluate_declaration, EvalError};
pub use identity::{identify, ClassIdentity};
pub use literal::{StyleLiteral, StyleMap};
pub use pipeline::StylePipeline;
pub use prune::{link_stylesheet, prune, BundleArtifact, FinalizedBundle};
pub use registry::StyleRegistry;
pub use syntax::{JsxScanner, Location, SourceParser, Span, SyntaxError};
pub use theme::{ThemeError, ThemeStore, ThemeValue, ThemeVariables};
pub use transform::{Declaration, Edit, FileTransform, TransformError};
pub use usage::{FileUsageSet, UsageTracker};
