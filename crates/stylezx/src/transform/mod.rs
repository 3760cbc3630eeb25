//! Per-file source transformation.
//!
//! [`Transformer::transform`] finds every style declaration in one source
//! file, evaluates and compiles it, and rewrites the file to reference the
//! generated class names instead:
//!
//! - `<div zx={{ p: 4 }}>` becomes `<div className="zx-1a2b3c4d">`
//! - with `className="card"` present, the literal becomes
//!   `"card zx-1a2b3c4d"` in its original quotes and the style attribute is
//!   removed
//! - with `className={expr}` present, the expression becomes
//!   `[expr, "zx-1a2b3c4d"].filter(Boolean).join(" ")`
//! - `createStyles({ card: {...} })` becomes `{ card: "zx-1a2b3c4d" }`
//!
//! Nothing is shared or registered here; the result lists the compiled
//! declarations so the caller can commit them. A file either transforms
//! completely or fails with a [`TransformError`] naming the file, position,
//! and offending construct.

mod rewrite;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::compile::{CompiledRule, StyleCompiler, StyleWarning};
use crate::config::StyleConfig;
use crate::eval::{evaluate_declaration, EvalError};
use crate::identity::ClassIdentity;
use crate::literal::StyleLiteral;
use crate::syntax::{
    FactoryCall, JsxAttributeValue, JsxOpeningElement, KeyKind, LineIndex, Location, MemberKind,
    Node, NodeKind, SourceParser, Span, SyntaxError,
};

pub use rewrite::{Edit, OverlappingEdits, Rewriter};

/// Error returned when a file cannot be transformed.
///
/// Displays as `<path>:<line>:<column>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    #[error("{}:{location}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        location: Location,
        #[source]
        source: SyntaxError,
    },
    #[error("{}:{location}: {source}", path.display())]
    Eval {
        path: PathBuf,
        location: Location,
        #[source]
        source: EvalError,
    },
    #[error("{}:{location}: style declaration overlaps another rewritten region", path.display())]
    Overlap { path: PathBuf, location: Location },
}

impl TransformError {
    pub fn path(&self) -> &Path {
        match self {
            TransformError::Syntax { path, .. }
            | TransformError::Eval { path, .. }
            | TransformError::Overlap { path, .. } => path,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            TransformError::Syntax { location, .. }
            | TransformError::Eval { location, .. }
            | TransformError::Overlap { location, .. } => *location,
        }
    }
}

/// One compiled style declaration found in a file.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub identity: ClassIdentity,
    pub class_name: String,
    pub rule: CompiledRule,
    /// The declaration expression in the original source.
    pub span: Span,
    pub location: Location,
    pub warnings: Vec<StyleWarning>,
}

/// The outcome of transforming one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTransform {
    /// The rewritten source; equal to the input when nothing was found.
    pub code: String,
    /// Applied edits, sorted by position in the input.
    pub edits: Vec<Edit>,
    /// Declarations in source order. Equal declarations appear once per site.
    pub declarations: Vec<Declaration>,
}

impl FileTransform {
    fn unchanged(source: &str) -> Self {
        Self {
            code: source.to_string(),
            edits: Vec::new(),
            declarations: Vec::new(),
        }
    }

    pub fn is_changed(&self) -> bool {
        !self.edits.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = ClassIdentity> + '_ {
        self.declarations.iter().map(|d| d.identity)
    }

    /// Serializable mapping info: edits against the original text.
    pub fn mapping(&self) -> MappingInfo<'_> {
        MappingInfo { edits: &self.edits }
    }
}

/// Position mapping from a transformed file back to its input.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MappingInfo<'a> {
    pub edits: &'a [Edit],
}

impl MappingInfo<'_> {
    /// Output offset of an input offset.
    pub fn map_offset(&self, offset: usize) -> usize {
        Edit::map_offset(self.edits, offset)
    }
}

/// Rewrites style declarations in source files.
pub struct Transformer<'a> {
    config: &'a StyleConfig,
    parser: &'a dyn SourceParser,
    compiler: StyleCompiler,
}

impl<'a> Transformer<'a> {
    pub fn new(config: &'a StyleConfig, parser: &'a dyn SourceParser) -> Self {
        Self {
            config,
            parser,
            compiler: StyleCompiler::new(config.theme_prefix.clone()),
        }
    }

    /// Transforms one file.
    ///
    /// Files that mention neither the style attribute nor the factory are
    /// returned unchanged without being parsed.
    pub fn transform(&self, path: &Path, source: &str) -> Result<FileTransform, TransformError> {
        if !source.contains(&self.config.attribute) && !source.contains(&self.config.styles_factory) {
            return Ok(FileTransform::unchanged(source));
        }

        let lines = LineIndex::new(source);
        let tree = self.parser.parse(path, source).map_err(|err| TransformError::Syntax {
            path: path.to_path_buf(),
            location: lines.location(err.offset()),
            source: err,
        })?;

        let eval_error = |err: EvalError| TransformError::Eval {
            path: path.to_path_buf(),
            location: lines.location(err.span().start),
            source: err,
        };

        let mut rewriter = Rewriter::new(source);
        let mut declarations = Vec::new();

        for element in &tree.elements {
            if let Some(declaration) = self
                .rewrite_element(element, source, &lines, &mut rewriter)
                .map_err(eval_error)?
            {
                declarations.push(declaration);
            }
        }
        for call in &tree.factory_calls {
            let found = self
                .rewrite_factory_call(call, &lines, &mut rewriter)
                .map_err(eval_error)?;
            declarations.extend(found);
        }

        if rewriter.is_empty() {
            return Ok(FileTransform::unchanged(source));
        }
        declarations.sort_by_key(|d| d.span.start);

        if self.config.inject_import && !declarations.is_empty() {
            rewriter.insert(
                import_offset(source),
                format!("import '{}';\n", self.config.virtual_module),
            );
        }

        let (code, edits) = rewriter.finish().map_err(|overlap| TransformError::Overlap {
            path: path.to_path_buf(),
            location: lines.location(overlap.second.start),
        })?;

        for declaration in &declarations {
            for warning in &declaration.warnings {
                log::warn!("{}:{}: {}", path.display(), declaration.location, warning);
            }
        }
        log::debug!(
            "{}: {} declaration(s) -> {}",
            path.display(),
            declarations.len(),
            declarations
                .iter()
                .map(|d| d.class_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(FileTransform {
            code,
            edits,
            declarations,
        })
    }

    fn compile_declaration(&self, node: &Node, lines: &LineIndex<'_>) -> Result<Declaration, EvalError> {
        let style = evaluate_declaration(node)?;
        let identity = ClassIdentity::of(&StyleLiteral::Object(style.clone()));
        let class_name = identity.class_name(&self.config.class_prefix);
        let (rule, warnings) = self.compiler.compile_with_warnings(&style, &class_name);
        Ok(Declaration {
            identity,
            class_name,
            rule,
            span: node.span,
            location: lines.location(node.span.start),
            warnings,
        })
    }

    fn rewrite_element(
        &self,
        element: &JsxOpeningElement,
        source: &str,
        lines: &LineIndex<'_>,
        rewriter: &mut Rewriter<'_>,
    ) -> Result<Option<Declaration>, EvalError> {
        let Some(style_attr) = element.attribute(&self.config.attribute) else {
            return Ok(None);
        };
        let node = match &style_attr.value {
            JsxAttributeValue::Expression { node: Some(node), .. } => node,
            other => {
                let (kind, span) = match other {
                    JsxAttributeValue::None => ("BooleanLiteral", style_attr.span),
                    JsxAttributeValue::String { span, .. } => ("StringLiteral", *span),
                    JsxAttributeValue::Element { span } => ("JSXElement", *span),
                    JsxAttributeValue::Expression { span, .. } => ("JSXEmptyExpression", *span),
                };
                return Err(EvalError::NotAnObject { kind, span });
            }
        };

        let declaration = self.compile_declaration(node, lines)?;
        let class_name = &declaration.class_name;
        let class_attr = element
            .attributes
            .iter()
            .find(|a| a.name == self.config.class_attribute);

        let fresh = format!("{}=\"{}\"", self.config.class_attribute, class_name);
        match class_attr.map(|a| (a, &a.value)) {
            None => rewriter.replace(style_attr.span, fresh),
            Some((_, JsxAttributeValue::String { value, quote, span })) => {
                // keep the original quote; the old value may contain the other one
                let merged = if value.trim().is_empty() {
                    format!("{q}{}{q}", class_name, q = quote)
                } else {
                    format!("{q}{} {}{q}", value, class_name, q = quote)
                };
                rewriter.replace(*span, merged);
                rewriter.remove_with_leading_space(style_attr.span);
            }
            Some((_, JsxAttributeValue::Expression { span, .. })) if !span.is_empty() => {
                let old = span.slice(source);
                rewriter.replace(
                    *span,
                    format!("[{}, \"{}\"].filter(Boolean).join(\" \")", old, class_name),
                );
                rewriter.remove_with_leading_space(style_attr.span);
            }
            Some((attr, _)) => {
                rewriter.replace(attr.span, fresh);
                rewriter.remove_with_leading_space(style_attr.span);
            }
        }
        Ok(Some(declaration))
    }

    fn rewrite_factory_call(
        &self,
        call: &FactoryCall,
        lines: &LineIndex<'_>,
        rewriter: &mut Rewriter<'_>,
    ) -> Result<Vec<Declaration>, EvalError> {
        let Some(argument) = &call.argument else {
            return Err(EvalError::NotAnObject {
                kind: "EmptyArguments",
                span: call.span,
            });
        };
        let NodeKind::Object(members) = &argument.kind else {
            return Err(EvalError::NotAnObject {
                kind: argument.kind_name(),
                span: argument.span,
            });
        };

        let mut entries = Vec::with_capacity(members.len());
        let mut declarations = Vec::with_capacity(members.len());
        for member in members {
            let MemberKind::Property { key, value, .. } = &member.kind else {
                return Err(EvalError::UnsupportedExpression {
                    kind: member.kind.name(),
                    span: member.span,
                });
            };
            let key_text = match &key.kind {
                KeyKind::Identifier(name) => name.clone(),
                KeyKind::String(name) if !name.is_empty() => {
                    serde_json::Value::String(name.clone()).to_string()
                }
                KeyKind::String(_) => {
                    return Err(EvalError::UnsupportedKey {
                        kind: "EmptyString",
                        span: key.span,
                    })
                }
                other => {
                    return Err(EvalError::UnsupportedKey {
                        kind: other.name(),
                        span: key.span,
                    })
                }
            };
            let declaration = self.compile_declaration(value, lines)?;
            entries.push(format!("{}: \"{}\"", key_text, declaration.class_name));
            declarations.push(declaration);
        }

        let replacement = if entries.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", entries.join(", "))
        };
        rewriter.replace(call.span, replacement);
        Ok(declarations)
    }
}

/// Where the injected import goes: after a leading `#!` line, else at the
/// very start.
fn import_offset(source: &str) -> usize {
    if source.starts_with("#!") {
        source.find('\n').map_or(source.len(), |i| i + 1)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::JsxScanner;

    fn scanner(config: &StyleConfig) -> JsxScanner {
        JsxScanner::new(config.attribute.clone()).with_styles_factory(config.styles_factory.clone())
    }

    fn run(source: &str) -> Result<FileTransform, TransformError> {
        let config = StyleConfig::default();
        let parser = scanner(&config);
        Transformer::new(&config, &parser).transform(Path::new("src/App.tsx"), source)
    }

    fn class_of(json: &str) -> String {
        let literal: StyleLiteral = serde_json::from_str(json).unwrap();
        ClassIdentity::of(&literal).class_name("zx")
    }

    const IMPORT: &str = "import 'virtual:style-zx.css';\n";

    // =========================================================================
    // Attribute rewriting
    // =========================================================================

    #[test]
    fn test_adds_class_attribute() {
        let out = run("const a = <div zx={{ p: 4 }}>hi</div>;").unwrap();
        let cls = class_of(r#"{"p": 4}"#);
        assert_eq!(
            out.code,
            format!("{}const a = <div className=\"{}\">hi</div>;", IMPORT, cls)
        );
        assert_eq!(out.declarations.len(), 1);
        assert_eq!(out.declarations[0].class_name, cls);
        assert_eq!(
            out.declarations[0].rule.css(),
            format!(".{} {{\n  padding: 4px;\n}}", cls)
        );
    }

    #[test]
    fn test_appends_to_string_class() {
        let out = run("x = <div className=\"card\" zx={{ m: 0 }} />").unwrap();
        let cls = class_of(r#"{"m": 0}"#);
        assert_eq!(
            out.code,
            format!("{}x = <div className=\"card {}\" />", IMPORT, cls)
        );
    }

    #[test]
    fn test_class_after_style_attribute() {
        let out = run("x = <div zx={{ m: 0 }} className='card'/>").unwrap();
        let cls = class_of(r#"{"m": 0}"#);
        assert_eq!(out.code, format!("{}x = <div className='card {}'/>", IMPORT, cls));
    }

    #[test]
    fn test_class_quote_style_preserved() {
        let out = run("x = <div className='say \"hi\"' zx={{ p: 1 }} />").unwrap();
        assert_eq!(
            out.code,
            format!("{}x = <div className='say \"hi\" zx-eee32217' />", IMPORT)
        );
    }

    #[test]
    fn test_wraps_expression_class() {
        let out = run("x = <div className={ active && 'on' } zx={{ m: 0 }} />").unwrap();
        let cls = class_of(r#"{"m": 0}"#);
        assert_eq!(
            out.code,
            format!(
                "{}x = <div className={{ [active && 'on', \"{}\"].filter(Boolean).join(\" \") }} />",
                IMPORT, cls
            )
        );
    }

    #[test]
    fn test_empty_string_class() {
        let out = run("x = <div className=\"\" zx={{ m: 0 }} />").unwrap();
        let cls = class_of(r#"{"m": 0}"#);
        assert_eq!(out.code, format!("{}x = <div className=\"{}\" />", IMPORT, cls));
    }

    #[test]
    fn test_bare_class_attribute() {
        let out = run("x = <div className zx={{ m: 0 }} />").unwrap();
        let cls = class_of(r#"{"m": 0}"#);
        assert_eq!(out.code, format!("{}x = <div className=\"{}\" />", IMPORT, cls));
    }

    #[test]
    fn test_equal_declarations_share_class() {
        let out = run("x = <><a zx={{ p: 1, m: 2 }} /><b zx={{ m: 2, p: 1 }} /></>").unwrap();
        assert_eq!(out.declarations.len(), 2);
        assert_eq!(out.declarations[0].identity, out.declarations[1].identity);
    }

    #[test]
    fn test_nested_elements_rewritten() {
        let out = run("x = <ul zx={{ p: 0 }}>{items.map(i => <li key={i} zx={{ p: 1 }} />)}</ul>").unwrap();
        let outer = class_of(r#"{"p": 0}"#);
        let inner = class_of(r#"{"p": 1}"#);
        assert_eq!(
            out.code,
            format!(
                "{}x = <ul className=\"{}\">{{items.map(i => <li key={{i}} className=\"{}\" />)}}</ul>",
                IMPORT, outer, inner
            )
        );
    }

    #[test]
    fn test_untouched_without_declarations() {
        let src = "export const zx = 1;\nconst a = <div className=\"x\" />;";
        let out = run(src).unwrap();
        assert_eq!(out.code, src);
        assert!(!out.is_changed());
        assert!(out.declarations.is_empty());
    }

    #[test]
    fn test_skips_parse_when_nothing_mentioned() {
        // not valid JSX, but never parsed
        let out = run("const a = <div").unwrap();
        assert!(!out.is_changed());
    }

    #[test]
    fn test_import_after_shebang() {
        let out = run("#!/usr/bin/env node\nx = <i zx={{}} />").unwrap();
        assert!(out.code.starts_with(&format!("#!/usr/bin/env node\n{}x = <i", IMPORT)));
    }

    #[test]
    fn test_import_not_injected_when_disabled() {
        let config = StyleConfig {
            inject_import: false,
            ..StyleConfig::default()
        };
        let parser = scanner(&config);
        let out = Transformer::new(&config, &parser)
            .transform(Path::new("a.jsx"), "x = <i zx={{}} />")
            .unwrap();
        assert!(!out.code.contains("import"));
    }

    #[test]
    fn test_custom_names() {
        let config = StyleConfig {
            attribute: "sx".into(),
            class_attribute: "class".into(),
            class_prefix: "app".into(),
            ..StyleConfig::default()
        };
        let parser = scanner(&config);
        let out = Transformer::new(&config, &parser)
            .transform(Path::new("a.jsx"), "x = <i sx={{ p: 1 }} zx={{ p: 2 }} />")
            .unwrap();
        let literal: StyleLiteral = serde_json::from_str(r#"{"p": 1}"#).unwrap();
        let cls = ClassIdentity::of(&literal).class_name("app");
        assert!(out.code.contains(&format!("<i class=\"{}\" zx={{{{ p: 2 }}}} />", cls)));
    }

    // =========================================================================
    // createStyles
    // =========================================================================

    #[test]
    fn test_factory_call_replaced() {
        let src = "const styles = createStyles({ card: { p: 4 }, 'big-title': { fontSize: 20 } });";
        let out = run(src).unwrap();
        let card = class_of(r#"{"p": 4}"#);
        let title = class_of(r#"{"fontSize": 20}"#);
        assert_eq!(
            out.code,
            format!(
                "{}const styles = {{ card: \"{}\", \"big-title\": \"{}\" }};",
                IMPORT, card, title
            )
        );
        assert_eq!(out.declarations.len(), 2);
    }

    #[test]
    fn test_empty_factory_call() {
        let out = run("const s = createStyles({});").unwrap();
        assert_eq!(out.code, "const s = {};");
        assert!(out.declarations.is_empty());
    }

    #[test]
    fn test_factory_member_must_be_object() {
        let err = run("const s = createStyles({ card: 'red' });").unwrap_err();
        assert!(matches!(
            err,
            TransformError::Eval {
                source: EvalError::NotAnObject {
                    kind: "StringLiteral",
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn test_factory_without_object_argument() {
        for (src, kind) in [
            ("const s = createStyles();", "EmptyArguments"),
            ("const s = createStyles(base);", "Identifier"),
        ] {
            match run(src) {
                Err(TransformError::Eval {
                    source: EvalError::NotAnObject { kind: found, .. },
                    ..
                }) => assert_eq!(found, kind, "for {}", src),
                other => panic!("Expected NotAnObject for {}, got {:?}", src, other),
            }
        }
    }

    #[test]
    fn test_factory_empty_key_rejected() {
        let err = run("const s = createStyles({ '': { p: 1 } });").unwrap_err();
        assert!(matches!(
            err,
            TransformError::Eval {
                source: EvalError::UnsupportedKey {
                    kind: "EmptyString",
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn test_factory_spread_rejected() {
        let err = run("const s = createStyles({ ...base });").unwrap_err();
        assert!(matches!(
            err,
            TransformError::Eval {
                source: EvalError::UnsupportedExpression {
                    kind: "SpreadElement",
                    ..
                },
                ..
            }
        ));
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_call_rejected_with_location() {
        let err = run("const a = 1;\nconst b = <div zx={{ color: pick() }} />;").unwrap_err();
        assert_eq!(err.path(), Path::new("src/App.tsx"));
        assert_eq!(err.location(), Location { line: 2, column: 29 });
        assert_eq!(
            err.to_string(),
            "src/App.tsx:2:29: unsupported expression in style declaration: CallExpression \
             (only literal values and object literals are allowed)"
        );
    }

    #[test]
    fn test_non_object_attribute_rejected() {
        for (src, kind) in [
            ("x = <i zx={styles.card} />", "MemberExpression"),
            ("x = <i zx=\"p-4\" />", "StringLiteral"),
            ("x = <i zx />", "BooleanLiteral"),
            ("x = <i zx={} />", "JSXEmptyExpression"),
        ] {
            match run(src) {
                Err(TransformError::Eval {
                    source: EvalError::NotAnObject { kind: found, .. },
                    ..
                }) => assert_eq!(found, kind, "for {}", src),
                other => panic!("Expected NotAnObject for {}, got {:?}", src, other),
            }
        }
    }

    #[test]
    fn test_syntax_error_reported() {
        let err = run("const a = 1;\nx = <div zx={{ p: }} />").unwrap_err();
        assert!(matches!(err, TransformError::Syntax { .. }));
        assert_eq!(err.location().line, 2);
        assert!(err.to_string().starts_with("src/App.tsx:2:"));
    }

    #[test]
    fn test_warnings_attached() {
        let out = run("x = <i zx={{ bg: '$theme.' }} />").unwrap();
        assert_eq!(
            out.declarations[0].warnings,
            vec![StyleWarning::MalformedThemeReference {
                reference: "$theme.".into()
            }]
        );
    }

    #[test]
    fn test_mapping_info() {
        let src = "x = <i zx={{}} />;";
        let out = run(src).unwrap();
        let mapping = out.mapping();
        let semicolon = src.len() - 1;
        assert_eq!(&out.code[mapping.map_offset(semicolon)..], ";");
        assert_eq!(out.edits[0].start, 0);
    }
}
