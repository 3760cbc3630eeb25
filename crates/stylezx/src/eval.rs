//! Static evaluation of style declarations.
//!
//! A style declaration must be knowable at build time. The evaluator walks a
//! parsed expression and accepts only:
//!
//! - string, number, boolean, and `null` literals
//! - unary negation of a numeric literal (`-4`)
//! - object literals whose keys are identifiers or string literals and whose
//!   values are themselves accepted
//!
//! Anything else (identifiers, calls, member access, templates, arrays,
//! conditionals, spreads, methods) fails immediately with the node's kind and
//! span. There is no partial evaluation: one unsupported value anywhere in the
//! tree rejects the whole declaration.
//!
//! # Example
//!
//! ```rust
//! use std::path::Path;
//! use stylezx::eval::evaluate_declaration;
//! use stylezx::syntax::{JsxAttributeValue, JsxScanner, SourceParser};
//!
//! let src = "x = <div zx={{ p: 4, '&:hover': { opacity: 0.9 } }} />";
//! let tree = JsxScanner::default().parse(Path::new("a.jsx"), src).unwrap();
//! let JsxAttributeValue::Expression { node: Some(node), .. } =
//!     &tree.elements[0].attribute("zx").unwrap().value else { unreachable!() };
//!
//! let style = evaluate_declaration(node).unwrap();
//! assert_eq!(style.len(), 2);
//! ```

use crate::literal::{StyleLiteral, StyleMap};
use crate::syntax::{KeyKind, MemberKind, Node, NodeKind, Span};

/// Error returned when a declaration is not a static style literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A value is not a literal, negated number, or object literal.
    #[error("unsupported expression in style declaration: {kind} (only literal values and object literals are allowed)")]
    UnsupportedExpression { kind: &'static str, span: Span },
    /// An object key is not a fixed, non-empty identifier or string.
    #[error("unsupported key in style declaration: {kind} (keys must be identifiers or non-empty string literals)")]
    UnsupportedKey { kind: &'static str, span: Span },
    /// A declaration's top level is not an object literal.
    #[error("style declaration must be an object literal, found {kind}")]
    NotAnObject { kind: &'static str, span: Span },
}

impl EvalError {
    /// Location of the offending node.
    pub fn span(&self) -> Span {
        match self {
            EvalError::UnsupportedExpression { span, .. }
            | EvalError::UnsupportedKey { span, .. }
            | EvalError::NotAnObject { span, .. } => *span,
        }
    }

    /// ESTree name of the offending node.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::UnsupportedExpression { kind, .. }
            | EvalError::UnsupportedKey { kind, .. }
            | EvalError::NotAnObject { kind, .. } => kind,
        }
    }
}

/// Evaluates any accepted expression into a literal.
pub fn evaluate(node: &Node) -> Result<StyleLiteral, EvalError> {
    match &node.kind {
        NodeKind::StringLiteral(s) => Ok(StyleLiteral::String(s.clone())),
        NodeKind::NumericLiteral(n) => Ok(StyleLiteral::Number(*n)),
        NodeKind::BooleanLiteral(b) => Ok(StyleLiteral::Bool(*b)),
        NodeKind::NullLiteral => Ok(StyleLiteral::Null),
        NodeKind::Unary { operator, argument } if *operator == "-" => match argument.kind {
            // `-0` and `0` are the same style
            NodeKind::NumericLiteral(n) => Ok(StyleLiteral::Number(if n == 0.0 { 0.0 } else { -n })),
            _ => Err(unsupported(node)),
        },
        NodeKind::Object(_) => evaluate_object(node).map(StyleLiteral::Object),
        _ => Err(unsupported(node)),
    }
}

/// Evaluates a style declaration, which must be an object literal.
pub fn evaluate_declaration(node: &Node) -> Result<StyleMap, EvalError> {
    match node.kind {
        NodeKind::Object(_) => evaluate_object(node),
        _ => Err(EvalError::NotAnObject {
            kind: node.kind_name(),
            span: node.span,
        }),
    }
}

fn evaluate_object(node: &Node) -> Result<StyleMap, EvalError> {
    let NodeKind::Object(members) = &node.kind else {
        return Err(unsupported(node));
    };

    let mut map = StyleMap::with_capacity(members.len());
    for member in members {
        match &member.kind {
            MemberKind::Property { key, value, .. } => {
                let name = match &key.kind {
                    KeyKind::String(name) if name.is_empty() => {
                        return Err(EvalError::UnsupportedKey {
                            kind: "EmptyString",
                            span: key.span,
                        })
                    }
                    KeyKind::Identifier(name) | KeyKind::String(name) => name.clone(),
                    other => {
                        return Err(EvalError::UnsupportedKey {
                            kind: other.name(),
                            span: key.span,
                        })
                    }
                };
                // Later duplicates win, keeping the first key's position.
                map.insert(name, evaluate(value)?);
            }
            other => {
                return Err(EvalError::UnsupportedExpression {
                    kind: other.name(),
                    span: member.span,
                })
            }
        }
    }
    Ok(map)
}

fn unsupported(node: &Node) -> EvalError {
    EvalError::UnsupportedExpression {
        kind: node.kind_name(),
        span: node.span,
    }
}
