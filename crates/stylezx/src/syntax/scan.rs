//! The built-in JS/TS/JSX scanner, backed by `oxc_parser`.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, CallExpression, Expression, JSXAttributeItem, JSXAttributeName,
    JSXAttributeValue as OxcAttributeValue, JSXExpression, JSXOpeningElement, ObjectExpression,
    ObjectPropertyKind, PropertyKey as OxcPropertyKey, PropertyKind,
};
use oxc_ast::{AstKind, Visit};
use oxc_diagnostics::OxcDiagnostic;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};

use super::node::{
    FactoryCall, JsxAttribute, JsxAttributeValue, JsxOpeningElement as Element, KeyKind,
    MemberKind, Node, NodeKind, ObjectMember, PropertyKey, SourceTree, Span,
};
use super::{SourceParser, SyntaxError};

/// Scans JS/TS/JSX sources for JSX elements and style-map factory calls.
///
/// The whole file is parsed, but only the style attribute's value and the
/// factory's argument are converted into [`Node`] trees; other attributes
/// keep just their spans.
///
/// The dialect follows the file extension: `.ts`, `.mts`, and `.cts` files
/// have no JSX, so `<T>(x: T) => x` reads as a generic.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use stylezx::syntax::{JsxScanner, SourceParser};
///
/// let scanner = JsxScanner::new("zx");
/// let tree = scanner
///     .parse(Path::new("App.tsx"), r#"const a = <div zx={{ p: 4 }}>hi</div>;"#)
///     .unwrap();
/// assert_eq!(tree.elements.len(), 1);
/// assert!(tree.elements[0].attribute("zx").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct JsxScanner {
    style_attribute: String,
    styles_factory: Option<String>,
}

impl JsxScanner {
    /// Creates a scanner that parses values of `style_attribute`.
    pub fn new(style_attribute: impl Into<String>) -> Self {
        Self {
            style_attribute: style_attribute.into(),
            styles_factory: None,
        }
    }

    /// Also records calls of the named style-map factory.
    pub fn with_styles_factory(mut self, name: impl Into<String>) -> Self {
        self.styles_factory = Some(name.into());
        self
    }

    pub fn style_attribute(&self) -> &str {
        &self.style_attribute
    }
}

impl Default for JsxScanner {
    fn default() -> Self {
        Self::new("zx").with_styles_factory("createStyles")
    }
}

impl SourceParser for JsxScanner {
    fn parse(&self, path: &Path, source: &str) -> Result<SourceTree, SyntaxError> {
        let allocator = Allocator::default();
        let source_type =
            SourceType::from_path(path).unwrap_or_else(|_| SourceType::default().with_jsx(true));
        let parsed = Parser::new(&allocator, source, source_type).parse();
        if let Some(error) = parsed.errors.first() {
            return Err(syntax_error(error));
        }

        let mut collector = Collector {
            source,
            scanner: self,
            tree: SourceTree::default(),
        };
        collector.visit_program(&parsed.program);

        let mut tree = collector.tree;
        tree.elements.sort_by_key(|el| el.span.start);
        tree.factory_calls.sort_by_key(|call| call.span.start);
        Ok(tree)
    }
}

fn syntax_error(error: &OxcDiagnostic) -> SyntaxError {
    let offset = error
        .labels
        .as_ref()
        .and_then(|labels| labels.first())
        .map_or(0, |label| label.offset());
    SyntaxError {
        message: error.message.to_string(),
        offset,
    }
}

/// Walks a parsed program, converting what the transform needs.
struct Collector<'s> {
    source: &'s str,
    scanner: &'s JsxScanner,
    tree: SourceTree,
}

impl<'a> Visit<'a> for Collector<'_> {
    fn enter_node(&mut self, kind: AstKind<'a>) {
        match kind {
            AstKind::JSXOpeningElement(element) => {
                let element = self.element(element);
                self.tree.elements.push(element);
            }
            AstKind::CallExpression(call) => {
                if let Some(call) = self.factory_call(call) {
                    self.tree.factory_calls.push(call);
                }
            }
            _ => {}
        }
    }
}

impl Collector<'_> {
    fn slice(&self, span: oxc_span::Span) -> &str {
        &self.source[span.start as usize..span.end as usize]
    }

    fn element(&self, element: &JSXOpeningElement<'_>) -> Element {
        let attributes = element
            .attributes
            .iter()
            .filter_map(|item| match item {
                JSXAttributeItem::Attribute(attr) => Some(attr),
                JSXAttributeItem::SpreadAttribute(_) => None,
            })
            .map(|attr| {
                let name = match &attr.name {
                    JSXAttributeName::Identifier(ident) => ident.name.to_string(),
                    JSXAttributeName::NamespacedName(name) => self.slice(name.span).to_string(),
                };
                let value = match &attr.value {
                    None => JsxAttributeValue::None,
                    Some(value) => self.attribute_value(&name, value),
                };
                JsxAttribute {
                    name,
                    span: span(attr.span),
                    value,
                }
            })
            .collect();

        Element {
            name: self.slice(element.name.span()).to_string(),
            span: span(element.span),
            attributes,
        }
    }

    fn attribute_value(&self, name: &str, value: &OxcAttributeValue<'_>) -> JsxAttributeValue {
        match value {
            OxcAttributeValue::StringLiteral(lit) => {
                let raw = self.slice(lit.span);
                let quote = raw.chars().next().unwrap_or('"');
                JsxAttributeValue::String {
                    value: raw.get(1..raw.len().saturating_sub(1)).unwrap_or("").to_string(),
                    quote,
                    span: span(lit.span),
                }
            }
            OxcAttributeValue::ExpressionContainer(container) => match &container.expression {
                JSXExpression::EmptyExpression(empty) => JsxAttributeValue::Expression {
                    span: Span::new(empty.span.start as usize, empty.span.start as usize),
                    node: None,
                },
                expr => {
                    let expr_span = span(expr.span());
                    let node = if name == self.scanner.style_attribute {
                        expr.as_expression().map(convert)
                    } else {
                        None
                    };
                    JsxAttributeValue::Expression {
                        span: expr_span,
                        node,
                    }
                }
            },
            OxcAttributeValue::Element(element) => JsxAttributeValue::Element {
                span: span(element.span),
            },
            OxcAttributeValue::Fragment(fragment) => JsxAttributeValue::Element {
                span: span(fragment.span),
            },
        }
    }

    fn factory_call(&self, call: &CallExpression<'_>) -> Option<FactoryCall> {
        let factory = self.scanner.styles_factory.as_deref()?;
        match &call.callee {
            Expression::Identifier(ident) if ident.name.as_str() == factory => {}
            _ => return None,
        }
        let argument = call.arguments.first().and_then(|arg| match arg {
            Argument::SpreadElement(_) => None,
            arg => arg.as_expression().map(convert),
        });
        Some(FactoryCall {
            span: span(call.span),
            argument,
        })
    }
}

fn span(span: oxc_span::Span) -> Span {
    Span::new(span.start as usize, span.end as usize)
}

/// Converts an expression into a [`Node`]. Parentheses are transparent.
fn convert(expr: &Expression<'_>) -> Node {
    let kind = match expr {
        Expression::ParenthesizedExpression(paren) => return convert(&paren.expression),
        Expression::StringLiteral(lit) => NodeKind::StringLiteral(lit.value.to_string()),
        Expression::NumericLiteral(lit) => NodeKind::NumericLiteral(lit.value),
        Expression::BooleanLiteral(lit) => NodeKind::BooleanLiteral(lit.value),
        Expression::NullLiteral(_) => NodeKind::NullLiteral,
        Expression::Identifier(ident) => NodeKind::Identifier(ident.name.to_string()),
        Expression::UnaryExpression(unary) => NodeKind::Unary {
            operator: unary.operator.as_str(),
            argument: Box::new(convert(&unary.argument)),
        },
        Expression::ObjectExpression(object) => NodeKind::Object(members(object)),
        other => NodeKind::Other(expression_name(other)),
    };
    Node::new(kind, span(expr.span()))
}

fn members(object: &ObjectExpression<'_>) -> Vec<ObjectMember> {
    object
        .properties
        .iter()
        .map(|property| match property {
            ObjectPropertyKind::ObjectProperty(prop) => {
                let key = property_key(&prop.key, prop.computed);
                let kind = if prop.method || !matches!(prop.kind, PropertyKind::Init) {
                    MemberKind::Method { key }
                } else {
                    MemberKind::Property {
                        key,
                        value: convert(&prop.value),
                        shorthand: prop.shorthand,
                    }
                };
                ObjectMember {
                    kind,
                    span: span(prop.span),
                }
            }
            ObjectPropertyKind::SpreadProperty(spread) => ObjectMember {
                kind: MemberKind::Spread(convert(&spread.argument)),
                span: span(spread.span),
            },
        })
        .collect()
}

fn property_key(key: &OxcPropertyKey<'_>, computed: bool) -> PropertyKey {
    let kind = if computed {
        KeyKind::Computed
    } else {
        match key {
            OxcPropertyKey::StaticIdentifier(ident) => KeyKind::Identifier(ident.name.to_string()),
            OxcPropertyKey::StringLiteral(lit) => KeyKind::String(lit.value.to_string()),
            OxcPropertyKey::NumericLiteral(lit) => KeyKind::Number(lit.value),
            OxcPropertyKey::PrivateIdentifier(_) => KeyKind::Other("PrivateIdentifier"),
            _ => KeyKind::Other("BigIntLiteral"),
        }
    };
    PropertyKey {
        kind,
        span: span(key.span()),
    }
}

/// ESTree name of an expression the evaluator never accepts.
fn expression_name(expr: &Expression<'_>) -> &'static str {
    match expr {
        _ if expr.is_member_expression() => "MemberExpression",
        Expression::BigIntLiteral(_) => "BigIntLiteral",
        Expression::RegExpLiteral(_) => "RegExpLiteral",
        Expression::TemplateLiteral(_) => "TemplateLiteral",
        Expression::TaggedTemplateExpression(_) => "TaggedTemplateExpression",
        Expression::ArrayExpression(_) => "ArrayExpression",
        Expression::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
        Expression::FunctionExpression(_) => "FunctionExpression",
        Expression::ClassExpression(_) => "ClassExpression",
        Expression::AssignmentExpression(_) => "AssignmentExpression",
        Expression::AwaitExpression(_) => "AwaitExpression",
        Expression::YieldExpression(_) => "YieldExpression",
        Expression::BinaryExpression(_) => "BinaryExpression",
        Expression::LogicalExpression(_) => "LogicalExpression",
        Expression::ConditionalExpression(_) => "ConditionalExpression",
        Expression::SequenceExpression(_) => "SequenceExpression",
        Expression::CallExpression(_) => "CallExpression",
        Expression::ChainExpression(_) => "ChainExpression",
        Expression::NewExpression(_) => "NewExpression",
        Expression::ImportExpression(_) => "ImportExpression",
        Expression::UpdateExpression(_) => "UpdateExpression",
        Expression::ThisExpression(_) => "ThisExpression",
        Expression::Super(_) => "Super",
        Expression::MetaProperty(_) => "MetaProperty",
        Expression::JSXElement(_) => "JSXElement",
        Expression::JSXFragment(_) => "JSXFragment",
        Expression::TSAsExpression(_) => "TSAsExpression",
        Expression::TSSatisfiesExpression(_) => "TSSatisfiesExpression",
        Expression::TSTypeAssertion(_) => "TSTypeAssertion",
        Expression::TSNonNullExpression(_) => "TSNonNullExpression",
        _ => "Expression",
    }
}
