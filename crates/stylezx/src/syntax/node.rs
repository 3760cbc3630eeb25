//! Syntax tree types produced by a [`SourceParser`](super::SourceParser).

use std::fmt;

/// A half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the spanned slice of `source`.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// An expression node with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// The conventional ESTree name of this node's kind.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }
}

/// Expression kinds.
///
/// Only literals, negation, and object literals carry their contents; every
/// other kind is recorded by its ESTree name alone, which is all a static
/// evaluator needs to reject it.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    StringLiteral(String),
    NumericLiteral(f64),
    BooleanLiteral(bool),
    NullLiteral,
    Unary {
        operator: &'static str,
        argument: Box<Node>,
    },
    Object(Vec<ObjectMember>),
    Identifier(String),
    Other(&'static str),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::StringLiteral(_) => "StringLiteral",
            NodeKind::NumericLiteral(_) => "NumericLiteral",
            NodeKind::BooleanLiteral(_) => "BooleanLiteral",
            NodeKind::NullLiteral => "NullLiteral",
            NodeKind::Unary { .. } => "UnaryExpression",
            NodeKind::Object(_) => "ObjectExpression",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::Other(name) => name,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One member of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMember {
    pub kind: MemberKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    /// `key: value`, or the shorthand `key` (value is then an identifier).
    Property {
        key: PropertyKey,
        value: Node,
        shorthand: bool,
    },
    /// `...expr`
    Spread(Node),
    /// `key() {}`, getters, setters, generators.
    Method { key: PropertyKey },
}

impl MemberKind {
    pub fn name(&self) -> &'static str {
        match self {
            MemberKind::Property { .. } => "ObjectProperty",
            MemberKind::Spread(_) => "SpreadElement",
            MemberKind::Method { .. } => "ObjectMethod",
        }
    }
}

/// A property key with its location.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyKey {
    pub kind: KeyKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyKind {
    Identifier(String),
    String(String),
    Number(f64),
    /// `[expr]`
    Computed,
    /// Big-integer and private keys.
    Other(&'static str),
}

impl KeyKind {
    pub fn name(&self) -> &'static str {
        match self {
            KeyKind::Identifier(_) => "Identifier",
            KeyKind::String(_) => "StringLiteral",
            KeyKind::Number(_) => "NumericLiteral",
            KeyKind::Computed => "ComputedKey",
            KeyKind::Other(name) => name,
        }
    }
}

/// A JSX opening tag such as `<div zx={{ p: 4 }} className="card">`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxOpeningElement {
    pub name: String,
    pub span: Span,
    pub attributes: Vec<JsxAttribute>,
}

impl JsxOpeningElement {
    /// Returns the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&JsxAttribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

/// A named JSX attribute. Spread attributes are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct JsxAttribute {
    pub name: String,
    /// The whole attribute, name through end of value.
    pub span: Span,
    pub value: JsxAttributeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsxAttributeValue {
    /// A bare attribute such as `disabled`.
    None,
    /// `name="value"`; the span covers the quotes and `value` is the raw
    /// text between them.
    String {
        value: String,
        quote: char,
        span: Span,
    },
    /// `name={expr}`; the span covers the expression without braces or
    /// surrounding whitespace. `node` is only parsed for the style attribute.
    Expression { span: Span, node: Option<Node> },
    /// `name=<Element />`
    Element { span: Span },
}

/// A call to the static style-map factory, e.g. `createStyles({ ... })`.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryCall {
    /// The callee through the closing parenthesis.
    pub span: Span,
    /// The first argument; `None` for `createStyles()` or a spread argument.
    pub argument: Option<Node>,
}

/// Everything the transform needs from one source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTree {
    pub elements: Vec<JsxOpeningElement>,
    pub factory_calls: Vec<FactoryCall>,
}

/// A 1-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
}

impl<'s> LineIndex<'s> {
    pub fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    /// Columns count characters, not bytes.
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .source
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        Location {
            line: line + 1,
            column: column + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_first_line() {
        let index = LineIndex::new("abc\ndef");
        assert_eq!(index.location(0), Location { line: 1, column: 1 });
        assert_eq!(index.location(2), Location { line: 1, column: 3 });
    }

    #[test]
    fn test_line_index_later_lines() {
        let index = LineIndex::new("abc\ndef\n\nxyz");
        assert_eq!(index.location(4), Location { line: 2, column: 1 });
        assert_eq!(index.location(9), Location { line: 4, column: 1 });
        assert_eq!(index.location(11), Location { line: 4, column: 3 });
    }

    #[test]
    fn test_line_index_counts_characters() {
        let index = LineIndex::new("é = 1");
        // 'é' is two bytes
        assert_eq!(index.location(3), Location { line: 1, column: 3 });
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(NodeKind::Other("CallExpression").name(), "CallExpression");
        assert_eq!(NodeKind::Identifier("a".into()).to_string(), "Identifier");
        assert_eq!(KeyKind::Computed.name(), "ComputedKey");
    }
}
