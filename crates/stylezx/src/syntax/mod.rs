//! Source scanning: locating style declarations in JS/TS/JSX text.
//!
//! The [`SourceParser`] trait is the seam: given source text it produces a
//! [`SourceTree`] listing every JSX opening element (with attribute spans)
//! and every call of the static style-map factory, with the style-bearing
//! expressions parsed into [`Node`] trees.
//!
//! [`JsxScanner`] is the built-in implementation, a visitor over the
//! `oxc_parser` AST.

mod node;
mod scan;

use std::path::Path;

pub use node::{
    FactoryCall, JsxAttribute, JsxAttributeValue, JsxOpeningElement, KeyKind, LineIndex,
    Location, MemberKind, Node, NodeKind, ObjectMember, PropertyKey, SourceTree, Span,
};
pub use scan::JsxScanner;

/// The source is not valid JS/TS/JSX.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset of the first problem.
    pub offset: usize,
}

impl SyntaxError {
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Produces a [`SourceTree`] from source text.
///
/// Implementations must be usable from several threads at once; the host may
/// transform files concurrently.
pub trait SourceParser: Send + Sync {
    fn parse(&self, path: &Path, source: &str) -> Result<SourceTree, SyntaxError>;
}
