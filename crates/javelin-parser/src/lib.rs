#![doc = include_str!("../README.md")]

mod arena;
mod error;
mod lexer;
mod limit;
mod location;
mod node;
mod parser;
#[cfg(test)]
mod tests;
mod tree;

pub use crate::error::{Diagnostic, DiagnosticKind, Diagnostics, ResourceLimit};
pub use crate::lexer::{Token, TokenKind};
pub use crate::limit::{LimitTracker, ParserLimits};
pub use crate::node::{Attribute, Node, NodeIndex, NodeKind};
pub use crate::parser::Parser;
pub use crate::tree::{NodeView, ParentMap, Tree};

/// Parse Java source text with the default [`ParserLimits`].
///
/// ```rust
/// let tree = javelin_parser::parse("class A { }").expect("valid source");
/// assert_eq!(tree.node(tree.root()).kind(), javelin_parser::NodeKind::CompilationUnit);
/// ```
pub fn parse(source: &str) -> Result<Tree, Diagnostics> {
    Parser::new(source).parse()
}
