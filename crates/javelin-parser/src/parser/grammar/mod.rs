pub(crate) mod annotation;
pub(crate) mod compilation_unit;
pub(crate) mod declaration;
pub(crate) mod expression;
pub(crate) mod member;
pub(crate) mod pattern;
pub(crate) mod statement;
pub(crate) mod switch;
pub(crate) mod ty;

use crate::lexer::TokenKind;
use crate::node::{NodeIndex, NodeKind};
use crate::parser::{ParseResult, Parser};

/// Parse one identifier into an `Identifier` node. Contextual keywords are
/// ordinary identifiers here.
pub(crate) fn identifier(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    if !p.at(TokenKind::Ident) {
        return Err(p.expected("an identifier"));
    }
    p.bump()?;
    p.alloc(NodeKind::Identifier, start, Vec::new())
}

/// Consume `Ident ('.' Ident)*`, returning the dotted text. Used where the
/// name becomes a node attribute rather than child nodes (package, import,
/// module import declarations).
pub(crate) fn dotted_name(p: &mut Parser) -> ParseResult<String> {
    let mut name = String::new();
    loop {
        if !p.at(TokenKind::Ident) {
            return Err(p.expected("a name"));
        }
        name.push_str(p.current().text());
        p.bump()?;
        if p.at(TokenKind::Dot) && p.nth(1) == TokenKind::Ident {
            name.push('.');
            p.bump()?;
        } else {
            return Ok(name);
        }
    }
}
