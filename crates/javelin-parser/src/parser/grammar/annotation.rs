//! Annotations and their element values (JSR 308 positions included: the
//! type grammar calls back into this module wherever type annotations are
//! legal).

use crate::lexer::TokenKind;
use crate::node::{NodeIndex, NodeKind};
use crate::parser::grammar::expression;
use crate::parser::{ParseResult, Parser};

/// `'@' QualifiedName ['(' [ElementValues] ')']`
pub(crate) fn annotation(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.expect(TokenKind::At)?;

    let name_start = p.start();
    let mut segments = vec![super::identifier(p)?];
    while p.at(TokenKind::Dot) && p.nth(1) == TokenKind::Ident {
        p.bump()?;
        segments.push(super::identifier(p)?);
    }
    let name = p.alloc(NodeKind::QualifiedName, name_start, segments)?;
    let mut children = vec![name];

    if p.eat(TokenKind::LParen)? {
        if !p.at(TokenKind::RParen) {
            if p.at(TokenKind::Ident) && p.nth(1) == TokenKind::Eq {
                // Named pairs: `@Config(name = "x", retries = 3)`
                loop {
                    let pair_start = p.start();
                    let key = super::identifier(p)?;
                    p.expect(TokenKind::Eq)?;
                    let value = element_value(p)?;
                    children.push(p.alloc(
                        NodeKind::ElementValuePair,
                        pair_start,
                        vec![key, value],
                    )?);
                    if !p.eat(TokenKind::Comma)? {
                        break;
                    }
                }
            } else {
                // Single-value form: `@SuppressWarnings("unchecked")`
                children.push(element_value(p)?);
            }
        }
        p.expect(TokenKind::RParen)?;
    }
    p.alloc(NodeKind::Annotation, start, children)
}

/// An element value: nested annotation, array initializer, or a
/// conditional-level expression (assignment is not an element value).
pub(crate) fn element_value(p: &mut Parser) -> ParseResult<NodeIndex> {
    match p.peek() {
        TokenKind::At => annotation(p),
        TokenKind::LBrace => element_value_array(p),
        _ => expression::conditional(p),
    }
}

fn element_value_array(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.expect(TokenKind::LBrace)?;
    let mut children = Vec::new();
    while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
        children.push(element_value(p)?);
        if !p.eat(TokenKind::Comma)? {
            break;
        }
    }
    p.expect(TokenKind::RBrace)?;
    p.alloc(NodeKind::ArrayInitializer, start, children)
}
