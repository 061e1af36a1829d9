//! Patterns: type patterns, primitive type patterns, record deconstruction
//! patterns, and the guard wrapper used by `case` labels.

use crate::lexer::TokenKind;
use crate::node::{NodeIndex, NodeKind};
use crate::parser::grammar::{annotation, ty};
use crate::parser::{ParseResult, Parser};

/// The right-hand side of `instanceof`: a plain type, or a pattern when a
/// binding name or a deconstruction list follows the type.
pub(crate) fn instanceof_operand(p: &mut Parser) -> ParseResult<NodeIndex> {
    if p.at(TokenKind::FinalKw) {
        return pattern(p);
    }
    let raw = if p.at(TokenKind::At) {
        ty::scan_annotations(p, p.raw_pos())
    } else {
        p.raw_pos()
    };
    match ty::scan_type(p, raw) {
        Some(after) => match p.kind_raw(after) {
            TokenKind::Ident | TokenKind::LParen => pattern(p),
            _ => ty::type_(p),
        },
        None => Err(p.expected("a type")),
    }
}

/// Whether a `case` item starting here is a pattern rather than a constant
/// expression. A qualified name followed by `(` begins a record pattern; a
/// type followed by an identifier begins a type pattern.
pub(crate) fn at_case_pattern(p: &Parser) -> bool {
    if matches!(p.peek(), TokenKind::FinalKw | TokenKind::At) {
        return true;
    }
    if ty::is_primitive(p.peek()) || p.at(TokenKind::Ident) {
        if let Some(after) = ty::scan_type(p, p.raw_pos()) {
            return matches!(p.kind_raw(after), TokenKind::Ident | TokenKind::LParen);
        }
    }
    false
}

/// One pattern, without a guard.
pub(crate) fn pattern(p: &mut Parser) -> ParseResult<NodeIndex> {
    p.enter()?;
    let result = pattern_inner(p);
    p.leave();
    result
}

fn pattern_inner(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut children = Vec::new();
    loop {
        if p.at(TokenKind::At) {
            children.push(annotation::annotation(p)?);
        } else if p.at(TokenKind::FinalKw) {
            let s = p.start();
            p.bump()?;
            children.push(p.alloc(NodeKind::Modifier, s, Vec::new())?);
        } else {
            break;
        }
    }
    let type_node = ty::type_(p)?;
    children.push(type_node);

    if p.at(TokenKind::LParen) {
        p.bump()?;
        if !p.at(TokenKind::RParen) {
            loop {
                children.push(pattern(p)?);
                if !p.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        p.expect(TokenKind::RParen)?;
        return p.alloc(NodeKind::RecordPattern, start, children);
    }

    if p.at(TokenKind::Ident) {
        children.push(super::identifier(p)?);
        let kind = if p.node_kind(type_node) == NodeKind::PrimitiveType {
            NodeKind::PrimitiveTypePattern
        } else {
            NodeKind::TypePattern
        };
        return p.alloc(kind, start, children);
    }

    Err(p.expected("a pattern binding or `(`"))
}
