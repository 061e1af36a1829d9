//! Switch statements and switch expressions.
//!
//! A switch body is a small state machine over the token stream: after the
//! scrutinee, each `case`/`default` label transitions on `->` into an
//! arrow body (expression, block, or throw) or on `:` into a statement
//! run. Whether `yield` is a legal statement inside those bodies depends
//! on which construct owns the body, tracked by a boolean context flag on
//! the parser.

use crate::lexer::TokenKind;
use crate::node::{NodeIndex, NodeKind};
use crate::parser::grammar::{expression, pattern, statement};
use crate::parser::{ParseResult, Parser};

pub(crate) fn switch_statement(p: &mut Parser) -> ParseResult<NodeIndex> {
    parse_switch(p, false)
}

pub(crate) fn switch_expression(p: &mut Parser) -> ParseResult<NodeIndex> {
    parse_switch(p, true)
}

fn parse_switch(p: &mut Parser, is_expression: bool) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.expect(TokenKind::SwitchKw)?;
    p.expect(TokenKind::LParen)?;
    let mut children = vec![expression::expression(p)?];
    p.expect(TokenKind::RParen)?;
    p.expect(TokenKind::LBrace)?;

    let saved = p.yield_ctx;
    p.yield_ctx = is_expression;
    let result = switch_body(p, &mut children);
    p.yield_ctx = saved;
    result?;

    p.expect(TokenKind::RBrace)?;
    let kind = if is_expression {
        NodeKind::SwitchExpression
    } else {
        NodeKind::SwitchStatement
    };
    p.alloc(kind, start, children)
}

fn switch_body(p: &mut Parser, children: &mut Vec<NodeIndex>) -> ParseResult<()> {
    let interior = p.prev_end();
    loop {
        p.drain_comments_since(children, interior)?;
        match p.peek() {
            TokenKind::RBrace | TokenKind::Eof => return Ok(()),
            TokenKind::CaseKw | TokenKind::DefaultKw => children.push(switch_case(p)?),
            _ => return Err(p.expected("`case`, `default`, or `}`")),
        }
    }
}

/// One group: labels, then an arrow body or a colon body.
fn switch_case(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut children = Vec::new();

    if p.at(TokenKind::DefaultKw) {
        let s = p.start();
        p.bump()?;
        children.push(p.alloc(NodeKind::DefaultLabel, s, Vec::new())?);
    } else {
        p.expect(TokenKind::CaseKw)?;
        loop {
            children.push(case_item(p)?);
            if !p.eat(TokenKind::Comma)? {
                break;
            }
        }
    }

    if p.eat(TokenKind::Arrow)? {
        match p.peek() {
            TokenKind::LBrace => children.push(statement::block(p)?),
            TokenKind::ThrowKw => children.push(statement::statement(p)?),
            _ => {
                children.push(expression::expression(p)?);
                p.expect(TokenKind::Semi)?;
            }
        }
    } else {
        p.expect(TokenKind::Colon)?;
        let interior = p.prev_end();
        loop {
            p.drain_comments_since(&mut children, interior)?;
            match p.peek() {
                TokenKind::CaseKw | TokenKind::DefaultKw | TokenKind::RBrace | TokenKind::Eof => {
                    break
                }
                _ => children.push(statement::statement(p)?),
            }
        }
    }
    p.alloc(NodeKind::SwitchCase, start, children)
}

/// One label item: `null`, `default`, a pattern (optionally guarded by
/// `when`), or a constant expression parsed below conditional level.
fn case_item(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    match p.peek() {
        TokenKind::NullKw => {
            p.bump()?;
            p.alloc(NodeKind::NullLiteral, start, Vec::new())
        }
        TokenKind::DefaultKw => {
            p.bump()?;
            p.alloc(NodeKind::DefaultLabel, start, Vec::new())
        }
        _ if pattern::at_case_pattern(p) => {
            let pat = pattern::pattern(p)?;
            if p.at_text("when") {
                p.bump()?;
                // Conditional level: a bare `flag -> ..` must read as
                // guard-then-arrow, not as a lambda guard.
                let guard = expression::conditional(p)?;
                return p.alloc(NodeKind::GuardedPattern, start, vec![pat, guard]);
            }
            Ok(pat)
        }
        _ => expression::case_constant(p),
    }
}
