//! Expressions at every precedence level down to primary.
//!
//! Binary operators use precedence climbing; assignment is right
//! associative and sits at the lowest level together with lambda, so
//! `cond ? a : x -> body` groups the lambda under the ternary's third
//! operand. The arena cannot roll allocations back, so every ambiguous
//! prefix (lambda vs. cast vs. parenthesized expression, generic type
//! method references) is resolved by scanning raw tokens before anything
//! is allocated.

use crate::lexer::TokenKind;
use crate::node::{Attribute, NodeIndex, NodeKind};
use crate::parser::grammar::{annotation, pattern, statement, switch, ty};
use crate::parser::{ParseResult, Parser};

/// Parse a full expression (assignment level).
pub(crate) fn expression(p: &mut Parser) -> ParseResult<NodeIndex> {
    p.enter()?;
    let result = assignment(p);
    p.leave();
    result
}

/// Parse at conditional level: everything but assignment and lambda.
/// Annotation element values live here.
pub(crate) fn conditional(p: &mut Parser) -> ParseResult<NodeIndex> {
    p.enter()?;
    let start = p.start();
    let result = conditional_inner(p, start);
    p.leave();
    result
}

/// A `case` constant. Stops below conditional so the expression cannot
/// swallow the `:` of a colon-form label.
pub(crate) fn case_constant(p: &mut Parser) -> ParseResult<NodeIndex> {
    p.enter()?;
    let result = binary(p, 0);
    p.leave();
    result
}

fn assignment(p: &mut Parser) -> ParseResult<NodeIndex> {
    if at_lambda(p) {
        return lambda(p);
    }
    let start = p.start();
    let lhs = conditional_inner(p, start)?;
    if is_assignment_op(p.peek()) {
        p.bump()?;
        let rhs = expression(p)?;
        return p.alloc(NodeKind::AssignmentExpression, start, vec![lhs, rhs]);
    }
    Ok(lhs)
}

fn is_assignment_op(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
            | TokenKind::CaretEq
            | TokenKind::ShlEq
            | TokenKind::ShrEq
            | TokenKind::UShrEq
    )
}

fn conditional_inner(p: &mut Parser, start: u32) -> ParseResult<NodeIndex> {
    let cond = binary(p, 0)?;
    if !p.at(TokenKind::Question) {
        return Ok(cond);
    }
    p.bump()?;
    let then = expression(p)?;
    p.expect(TokenKind::Colon)?;
    let alt = expression(p)?;
    p.alloc(
        NodeKind::ConditionalExpression,
        start,
        vec![cond, then, alt],
    )
}

fn binary_precedence(kind: TokenKind) -> Option<u8> {
    Some(match kind {
        TokenKind::PipePipe => 1,
        TokenKind::AmpAmp => 2,
        TokenKind::Pipe => 3,
        TokenKind::Caret => 4,
        TokenKind::Amp => 5,
        TokenKind::EqEq | TokenKind::BangEq => 6,
        TokenKind::Lt | TokenKind::Gt | TokenKind::LtEq | TokenKind::GtEq => 7,
        TokenKind::Shl | TokenKind::Shr | TokenKind::UShr => 8,
        TokenKind::Plus | TokenKind::Minus => 9,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 10,
        _ => return None,
    })
}

const INSTANCEOF_PRECEDENCE: u8 = 7;

fn binary(p: &mut Parser, min_precedence: u8) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut lhs = unary(p)?;
    loop {
        if p.at(TokenKind::InstanceofKw) && INSTANCEOF_PRECEDENCE >= min_precedence {
            p.bump()?;
            let rhs = pattern::instanceof_operand(p)?;
            lhs = p.alloc(NodeKind::InstanceofExpression, start, vec![lhs, rhs])?;
            continue;
        }
        let Some(precedence) = binary_precedence(p.peek()) else {
            break;
        };
        if precedence < min_precedence {
            break;
        }
        p.bump()?;
        let rhs = binary(p, precedence + 1)?;
        lhs = p.alloc(NodeKind::BinaryExpression, start, vec![lhs, rhs])?;
    }
    Ok(lhs)
}

fn unary(p: &mut Parser) -> ParseResult<NodeIndex> {
    p.enter()?;
    let result = unary_inner(p);
    p.leave();
    result
}

fn unary_inner(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    match p.peek() {
        TokenKind::PlusPlus
        | TokenKind::MinusMinus
        | TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Tilde
        | TokenKind::Bang => {
            p.bump()?;
            let operand = unary(p)?;
            p.alloc(NodeKind::UnaryExpression, start, vec![operand])
        }
        TokenKind::LParen if at_cast(p) => {
            p.bump()?;
            let mut children = vec![ty::type_(p)?];
            while p.eat(TokenKind::Amp)? {
                children.push(ty::type_(p)?);
            }
            p.expect(TokenKind::RParen)?;
            // `(Runnable) () -> { }`: a cast operand may be a lambda.
            if at_lambda(p) {
                children.push(lambda(p)?);
            } else {
                children.push(unary(p)?);
            }
            p.alloc(NodeKind::CastExpression, start, children)
        }
        _ => postfix(p),
    }
}

/// Decide cast vs. parenthesized expression: the parenthesized tokens must
/// scan as a type (possibly an intersection), and what follows `)` must be
/// able to start the cast operand. Primitive casts additionally accept
/// `+`/`-`/`++`/`--` operands.
fn at_cast(p: &Parser) -> bool {
    let after_lp = p.next_sig(p.raw_pos());
    let base = ty::scan_annotations(p, after_lp);
    let Some(mut after_type) = ty::scan_type(p, after_lp) else {
        return false;
    };
    while p.kind_raw(after_type) == TokenKind::Amp {
        match ty::scan_type(p, p.next_sig(after_type)) {
            Some(next) => after_type = next,
            None => return false,
        }
    }
    if p.kind_raw(after_type) != TokenKind::RParen {
        return false;
    }
    let next = p.kind_raw(p.next_sig(after_type));
    let common = matches!(
        next,
        TokenKind::Ident
            | TokenKind::LParen
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::ThisKw
            | TokenKind::SuperKw
            | TokenKind::NewKw
            | TokenKind::SwitchKw
            | TokenKind::IntLiteral
            | TokenKind::LongLiteral
            | TokenKind::FloatLiteral
            | TokenKind::DoubleLiteral
            | TokenKind::CharLiteral
            | TokenKind::StringLiteral
            | TokenKind::TextBlock
            | TokenKind::TrueKw
            | TokenKind::FalseKw
            | TokenKind::NullKw
    );
    if ty::is_primitive(p.kind_raw(base)) {
        common
            || matches!(
                next,
                TokenKind::Plus | TokenKind::Minus | TokenKind::PlusPlus | TokenKind::MinusMinus
            )
    } else {
        common
    }
}

fn postfix(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut node = primary(p)?;
    loop {
        match p.peek() {
            TokenKind::Dot => {
                node = postfix_dot(p, node, start)?;
            }
            TokenKind::LBracket
                if !matches!(
                    p.node_kind(node),
                    NodeKind::ObjectCreation | NodeKind::ArrayCreation
                ) =>
            {
                p.bump()?;
                let index = expression(p)?;
                p.expect(TokenKind::RBracket)?;
                node = p.alloc(NodeKind::ArrayAccess, start, vec![node, index])?;
            }
            TokenKind::ColonColon => {
                node = method_reference(p, node, start)?;
            }
            TokenKind::LParen
                if matches!(
                    p.node_kind(node),
                    NodeKind::Identifier | NodeKind::QualifiedName
                ) =>
            {
                let mut children = vec![node];
                children.extend(arguments(p)?);
                node = p.alloc(NodeKind::MethodInvocation, start, children)?;
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                p.bump()?;
                node = p.alloc(NodeKind::UnaryExpression, start, vec![node])?;
            }
            _ => break,
        }
    }
    Ok(node)
}

fn postfix_dot(p: &mut Parser, node: NodeIndex, start: u32) -> ParseResult<NodeIndex> {
    p.bump()?; // `.`
    match p.peek() {
        TokenKind::ClassKw => {
            p.bump()?;
            p.alloc(NodeKind::ClassLiteral, start, vec![node])
        }
        TokenKind::ThisKw => {
            p.bump()?;
            p.alloc(NodeKind::ThisExpression, start, vec![node])
        }
        TokenKind::SuperKw => {
            p.bump()?;
            p.alloc(NodeKind::SuperExpression, start, vec![node])
        }
        TokenKind::NewKw => creation_rest(p, start, Some(node)),
        TokenKind::Lt => {
            // Explicit generic invocation: `receiver.<T>method(args)`.
            let mut children = vec![node];
            children.extend(ty::type_arguments(p)?);
            children.push(super::identifier(p)?);
            children.extend(arguments(p)?);
            p.alloc(NodeKind::MethodInvocation, start, children)
        }
        TokenKind::Ident => {
            if p.nth(1) == TokenKind::LParen {
                let mut children = vec![node, super::identifier(p)?];
                children.extend(arguments(p)?);
                p.alloc(NodeKind::MethodInvocation, start, children)
            } else {
                let field = super::identifier(p)?;
                p.alloc(NodeKind::FieldAccess, start, vec![node, field])
            }
        }
        _ => Err(p.expected("a member name")),
    }
}

fn method_reference(p: &mut Parser, node: NodeIndex, start: u32) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::ColonColon)?;
    let mut children = vec![node];
    if p.at(TokenKind::Lt) {
        children.extend(ty::type_arguments(p)?);
    }
    if p.at(TokenKind::NewKw) {
        p.bump()?;
    } else {
        children.push(super::identifier(p)?);
    }
    p.alloc(NodeKind::MethodReference, start, children)
}

fn primary(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    match p.peek() {
        TokenKind::IntLiteral => literal(p, NodeKind::IntLiteral),
        TokenKind::LongLiteral => literal(p, NodeKind::LongLiteral),
        TokenKind::FloatLiteral => literal(p, NodeKind::FloatLiteral),
        TokenKind::DoubleLiteral => literal(p, NodeKind::DoubleLiteral),
        TokenKind::TrueKw | TokenKind::FalseKw => literal(p, NodeKind::BooleanLiteral),
        TokenKind::CharLiteral => literal(p, NodeKind::CharLiteral),
        TokenKind::StringLiteral => literal(p, NodeKind::StringLiteral),
        TokenKind::TextBlock => literal(p, NodeKind::TextBlock),
        TokenKind::NullKw => literal(p, NodeKind::NullLiteral),
        TokenKind::LParen => {
            p.bump()?;
            let inner = expression(p)?;
            p.expect(TokenKind::RParen)?;
            p.alloc(NodeKind::ParenthesizedExpression, start, vec![inner])
        }
        TokenKind::ThisKw => {
            p.bump()?;
            p.alloc(NodeKind::ThisExpression, start, Vec::new())
        }
        TokenKind::SuperKw => {
            p.bump()?;
            p.alloc(NodeKind::SuperExpression, start, Vec::new())
        }
        TokenKind::NewKw => creation_rest(p, start, None),
        TokenKind::SwitchKw => switch::switch_expression(p),
        kind if ty::is_primitive(kind) || kind == TokenKind::VoidKw => {
            // `int.class`, `int[].class`, `void.class`, `int[]::new`
            let type_node = ty::return_type(p)?;
            if p.at(TokenKind::ColonColon) {
                return Ok(type_node);
            }
            p.expect(TokenKind::Dot)?;
            p.expect(TokenKind::ClassKw)?;
            p.alloc(NodeKind::ClassLiteral, start, vec![type_node])
        }
        TokenKind::Ident => {
            // A name with type arguments or array dims followed by `::` is
            // unambiguously a type: `List<String>::new`, `int[]::new` style.
            if let Some(after) = ty::scan_type(p, p.raw_pos()) {
                if p.kind_raw(after) == TokenKind::ColonColon
                    && type_syntax_between(p, p.raw_pos(), after)
                {
                    return ty::type_(p);
                }
            }
            name(p)
        }
        _ => Err(p.expected("an expression")),
    }
}

/// Whether the scanned range contains generics or dimension brackets,
/// which make it type syntax rather than an expression name.
fn type_syntax_between(p: &Parser, from: usize, to: usize) -> bool {
    let mut raw = from;
    while raw < to {
        if matches!(p.kind_raw(raw), TokenKind::Lt | TokenKind::LBracket) {
            return true;
        }
        raw = p.next_sig(raw);
    }
    false
}

fn literal(p: &mut Parser, kind: NodeKind) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.bump()?;
    p.alloc(kind, start, Vec::new())
}

/// A maximal chain of identifiers: one segment is an `Identifier` node,
/// two or more form a `QualifiedName`. The chain stops before a segment
/// that has arguments so the invocation keeps its receiver/name split.
fn name(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut segments = vec![super::identifier(p)?];
    while p.at(TokenKind::Dot)
        && p.nth(1) == TokenKind::Ident
        && p.nth(2) != TokenKind::LParen
    {
        p.bump()?;
        segments.push(super::identifier(p)?);
    }
    if segments.len() == 1 {
        Ok(segments.pop().expect("one segment"))
    } else {
        p.alloc(NodeKind::QualifiedName, start, segments)
    }
}

/// `'(' [Expression (',' Expression)*] ')'`
pub(crate) fn arguments(p: &mut Parser) -> ParseResult<Vec<NodeIndex>> {
    p.expect(TokenKind::LParen)?;
    let mut args = Vec::new();
    if !p.at(TokenKind::RParen) {
        loop {
            args.push(expression(p)?);
            if !p.eat(TokenKind::Comma)? {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen)?;
    Ok(args)
}

/// Object or array creation. `qualifier` is the receiver of a qualified
/// `outer.new Inner()` form; when present, `new` has not been consumed yet
/// either way.
fn creation_rest(
    p: &mut Parser,
    start: u32,
    qualifier: Option<NodeIndex>,
) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::NewKw)?;
    let mut children: Vec<NodeIndex> = qualifier.into_iter().collect();
    if p.at(TokenKind::Lt) {
        children.extend(ty::type_arguments(p)?);
    }

    let type_start = p.start();
    let mut anns = Vec::new();
    while p.at(TokenKind::At) {
        anns.push(annotation::annotation(p)?);
    }
    let created = if ty::is_primitive(p.peek()) {
        p.bump()?;
        p.alloc(NodeKind::PrimitiveType, type_start, anns)?
    } else {
        ty::class_type_for_creation(p, type_start, anns)?
    };
    children.push(created);

    if p.at(TokenKind::LBracket) {
        return array_creation_rest(p, start, children);
    }

    children.extend(arguments(p)?);
    if p.at(TokenKind::LBrace) {
        children.push(anonymous_class_body(p)?);
    }
    p.alloc(NodeKind::ObjectCreation, start, children)
}

/// `new T[expr]..[]..` or `new T[]{..}`: sized dimensions, then empty
/// dimensions, then an optional initializer when every dimension is empty.
fn array_creation_rest(
    p: &mut Parser,
    start: u32,
    mut children: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    let mut sized = false;
    while p.at(TokenKind::LBracket) {
        p.bump()?;
        if !p.at(TokenKind::RBracket) {
            children.push(expression(p)?);
            sized = true;
        }
        p.expect(TokenKind::RBracket)?;
    }
    if !sized && p.at(TokenKind::LBrace) {
        children.push(array_initializer(p)?);
    } else if !sized {
        return Err(p.expected("`{` or a dimension expression"));
    }
    p.alloc(NodeKind::ArrayCreation, start, children)
}

/// `'{' [VariableInitializer (',' VariableInitializer)* [',']] '}'`
pub(crate) fn array_initializer(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.expect(TokenKind::LBrace)?;
    let mut children = Vec::new();
    while !p.at(TokenKind::RBrace) && !p.at(TokenKind::Eof) {
        children.push(variable_initializer(p)?);
        if !p.eat(TokenKind::Comma)? {
            break;
        }
    }
    p.expect(TokenKind::RBrace)?;
    p.alloc(NodeKind::ArrayInitializer, start, children)
}

pub(crate) fn variable_initializer(p: &mut Parser) -> ParseResult<NodeIndex> {
    if p.at(TokenKind::LBrace) {
        array_initializer(p)
    } else {
        expression(p)
    }
}

fn anonymous_class_body(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.expect(TokenKind::LBrace)?;
    let mut members = Vec::new();
    super::member::class_body_members(p, &mut members)?;
    p.expect(TokenKind::RBrace)?;
    p.alloc(NodeKind::ClassDeclaration, start, members)
}

// --- lambdas ---------------------------------------------------------------

fn at_lambda(p: &Parser) -> bool {
    if p.at(TokenKind::Ident) && p.nth(1) == TokenKind::Arrow {
        return true;
    }
    if p.at(TokenKind::LParen) {
        if let Some(after) = ty::scan_balanced_parens(p, p.raw_pos()) {
            return p.kind_raw(after) == TokenKind::Arrow;
        }
    }
    false
}

fn lambda(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut children = Vec::new();
    if p.at(TokenKind::Ident) {
        children.push(inferred_parameter(p)?);
    } else {
        p.expect(TokenKind::LParen)?;
        if !p.at(TokenKind::RParen) {
            loop {
                children.push(lambda_parameter(p)?);
                if !p.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
        p.expect(TokenKind::RParen)?;
    }
    p.expect(TokenKind::Arrow)?;

    if p.at(TokenKind::LBrace) {
        // A lambda body opens a fresh yield context.
        let saved = p.yield_ctx;
        p.yield_ctx = false;
        let body = statement::block(p);
        p.yield_ctx = saved;
        children.push(body?);
    } else {
        children.push(expression(p)?);
    }
    p.alloc(NodeKind::LambdaExpression, start, children)
}

fn inferred_parameter(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let name = p.current().text().to_owned();
    p.bump()?;
    p.alloc_attr(
        NodeKind::ParameterDeclaration,
        start,
        Vec::new(),
        Attribute::Parameter {
            name,
            is_varargs: false,
            is_final: false,
            is_receiver: false,
        },
    )
}

fn lambda_parameter(p: &mut Parser) -> ParseResult<NodeIndex> {
    // `x` or `x, y`: inferred, single identifier per parameter.
    if p.at(TokenKind::Ident) && matches!(p.nth(1), TokenKind::Comma | TokenKind::RParen) {
        return inferred_parameter(p);
    }
    super::member::formal_parameter(p)
}
