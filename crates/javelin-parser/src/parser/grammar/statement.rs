//! Every Java statement form.
//!
//! Blocks are comment containers: buffered comment tokens are drained into
//! the child list at statement boundaries. Explicit constructor
//! invocations (`this(..)`, `super(..)`, `Outer.super(..)`) are ordinary
//! statements here, which is what lets constructor prologues precede them
//! in flexible constructor bodies.

use crate::lexer::TokenKind;
use crate::node::{Attribute, NodeIndex, NodeKind};
use crate::parser::grammar::{declaration, expression, switch, ty};
use crate::parser::{ParseResult, Parser};

pub(crate) fn block(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.expect(TokenKind::LBrace)?;
    let interior = p.prev_end();
    let mut children = Vec::new();
    loop {
        p.drain_comments_since(&mut children, interior)?;
        if p.at(TokenKind::RBrace) || p.at(TokenKind::Eof) {
            break;
        }
        children.push(statement(p)?);
    }
    p.expect(TokenKind::RBrace)?;
    p.alloc(NodeKind::Block, start, children)
}

pub(crate) fn statement(p: &mut Parser) -> ParseResult<NodeIndex> {
    p.enter()?;
    let result = statement_inner(p);
    p.leave();
    result
}

fn statement_inner(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    match p.peek() {
        TokenKind::LBrace => block(p),
        TokenKind::Semi => {
            p.bump()?;
            p.alloc(NodeKind::EmptyStatement, start, Vec::new())
        }
        TokenKind::IfKw => {
            p.bump()?;
            p.expect(TokenKind::LParen)?;
            let cond = expression::expression(p)?;
            p.expect(TokenKind::RParen)?;
            let mut children = vec![cond, statement(p)?];
            if p.eat(TokenKind::ElseKw)? {
                children.push(statement(p)?);
            }
            p.alloc(NodeKind::IfStatement, start, children)
        }
        TokenKind::WhileKw => {
            p.bump()?;
            p.expect(TokenKind::LParen)?;
            let cond = expression::expression(p)?;
            p.expect(TokenKind::RParen)?;
            let body = statement(p)?;
            p.alloc(NodeKind::WhileStatement, start, vec![cond, body])
        }
        TokenKind::DoKw => {
            p.bump()?;
            let body = statement(p)?;
            p.expect(TokenKind::WhileKw)?;
            p.expect(TokenKind::LParen)?;
            let cond = expression::expression(p)?;
            p.expect(TokenKind::RParen)?;
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::DoStatement, start, vec![body, cond])
        }
        TokenKind::ForKw => for_statement(p, start),
        TokenKind::TryKw => try_statement(p, start),
        TokenKind::SwitchKw => switch::switch_statement(p),
        TokenKind::ReturnKw => {
            p.bump()?;
            let mut children = Vec::new();
            if !p.at(TokenKind::Semi) {
                children.push(expression::expression(p)?);
            }
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::ReturnStatement, start, children)
        }
        TokenKind::ThrowKw => {
            p.bump()?;
            let value = expression::expression(p)?;
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::ThrowStatement, start, vec![value])
        }
        TokenKind::BreakKw => {
            p.bump()?;
            let mut children = Vec::new();
            if p.at(TokenKind::Ident) {
                children.push(super::identifier(p)?);
            }
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::BreakStatement, start, children)
        }
        TokenKind::ContinueKw => {
            p.bump()?;
            let mut children = Vec::new();
            if p.at(TokenKind::Ident) {
                children.push(super::identifier(p)?);
            }
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::ContinueStatement, start, children)
        }
        TokenKind::AssertKw => {
            p.bump()?;
            let mut children = vec![expression::expression(p)?];
            if p.eat(TokenKind::Colon)? {
                children.push(expression::expression(p)?);
            }
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::AssertStatement, start, children)
        }
        TokenKind::SynchronizedKw => {
            p.bump()?;
            p.expect(TokenKind::LParen)?;
            let monitor = expression::expression(p)?;
            p.expect(TokenKind::RParen)?;
            let body = block(p)?;
            p.alloc(NodeKind::SynchronizedStatement, start, vec![monitor, body])
        }
        TokenKind::ThisKw | TokenKind::SuperKw if p.nth(1) == TokenKind::LParen => {
            p.bump()?;
            let children = expression::arguments(p)?;
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::ExplicitConstructorInvocation, start, children)
        }
        TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => {
            declaration::type_declaration(p, start, Vec::new())
        }
        TokenKind::AbstractKw | TokenKind::StaticKw | TokenKind::FinalKw | TokenKind::At => {
            let mods = declaration::modifiers(p)?;
            if declaration::at_type_declaration(p) {
                declaration::type_declaration(p, start, mods)
            } else {
                local_variable_declaration(p, start, mods, true)
            }
        }
        TokenKind::Ident if p.yield_ctx && p.at_text("yield") => {
            p.bump()?;
            let value = expression::expression(p)?;
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::YieldStatement, start, vec![value])
        }
        TokenKind::Ident if p.nth(1) == TokenKind::Colon => {
            let label = super::identifier(p)?;
            p.expect(TokenKind::Colon)?;
            let body = statement(p)?;
            p.alloc(NodeKind::LabeledStatement, start, vec![label, body])
        }
        TokenKind::Ident if declaration::at_type_declaration(p) => {
            // Local record or sealed local class.
            declaration::type_declaration(p, start, Vec::new())
        }
        _ => {
            if at_qualified_super_call(p) {
                return qualified_super_call(p, start);
            }
            if at_local_variable_declaration(p) {
                return local_variable_declaration(p, start, Vec::new(), true);
            }
            let expr = expression::expression(p)?;
            p.expect(TokenKind::Semi)?;
            p.alloc(NodeKind::ExpressionStatement, start, vec![expr])
        }
    }
}

/// `Type Name` followed by `=`, `;`, `,` or `[` begins a declaration;
/// anything else is an expression statement.
fn at_local_variable_declaration(p: &Parser) -> bool {
    let Some(after) = ty::scan_type(p, p.raw_pos()) else {
        return false;
    };
    if p.kind_raw(after) != TokenKind::Ident {
        return false;
    }
    matches!(
        p.kind_raw(p.next_sig(after)),
        TokenKind::Eq | TokenKind::Semi | TokenKind::Comma | TokenKind::LBracket
    )
}

pub(crate) fn local_variable_declaration(
    p: &mut Parser,
    start: u32,
    mods: Vec<NodeIndex>,
    consume_semi: bool,
) -> ParseResult<NodeIndex> {
    let mut children = mods;
    children.push(ty::type_(p)?);
    loop {
        children.push(variable_declarator(p)?);
        if !p.eat(TokenKind::Comma)? {
            break;
        }
    }
    if consume_semi {
        p.expect(TokenKind::Semi)?;
    }
    p.alloc(NodeKind::LocalVariableDeclaration, start, children)
}

/// `Name ('[' ']')* ['=' VariableInitializer]`
pub(crate) fn variable_declarator(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut children = vec![super::identifier(p)?];
    while p.at(TokenKind::LBracket) && p.nth(1) == TokenKind::RBracket {
        p.bump()?;
        p.bump()?;
    }
    if p.eat(TokenKind::Eq)? {
        children.push(expression::variable_initializer(p)?);
    }
    p.alloc(NodeKind::VariableDeclarator, start, children)
}

fn for_statement(p: &mut Parser, start: u32) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::ForKw)?;
    p.expect(TokenKind::LParen)?;

    if at_enhanced_for(p) {
        let mut children = Vec::new();
        loop {
            if p.at(TokenKind::FinalKw) {
                let s = p.start();
                p.bump()?;
                children.push(p.alloc(NodeKind::Modifier, s, Vec::new())?);
            } else if p.at(TokenKind::At) {
                children.push(super::annotation::annotation(p)?);
            } else {
                break;
            }
        }
        children.push(ty::type_(p)?);
        children.push(super::identifier(p)?);
        p.expect(TokenKind::Colon)?;
        children.push(expression::expression(p)?);
        p.expect(TokenKind::RParen)?;
        children.push(statement(p)?);
        return p.alloc(NodeKind::EnhancedForStatement, start, children);
    }

    let mut children = Vec::new();
    if !p.at(TokenKind::Semi) {
        if p.at(TokenKind::FinalKw) || p.at(TokenKind::At) || at_local_variable_declaration(p) {
            let init_start = p.start();
            let mods = declaration::modifiers(p)?;
            children.push(local_variable_declaration(p, init_start, mods, false)?);
        } else {
            loop {
                children.push(expression::expression(p)?);
                if !p.eat(TokenKind::Comma)? {
                    break;
                }
            }
        }
    }
    p.expect(TokenKind::Semi)?;
    if !p.at(TokenKind::Semi) {
        children.push(expression::expression(p)?);
    }
    p.expect(TokenKind::Semi)?;
    if !p.at(TokenKind::RParen) {
        loop {
            children.push(expression::expression(p)?);
            if !p.eat(TokenKind::Comma)? {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen)?;
    children.push(statement(p)?);
    p.alloc(NodeKind::ForStatement, start, children)
}

/// `[final | @Ann]* Type Name ':'` after the `(` means enhanced for.
fn at_enhanced_for(p: &Parser) -> bool {
    let mut raw = p.raw_pos();
    loop {
        if p.kind_raw(raw) == TokenKind::FinalKw {
            raw = p.next_sig(raw);
            continue;
        }
        let after = ty::scan_annotations(p, raw);
        if after == raw {
            break;
        }
        raw = after;
    }
    let Some(after) = ty::scan_type(p, raw) else {
        return false;
    };
    if p.kind_raw(after) != TokenKind::Ident {
        return false;
    }
    p.kind_raw(p.next_sig(after)) == TokenKind::Colon
}

fn try_statement(p: &mut Parser, start: u32) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::TryKw)?;
    let mut children = Vec::new();

    if p.eat(TokenKind::LParen)? {
        loop {
            children.push(resource(p)?);
            if p.eat(TokenKind::Semi)? {
                if p.at(TokenKind::RParen) {
                    break;
                }
                continue;
            }
            break;
        }
        p.expect(TokenKind::RParen)?;
    }

    children.push(block(p)?);

    while p.at(TokenKind::CatchKw) {
        children.push(catch_clause(p)?);
    }
    if p.at(TokenKind::FinallyKw) {
        let f_start = p.start();
        p.bump()?;
        let body = block(p)?;
        children.push(p.alloc(NodeKind::FinallyClause, f_start, vec![body])?);
    }
    p.alloc(NodeKind::TryStatement, start, children)
}

/// A resource: `[final] Type Name = Expression`, or an existing variable
/// reference.
fn resource(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut children = Vec::new();
    if p.at(TokenKind::FinalKw) || p.at(TokenKind::At) {
        children.extend(declaration::modifiers(p)?);
    }
    let declares = match ty::scan_type(p, p.raw_pos()) {
        Some(after) => {
            p.kind_raw(after) == TokenKind::Ident
                && p.kind_raw(p.next_sig(after)) == TokenKind::Eq
        }
        None => false,
    };
    if declares || !children.is_empty() {
        children.push(ty::type_(p)?);
        children.push(super::identifier(p)?);
        p.expect(TokenKind::Eq)?;
        children.push(expression::expression(p)?);
    } else {
        children.push(expression::expression(p)?);
    }
    p.alloc(NodeKind::Resource, start, children)
}

fn catch_clause(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.expect(TokenKind::CatchKw)?;
    p.expect(TokenKind::LParen)?;

    let param_start = p.start();
    let mut param_children = Vec::new();
    let mut is_final = false;
    loop {
        if p.at(TokenKind::FinalKw) {
            let s = p.start();
            p.bump()?;
            param_children.push(p.alloc(NodeKind::Modifier, s, Vec::new())?);
            is_final = true;
        } else if p.at(TokenKind::At) {
            param_children.push(super::annotation::annotation(p)?);
        } else {
            break;
        }
    }
    let type_start = p.start();
    let first = ty::type_(p)?;
    let caught = if p.at(TokenKind::Pipe) {
        let mut alternatives = vec![first];
        while p.eat(TokenKind::Pipe)? {
            alternatives.push(ty::type_(p)?);
        }
        p.alloc(NodeKind::UnionType, type_start, alternatives)?
    } else {
        first
    };
    param_children.push(caught);
    let name = p.current().text().to_owned();
    if !p.at(TokenKind::Ident) {
        return Err(p.expected("an exception variable name"));
    }
    p.bump()?;
    let param = p.alloc_attr(
        NodeKind::ParameterDeclaration,
        param_start,
        param_children,
        Attribute::Parameter {
            name,
            is_varargs: false,
            is_final,
            is_receiver: false,
        },
    )?;

    p.expect(TokenKind::RParen)?;
    let body = block(p)?;
    p.alloc(NodeKind::CatchClause, start, vec![param, body])
}

/// `Name ('.' Name)* '.' 'super' '(' … ')' ';'` — the qualified explicit
/// constructor invocation.
fn at_qualified_super_call(p: &Parser) -> bool {
    if !p.at(TokenKind::Ident) {
        return false;
    }
    let mut raw = p.next_sig(p.raw_pos());
    loop {
        if p.kind_raw(raw) != TokenKind::Dot {
            return false;
        }
        let next = p.next_sig(raw);
        match p.kind_raw(next) {
            TokenKind::Ident => raw = p.next_sig(next),
            TokenKind::SuperKw => {
                return p.kind_raw(p.next_sig(next)) == TokenKind::LParen;
            }
            _ => return false,
        }
    }
}

fn qualified_super_call(p: &mut Parser, start: u32) -> ParseResult<NodeIndex> {
    let name_start = p.start();
    let mut segments = vec![super::identifier(p)?];
    while p.at(TokenKind::Dot) && p.nth(1) == TokenKind::Ident {
        p.bump()?;
        segments.push(super::identifier(p)?);
    }
    let qualifier = if segments.len() == 1 {
        segments.pop().expect("one segment")
    } else {
        p.alloc(NodeKind::QualifiedName, name_start, segments)?
    };
    p.expect(TokenKind::Dot)?;
    p.expect(TokenKind::SuperKw)?;
    let mut children = vec![qualifier];
    children.extend(expression::arguments(p)?);
    p.expect(TokenKind::Semi)?;
    p.alloc(NodeKind::ExplicitConstructorInvocation, start, children)
}

#[cfg(test)]
mod tests {
    use crate::node::NodeKind;
    use crate::tree::Tree;
    use crate::Parser;

    fn parse(source: &str) -> Tree {
        Parser::new(source).parse().unwrap_or_else(|e| {
            panic!("parse failed for {source:?}: {e}");
        })
    }

    fn count(tree: &Tree, kind: NodeKind) -> usize {
        (0..tree.node_count())
            .filter(|&i| tree.node_at(i).kind() == kind)
            .count()
    }

    fn in_method(body: &str) -> String {
        format!("class A {{ void m() {{ {body} }} }}")
    }

    #[test]
    fn statement_forms() {
        let tree = parse(&in_method(
            "if (a) b(); else c(); while (a) { } do { } while (a); assert a : \"msg\"; \
             synchronized (lock) { } outer: break outer; continue; return 1;",
        ));
        for kind in [
            NodeKind::IfStatement,
            NodeKind::WhileStatement,
            NodeKind::DoStatement,
            NodeKind::AssertStatement,
            NodeKind::SynchronizedStatement,
            NodeKind::LabeledStatement,
            NodeKind::BreakStatement,
            NodeKind::ContinueStatement,
            NodeKind::ReturnStatement,
        ] {
            assert_eq!(count(&tree, kind), 1, "{kind:?}");
        }
    }

    #[test]
    fn local_declaration_vs_expression_statement() {
        let tree = parse(&in_method("int x = 1; x = 2; a.b.c(); List<String> l;"));
        assert_eq!(count(&tree, NodeKind::LocalVariableDeclaration), 2);
        assert_eq!(count(&tree, NodeKind::ExpressionStatement), 2);
    }

    #[test]
    fn var_declaration() {
        let tree = parse(&in_method("var list = make();"));
        assert_eq!(count(&tree, NodeKind::LocalVariableDeclaration), 1);
    }

    #[test]
    fn multi_declarator_with_dims() {
        let tree = parse(&in_method("int a, b[] = { 1 }, c = 2;"));
        assert_eq!(count(&tree, NodeKind::VariableDeclarator), 3);
        assert_eq!(count(&tree, NodeKind::ArrayInitializer), 1);
    }

    #[test]
    fn classic_and_enhanced_for() {
        let tree = parse(&in_method(
            "for (int i = 0; i < n; i++) { } for (final String s : names) { }",
        ));
        assert_eq!(count(&tree, NodeKind::ForStatement), 1);
        assert_eq!(count(&tree, NodeKind::EnhancedForStatement), 1);
    }

    #[test]
    fn empty_for_header() {
        let tree = parse(&in_method("for (;;) { break; }"));
        assert_eq!(count(&tree, NodeKind::ForStatement), 1);
    }

    #[test]
    fn try_catch_finally() {
        let tree = parse(&in_method(
            "try { a(); } catch (IOException | SQLException e) { } finally { b(); }",
        ));
        assert_eq!(count(&tree, NodeKind::TryStatement), 1);
        assert_eq!(count(&tree, NodeKind::CatchClause), 1);
        assert_eq!(count(&tree, NodeKind::UnionType), 1);
        assert_eq!(count(&tree, NodeKind::FinallyClause), 1);
    }

    #[test]
    fn try_with_resources() {
        let tree = parse(&in_method(
            "try (var in = open(); out) { } catch (Exception e) { }",
        ));
        assert_eq!(count(&tree, NodeKind::Resource), 2);
    }

    #[test]
    fn local_class_and_record() {
        let tree = parse(&in_method(
            "class Local { } record Pair(int a, int b) { } Pair p;",
        ));
        assert_eq!(count(&tree, NodeKind::ClassDeclaration), 2);
        assert_eq!(count(&tree, NodeKind::RecordDeclaration), 1);
    }

    #[test]
    fn explicit_constructor_invocations_are_statements() {
        let tree = parse(
            "class Child extends Base { Child(int x) { super(x); } Child() { this(1); } }",
        );
        assert_eq!(count(&tree, NodeKind::ExplicitConstructorInvocation), 2);
    }

    #[test]
    fn flexible_constructor_body_keeps_statement_order() {
        let tree = parse(
            "class Child extends Base {\n  Child(int x) {\n    if (x < 0) throw new IllegalArgumentException();\n    super(x);\n  }\n}",
        );
        let block = (0..tree.node_count())
            .map(|i| tree.node_at(i))
            .find(|n| n.kind() == NodeKind::Block)
            .unwrap();
        let kinds: Vec<_> = block.children().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::IfStatement,
                NodeKind::ExplicitConstructorInvocation
            ]
        );
    }

    #[test]
    fn plain_qualified_super_invocation() {
        let tree = parse("class Inner extends Outer.Base { Inner(Outer o) { o.super(); } }");
        assert_eq!(count(&tree, NodeKind::ExplicitConstructorInvocation), 1);
    }

    #[test]
    fn yield_as_identifier_outside_switch_expression() {
        let tree = parse(&in_method("int yield = 42; yield = 1;"));
        assert_eq!(count(&tree, NodeKind::YieldStatement), 0);
        assert_eq!(count(&tree, NodeKind::LocalVariableDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::AssignmentExpression), 1);
    }
}
