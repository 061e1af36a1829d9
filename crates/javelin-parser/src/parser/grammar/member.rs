//! Class-body members: fields, methods, constructors (regular and
//! compact), enum constants, initializer blocks, nested types, and the
//! formal parameter lists shared with lambdas and records.

use crate::lexer::TokenKind;
use crate::node::{Attribute, NodeIndex, NodeKind};
use crate::parser::grammar::{annotation, declaration, expression, statement, ty};
use crate::parser::{ParseResult, Parser};

/// Members until the closing `}` of the body, which the caller consumes.
/// Comments between members attach to the body being built.
pub(crate) fn class_body_members(
    p: &mut Parser,
    children: &mut Vec<NodeIndex>,
) -> ParseResult<()> {
    let interior = p.prev_end();
    loop {
        p.drain_comments_since(children, interior)?;
        match p.peek() {
            TokenKind::RBrace | TokenKind::Eof => return Ok(()),
            TokenKind::Semi => {
                let start = p.start();
                p.bump()?;
                children.push(p.alloc(NodeKind::EmptyDeclaration, start, Vec::new())?);
            }
            _ => children.push(member(p)?),
        }
    }
}

pub(crate) fn member(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    // Initializer blocks, instance and static.
    if p.at(TokenKind::LBrace) {
        let body = statement::block(p)?;
        return p.alloc(NodeKind::InitializerBlock, start, vec![body]);
    }
    if p.at(TokenKind::StaticKw) && p.nth(1) == TokenKind::LBrace {
        let s = p.start();
        p.bump()?;
        let modifier = p.alloc(NodeKind::Modifier, s, Vec::new())?;
        let body = statement::block(p)?;
        return p.alloc(NodeKind::InitializerBlock, start, vec![modifier, body]);
    }

    let mods = declaration::modifiers(p)?;
    member_rest(p, start, mods)
}

/// Continue a member whose modifiers are already parsed. The compilation
/// unit uses this entry for the first member of an implicit class.
pub(crate) fn member_rest(
    p: &mut Parser,
    start: u32,
    mods: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    if declaration::at_type_declaration(p) {
        return declaration::type_declaration(p, start, mods);
    }

    let mut children = mods;

    // Generic method or constructor.
    if p.at(TokenKind::Lt) {
        children.extend(ty::type_parameters(p)?);
    }

    // Constructor: a bare name directly followed by `(`; compact record
    // constructor: a bare name directly followed by `{`.
    if p.at(TokenKind::Ident) && p.nth(1) == TokenKind::LParen {
        children.push(super::identifier(p)?);
        children.extend(formal_parameters(p)?);
        if let Some(throws) = throws_clause(p)? {
            children.push(throws);
        }
        children.push(statement::block(p)?);
        return p.alloc(NodeKind::ConstructorDeclaration, start, children);
    }
    if p.at(TokenKind::Ident) && p.nth(1) == TokenKind::LBrace {
        children.push(super::identifier(p)?);
        children.push(statement::block(p)?);
        return p.alloc(NodeKind::CompactConstructorDeclaration, start, children);
    }

    children.push(ty::return_type(p)?);
    children.push(super::identifier(p)?);

    if p.at(TokenKind::LParen) {
        return method_rest(p, start, children);
    }
    field_rest(p, start, children)
}

fn method_rest(
    p: &mut Parser,
    start: u32,
    mut children: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    children.extend(formal_parameters(p)?);
    // Legacy dimensions after the parameter list contribute spans only.
    while p.at(TokenKind::LBracket) && p.nth(1) == TokenKind::RBracket {
        p.bump()?;
        p.bump()?;
    }
    if let Some(throws) = throws_clause(p)? {
        children.push(throws);
    }
    if p.eat(TokenKind::DefaultKw)? {
        // Annotation type member default value.
        children.push(annotation::element_value(p)?);
        p.expect(TokenKind::Semi)?;
    } else if p.at(TokenKind::LBrace) {
        children.push(statement::block(p)?);
    } else {
        p.expect(TokenKind::Semi)?;
    }
    p.alloc(NodeKind::MethodDeclaration, start, children)
}

fn field_rest(
    p: &mut Parser,
    start: u32,
    mut children: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    // The name consumed by the caller is the first declarator; rebuild it
    // as one. Children so far: [mods..., type, Identifier].
    let name = children.pop().expect("field name");
    let decl_start = p.node_start(name);
    let mut declarator_children = vec![name];
    while p.at(TokenKind::LBracket) && p.nth(1) == TokenKind::RBracket {
        p.bump()?;
        p.bump()?;
    }
    if p.eat(TokenKind::Eq)? {
        declarator_children.push(expression::variable_initializer(p)?);
    }
    children.push(p.alloc(NodeKind::VariableDeclarator, decl_start, declarator_children)?);
    while p.eat(TokenKind::Comma)? {
        children.push(statement::variable_declarator(p)?);
    }
    p.expect(TokenKind::Semi)?;
    p.alloc(NodeKind::FieldDeclaration, start, children)
}

/// `'(' [FormalParameter (',' FormalParameter)*] ')'` — also used for
/// record headers.
pub(crate) fn formal_parameters(p: &mut Parser) -> ParseResult<Vec<NodeIndex>> {
    p.expect(TokenKind::LParen)?;
    let mut params = Vec::new();
    if !p.at(TokenKind::RParen) {
        loop {
            params.push(formal_parameter(p)?);
            if !p.eat(TokenKind::Comma)? {
                break;
            }
        }
    }
    p.expect(TokenKind::RParen)?;
    Ok(params)
}

/// One declared parameter: annotations, `final`, type, optional `...`,
/// name (or a receiver `this`), and declarator dimensions.
pub(crate) fn formal_parameter(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut children = Vec::new();
    let mut is_final = false;
    loop {
        if p.at(TokenKind::At) {
            children.push(annotation::annotation(p)?);
        } else if p.at(TokenKind::FinalKw) {
            let s = p.start();
            p.bump()?;
            children.push(p.alloc(NodeKind::Modifier, s, Vec::new())?);
            is_final = true;
        } else {
            break;
        }
    }

    let type_start = p.start();
    let mut type_node = ty::type_(p)?;

    let mut is_varargs = false;
    if p.at(TokenKind::At) || p.at(TokenKind::Ellipsis) {
        while p.at(TokenKind::At) {
            children.push(annotation::annotation(p)?);
        }
        p.expect(TokenKind::Ellipsis)?;
        is_varargs = true;
    }

    // Receiver parameter: `this` or `Outer.this`.
    if p.at(TokenKind::ThisKw) {
        p.bump()?;
        children.push(type_node);
        return p.alloc_attr(
            NodeKind::ParameterDeclaration,
            start,
            children,
            Attribute::Parameter {
                name: "this".to_owned(),
                is_varargs: false,
                is_final,
                is_receiver: true,
            },
        );
    }

    if !p.at(TokenKind::Ident) {
        return Err(p.expected("a parameter name"));
    }
    let mut name = p.current().text().to_owned();
    p.bump()?;

    // A dotted name can only be a receiver: `Outer.this`, `Outer.Inner.this`.
    if p.at(TokenKind::Dot) {
        while p.at(TokenKind::Dot) && p.nth(1) == TokenKind::Ident {
            p.bump()?;
            name.push('.');
            name.push_str(p.current().text());
            p.bump()?;
        }
        if !(p.at(TokenKind::Dot) && p.nth(1) == TokenKind::ThisKw) {
            return Err(p.expected("`this`"));
        }
        p.bump()?;
        p.bump()?;
        name.push_str(".this");
        children.push(type_node);
        return p.alloc_attr(
            NodeKind::ParameterDeclaration,
            start,
            children,
            Attribute::Parameter {
                name,
                is_varargs: false,
                is_final,
                is_receiver: true,
            },
        );
    }

    // Declarator dimensions fold into the parameter's type.
    while p.at(TokenKind::LBracket) && p.nth(1) == TokenKind::RBracket {
        p.bump()?;
        p.bump()?;
        type_node = p.alloc_span(
            NodeKind::ArrayType,
            type_start,
            p.prev_end(),
            vec![type_node],
        )?;
    }
    children.push(type_node);

    p.alloc_attr(
        NodeKind::ParameterDeclaration,
        start,
        children,
        Attribute::Parameter {
            name,
            is_varargs,
            is_final,
            is_receiver: false,
        },
    )
}

fn throws_clause(p: &mut Parser) -> ParseResult<Option<NodeIndex>> {
    if !p.at(TokenKind::ThrowsKw) {
        return Ok(None);
    }
    let start = p.start();
    p.bump()?;
    let mut types = vec![ty::type_(p)?];
    while p.eat(TokenKind::Comma)? {
        types.push(ty::type_(p)?);
    }
    Ok(Some(p.alloc(NodeKind::ThrowsClause, start, types)?))
}

/// Enum body after `{`: constants, then an optional `;` and ordinary
/// members.
pub(crate) fn enum_body(p: &mut Parser, children: &mut Vec<NodeIndex>) -> ParseResult<()> {
    let interior = p.prev_end();
    loop {
        p.drain_comments_since(children, interior)?;
        match p.peek() {
            TokenKind::RBrace | TokenKind::Eof => return Ok(()),
            TokenKind::Semi => {
                p.bump()?;
                class_body_members(p, children)?;
                return Ok(());
            }
            _ => {
                children.push(enum_constant(p)?);
                if !p.eat(TokenKind::Comma)? && !p.at(TokenKind::Semi) {
                    return Ok(());
                }
            }
        }
    }
}

/// `[@Ann]* Name ['(' args ')'] [class body]`
fn enum_constant(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut children = Vec::new();
    while p.at(TokenKind::At) {
        children.push(annotation::annotation(p)?);
    }
    children.push(super::identifier(p)?);
    if p.at(TokenKind::LParen) {
        children.extend(expression::arguments(p)?);
    }
    if p.at(TokenKind::LBrace) {
        p.bump()?;
        class_body_members(p, &mut children)?;
        p.expect(TokenKind::RBrace)?;
    }
    p.alloc(NodeKind::EnumConstant, start, children)
}

#[cfg(test)]
mod tests {
    use crate::node::{Attribute, NodeKind};
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

    #[test]
    fn fields_methods_and_constructors() {
        let tree = parse(
            "class A { int x, y = 2; A() { } A(int x) throws E { } void m() { } static int s() { return 0; } }",
        );
        assert_eq!(count(&tree, NodeKind::FieldDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::VariableDeclarator), 2);
        assert_eq!(count(&tree, NodeKind::ConstructorDeclaration), 2);
        assert_eq!(count(&tree, NodeKind::MethodDeclaration), 2);
        assert_eq!(count(&tree, NodeKind::ThrowsClause), 1);
    }

    #[test]
    fn initializer_blocks() {
        let tree = parse("class A { static { setup(); } { instanceInit(); } }");
        assert_eq!(count(&tree, NodeKind::InitializerBlock), 2);
    }

    #[test]
    fn generic_method_with_bounded_parameter() {
        let tree = parse("class A { <T extends Comparable<T>> T max(List<T> items) { return null; } }");
        assert_eq!(count(&tree, NodeKind::TypeParameter), 1);
        assert_eq!(count(&tree, NodeKind::MethodDeclaration), 1);
    }

    #[test]
    fn varargs_final_and_receiver_parameters() {
        let tree = parse("class A { void m(final int a, String... rest) { } void n(A this, int b) { } }");
        let params: Vec<_> = (0..tree.node_count())
            .filter(|&i| tree.node_at(i).kind() == NodeKind::ParameterDeclaration)
            .map(|i| tree.node_at(i).attribute().cloned().unwrap())
            .collect();
        assert_eq!(params.len(), 4);
        match &params[0] {
            Attribute::Parameter {
                name, is_final, ..
            } => {
                assert_eq!(name, "a");
                assert!(is_final);
            }
            other => panic!("unexpected attribute {other:?}"),
        }
        match &params[1] {
            Attribute::Parameter {
                name, is_varargs, ..
            } => {
                assert_eq!(name, "rest");
                assert!(is_varargs);
            }
            other => panic!("unexpected attribute {other:?}"),
        }
        match &params[2] {
            Attribute::Parameter {
                name, is_receiver, ..
            } => {
                assert_eq!(name, "this");
                assert!(is_receiver);
            }
            other => panic!("unexpected attribute {other:?}"),
        }
    }

    #[test]
    fn enum_constants_with_bodies_and_members() {
        let tree = parse(
            "enum Op { PLUS(\"+\") { int apply(int a, int b) { return a + b; } }, MINUS(\"-\"); \
             private final String symbol; Op(String symbol) { this.symbol = symbol; } }",
        );
        assert_eq!(count(&tree, NodeKind::EnumConstant), 2);
        assert_eq!(count(&tree, NodeKind::ConstructorDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::FieldDeclaration), 1);
    }

    #[test]
    fn annotation_member_with_default() {
        let tree = parse("@interface Config { String name() default \"test\"; int retries(); }");
        assert_eq!(count(&tree, NodeKind::AnnotationTypeDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::MethodDeclaration), 2);
        assert_eq!(count(&tree, NodeKind::StringLiteral), 1);
    }

    #[test]
    fn compact_record_constructor() {
        let tree = parse("record Point(int x, int y) { Point { if (x < 0) throw new E(); } }");
        assert_eq!(count(&tree, NodeKind::RecordDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::CompactConstructorDeclaration), 1);
    }

    #[test]
    fn stray_semicolons_become_empty_declarations() {
        let tree = parse("class A { ; void m() { } ; }");
        assert_eq!(count(&tree, NodeKind::EmptyDeclaration), 2);
    }
}
