//! Type declarations for all five kinds, with modifiers and the
//! extends/implements/permits clauses. The declared simple name is carried
//! as a node attribute; members are direct children.

use crate::lexer::TokenKind;
use crate::node::{Attribute, NodeIndex, NodeKind};
use crate::parser::grammar::{annotation, member, ty};
use crate::parser::{ParseResult, Parser};

fn is_modifier_keyword(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::PublicKw
            | TokenKind::ProtectedKw
            | TokenKind::PrivateKw
            | TokenKind::StaticKw
            | TokenKind::FinalKw
            | TokenKind::AbstractKw
            | TokenKind::DefaultKw
            | TokenKind::SynchronizedKw
            | TokenKind::NativeKw
            | TokenKind::StrictfpKw
            | TokenKind::TransientKw
            | TokenKind::VolatileKw
            | TokenKind::NonSealed
    )
}

/// Annotations and modifier keywords in any order. `sealed` counts only
/// when what follows can still begin a declaration, so `sealed` the field
/// type or variable name stays an identifier.
pub(crate) fn modifiers(p: &mut Parser) -> ParseResult<Vec<NodeIndex>> {
    let mut mods = Vec::new();
    loop {
        if p.at(TokenKind::At) && p.nth(1) != TokenKind::InterfaceKw {
            mods.push(annotation::annotation(p)?);
            continue;
        }
        if is_modifier_keyword(p.peek()) || (p.at_text("sealed") && declaration_follows(p, 1)) {
            let start = p.start();
            p.bump()?;
            mods.push(p.alloc(NodeKind::Modifier, start, Vec::new())?);
            continue;
        }
        return Ok(mods);
    }
}

fn declaration_follows(p: &Parser, n: usize) -> bool {
    match p.nth(n) {
        TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => true,
        kind if is_modifier_keyword(kind) => true,
        TokenKind::Ident => matches!(p.nth_text(n), "sealed" | "record"),
        _ => false,
    }
}

/// Does the current token open a type declaration? Modifiers must already
/// be consumed. `record` is contextual: it opens a declaration only when a
/// name and a header follow.
pub(crate) fn at_type_declaration(p: &Parser) -> bool {
    match p.peek() {
        TokenKind::ClassKw | TokenKind::InterfaceKw | TokenKind::EnumKw => true,
        TokenKind::At => p.nth(1) == TokenKind::InterfaceKw,
        TokenKind::Ident => {
            p.at_text("record")
                && p.nth(1) == TokenKind::Ident
                && matches!(p.nth(2), TokenKind::LParen | TokenKind::Lt)
        }
        _ => false,
    }
}

/// One type declaration with pre-parsed modifiers. `start` is the offset
/// of the first modifier or of the keyword.
pub(crate) fn type_declaration(
    p: &mut Parser,
    start: u32,
    mods: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    match p.peek() {
        TokenKind::ClassKw => class_declaration(p, start, mods),
        TokenKind::InterfaceKw => interface_declaration(p, start, mods),
        TokenKind::EnumKw => enum_declaration(p, start, mods),
        TokenKind::At => annotation_type_declaration(p, start, mods),
        TokenKind::Ident if p.at_text("record") => record_declaration(p, start, mods),
        _ => Err(p.expected("a type declaration")),
    }
}

fn declared_name(p: &mut Parser) -> ParseResult<String> {
    if !p.at(TokenKind::Ident) {
        return Err(p.expected("a type name"));
    }
    let name = p.current().text().to_owned();
    p.bump()?;
    Ok(name)
}

fn class_declaration(
    p: &mut Parser,
    start: u32,
    mods: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::ClassKw)?;
    let name = declared_name(p)?;
    let mut children = mods;
    if p.at(TokenKind::Lt) {
        children.extend(ty::type_parameters(p)?);
    }
    if p.at(TokenKind::ExtendsKw) {
        let s = p.start();
        p.bump()?;
        let sup = ty::type_(p)?;
        children.push(p.alloc(NodeKind::ExtendsClause, s, vec![sup])?);
    }
    if p.at(TokenKind::ImplementsKw) {
        children.push(type_list_clause(p, NodeKind::ImplementsClause)?);
    }
    if p.at_text("permits") {
        children.push(type_list_clause(p, NodeKind::PermitsClause)?);
    }
    p.expect(TokenKind::LBrace)?;
    member::class_body_members(p, &mut children)?;
    p.expect(TokenKind::RBrace)?;
    p.alloc_attr(
        NodeKind::ClassDeclaration,
        start,
        children,
        Attribute::TypeName { name },
    )
}

fn interface_declaration(
    p: &mut Parser,
    start: u32,
    mods: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::InterfaceKw)?;
    let name = declared_name(p)?;
    let mut children = mods;
    if p.at(TokenKind::Lt) {
        children.extend(ty::type_parameters(p)?);
    }
    if p.at(TokenKind::ExtendsKw) {
        children.push(type_list_clause(p, NodeKind::ExtendsClause)?);
    }
    if p.at_text("permits") {
        children.push(type_list_clause(p, NodeKind::PermitsClause)?);
    }
    p.expect(TokenKind::LBrace)?;
    member::class_body_members(p, &mut children)?;
    p.expect(TokenKind::RBrace)?;
    p.alloc_attr(
        NodeKind::InterfaceDeclaration,
        start,
        children,
        Attribute::TypeName { name },
    )
}

fn enum_declaration(p: &mut Parser, start: u32, mods: Vec<NodeIndex>) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::EnumKw)?;
    let name = declared_name(p)?;
    let mut children = mods;
    if p.at(TokenKind::ImplementsKw) {
        children.push(type_list_clause(p, NodeKind::ImplementsClause)?);
    }
    p.expect(TokenKind::LBrace)?;
    member::enum_body(p, &mut children)?;
    p.expect(TokenKind::RBrace)?;
    p.alloc_attr(
        NodeKind::EnumDeclaration,
        start,
        children,
        Attribute::TypeName { name },
    )
}

fn record_declaration(
    p: &mut Parser,
    start: u32,
    mods: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    p.bump()?; // `record`
    let name = declared_name(p)?;
    let mut children = mods;
    if p.at(TokenKind::Lt) {
        children.extend(ty::type_parameters(p)?);
    }
    children.extend(member::formal_parameters(p)?);
    if p.at(TokenKind::ImplementsKw) {
        children.push(type_list_clause(p, NodeKind::ImplementsClause)?);
    }
    p.expect(TokenKind::LBrace)?;
    member::class_body_members(p, &mut children)?;
    p.expect(TokenKind::RBrace)?;
    p.alloc_attr(
        NodeKind::RecordDeclaration,
        start,
        children,
        Attribute::TypeName { name },
    )
}

fn annotation_type_declaration(
    p: &mut Parser,
    start: u32,
    mods: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::At)?;
    p.expect(TokenKind::InterfaceKw)?;
    let name = declared_name(p)?;
    let mut children = mods;
    p.expect(TokenKind::LBrace)?;
    member::class_body_members(p, &mut children)?;
    p.expect(TokenKind::RBrace)?;
    p.alloc_attr(
        NodeKind::AnnotationTypeDeclaration,
        start,
        children,
        Attribute::TypeName { name },
    )
}

/// `keyword Type (',' Type)*` clauses: implements, interface extends,
/// permits.
fn type_list_clause(p: &mut Parser, kind: NodeKind) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.bump()?; // the introducing keyword (or contextual `permits`)
    let mut types = vec![ty::type_(p)?];
    while p.eat(TokenKind::Comma)? {
        types.push(ty::type_(p)?);
    }
    p.alloc(kind, start, types)
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

    fn type_name(tree: &Tree, kind: NodeKind) -> String {
        let node = (0..tree.node_count())
            .map(|i| tree.node_at(i))
            .find(|n| n.kind() == kind)
            .unwrap();
        match node.attribute() {
            Some(Attribute::TypeName { name }) => name.clone(),
            other => panic!("expected a TypeName attribute, got {other:?}"),
        }
    }

    #[test]
    fn five_declaration_kinds() {
        let tree = parse(
            "class C { } interface I { } enum E { A } record R(int x) { } @interface N { }",
        );
        assert_eq!(count(&tree, NodeKind::ClassDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::InterfaceDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::EnumDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::RecordDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::AnnotationTypeDeclaration), 1);
    }

    #[test]
    fn declared_names_are_attributes() {
        let tree = parse("class Widget { }");
        assert_eq!(type_name(&tree, NodeKind::ClassDeclaration), "Widget");
    }

    #[test]
    fn sealed_hierarchy_with_permits() {
        let tree = parse(
            "sealed interface Shape permits Circle, Square { }\n\
             final class Circle implements Shape { }\n\
             non-sealed class Square implements Shape { }",
        );
        assert_eq!(count(&tree, NodeKind::PermitsClause), 1);
        assert_eq!(count(&tree, NodeKind::ImplementsClause), 2);
        // `sealed`, `final`, `non-sealed`.
        assert_eq!(count(&tree, NodeKind::Modifier), 3);
    }

    #[test]
    fn sealed_as_plain_identifier() {
        let tree = parse("class A { int sealed = 1; sealed.Thing t; }");
        assert_eq!(count(&tree, NodeKind::Modifier), 0);
        assert_eq!(count(&tree, NodeKind::FieldDeclaration), 2);
    }

    #[test]
    fn record_as_plain_identifier() {
        let tree = parse("class A { Record record; void m() { record = null; } }");
        assert_eq!(count(&tree, NodeKind::RecordDeclaration), 0);
    }

    #[test]
    fn extends_and_implements_clauses() {
        let tree = parse("class A extends Base implements I, J { }");
        assert_eq!(count(&tree, NodeKind::ExtendsClause), 1);
        let implements = (0..tree.node_count())
            .map(|i| tree.node_at(i))
            .find(|n| n.kind() == NodeKind::ImplementsClause)
            .unwrap();
        assert_eq!(implements.children().count(), 2);
    }

    #[test]
    fn nested_and_generic_types() {
        let tree = parse("class Outer<T> { static class Nested { } interface Inner { } }");
        assert_eq!(count(&tree, NodeKind::ClassDeclaration), 2);
        assert_eq!(count(&tree, NodeKind::InterfaceDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::TypeParameter), 1);
    }
}
