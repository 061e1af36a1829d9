//! The compilation unit: package declaration, imports (regular, static,
//! on-demand, and `import module`), top-level type declarations, and
//! implicit classes (top-level members with no enclosing type).

use crate::lexer::TokenKind;
use crate::node::{Attribute, NodeIndex, NodeKind};
use crate::parser::grammar::{annotation, declaration, member, ty};
use crate::parser::{ParseResult, Parser};

/// Parse one compilation unit. Always the last node allocated, and the
/// unique root: its span starts at offset 0.
pub(crate) fn compilation_unit(p: &mut Parser) -> ParseResult<NodeIndex> {
    let mut children = Vec::new();
    p.drain_comments_since(&mut children, 0)?;

    // Leading annotations belong to the package declaration if one
    // follows, otherwise to the first type declaration.
    let mut carried: Vec<NodeIndex> = Vec::new();
    let carried_start = p.start();
    if p.at(TokenKind::At) && p.nth(1) != TokenKind::InterfaceKw {
        let after = ty::scan_annotations(p, p.raw_pos());
        let package_follows = p.kind_raw(after) == TokenKind::PackageKw;
        while p.at(TokenKind::At) && p.nth(1) != TokenKind::InterfaceKw {
            carried.push(annotation::annotation(p)?);
        }
        if package_follows {
            children.push(package_declaration(p, carried_start, std::mem::take(&mut carried))?);
        }
    } else if p.at(TokenKind::PackageKw) {
        children.push(package_declaration(p, carried_start, Vec::new())?);
    }

    loop {
        p.drain_comments_since(&mut children, 0)?;
        if !p.at(TokenKind::ImportKw) {
            break;
        }
        children.push(import_declaration(p)?);
    }

    let mut implicit = false;
    loop {
        p.drain_comments_since(&mut children, 0)?;
        match p.peek() {
            TokenKind::Eof => break,
            TokenKind::Semi => {
                let start = p.start();
                p.bump()?;
                children.push(p.alloc(NodeKind::EmptyDeclaration, start, Vec::new())?);
            }
            _ => {
                let start = if carried.is_empty() {
                    p.start()
                } else {
                    carried_start
                };
                let mut mods = std::mem::take(&mut carried);
                mods.extend(declaration::modifiers(p)?);
                if declaration::at_type_declaration(p) {
                    children.push(declaration::type_declaration(p, start, mods)?);
                } else {
                    // JEP 512: an implicit class owns every remaining
                    // member.
                    children.push(implicit_class(p, start, mods)?);
                    implicit = true;
                }
            }
        }
        if implicit {
            p.drain_comments_since(&mut children, 0)?;
            break;
        }
    }

    if !carried.is_empty() || !p.at(TokenKind::Eof) {
        return Err(p.expected("a type declaration"));
    }

    let mut end = p.prev_end();
    for child in &children {
        end = end.max(p.node_end(*child));
    }
    p.alloc_span(NodeKind::CompilationUnit, 0, end, children)
}

fn package_declaration(
    p: &mut Parser,
    start: u32,
    anns: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    p.expect(TokenKind::PackageKw)?;
    let name = super::dotted_name(p)?;
    p.expect(TokenKind::Semi)?;
    p.alloc_attr(
        NodeKind::PackageDeclaration,
        start,
        anns,
        Attribute::Package { name },
    )
}

fn import_declaration(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    p.expect(TokenKind::ImportKw)?;

    // `import module M.N;` — `module` is contextual: `import module.x.C;`
    // names a package called `module`.
    if p.at_text("module") && p.nth(1) == TokenKind::Ident {
        p.bump()?;
        let module = super::dotted_name(p)?;
        p.expect(TokenKind::Semi)?;
        return p.alloc_attr(
            NodeKind::ModuleImportDeclaration,
            start,
            Vec::new(),
            Attribute::ModuleImport { module },
        );
    }

    let is_static = p.eat(TokenKind::StaticKw)?;
    let mut name = String::new();
    let mut is_on_demand = false;
    loop {
        if !p.at(TokenKind::Ident) {
            return Err(p.expected("an imported name"));
        }
        name.push_str(p.current().text());
        p.bump()?;
        if !p.at(TokenKind::Dot) {
            break;
        }
        match p.nth(1) {
            TokenKind::Ident => {
                name.push('.');
                p.bump()?;
            }
            TokenKind::Star => {
                p.bump()?;
                p.bump()?;
                is_on_demand = true;
                break;
            }
            _ => return Err(p.expected("an imported name or `*`")),
        }
    }
    p.expect(TokenKind::Semi)?;
    p.alloc_attr(
        NodeKind::ImportDeclaration,
        start,
        Vec::new(),
        Attribute::Import {
            name,
            is_static,
            is_on_demand,
        },
    )
}

/// Top-level members with no enclosing declaration form one implicit
/// class spanning them all.
fn implicit_class(
    p: &mut Parser,
    start: u32,
    first_mods: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    let mut members = vec![member::member_rest(p, start, first_mods)?];
    loop {
        p.drain_comments_since(&mut members, start)?;
        match p.peek() {
            TokenKind::Eof => break,
            TokenKind::Semi => {
                let s = p.start();
                p.bump()?;
                members.push(p.alloc(NodeKind::EmptyDeclaration, s, Vec::new())?);
            }
            _ => members.push(member::member(p)?),
        }
    }
    p.alloc(NodeKind::ImplicitClassDeclaration, start, members)
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

    fn attribute_of(tree: &Tree, kind: NodeKind) -> Attribute {
        (0..tree.node_count())
            .map(|i| tree.node_at(i))
            .find(|n| n.kind() == kind)
            .and_then(|n| n.attribute().cloned())
            .unwrap()
    }

    #[test]
    fn package_and_imports() {
        let tree = parse(
            "package com.example.app;\n\
             import java.util.List;\n\
             import static java.util.Objects.requireNonNull;\n\
             import java.util.*;\n\
             class A { }",
        );
        assert_eq!(
            attribute_of(&tree, NodeKind::PackageDeclaration),
            Attribute::Package {
                name: "com.example.app".into()
            }
        );
        assert_eq!(count(&tree, NodeKind::ImportDeclaration), 3);
        let imports: Vec<_> = (0..tree.node_count())
            .map(|i| tree.node_at(i))
            .filter(|n| n.kind() == NodeKind::ImportDeclaration)
            .map(|n| n.attribute().cloned().unwrap())
            .collect();
        assert_eq!(
            imports[1],
            Attribute::Import {
                name: "java.util.Objects.requireNonNull".into(),
                is_static: true,
                is_on_demand: false,
            }
        );
        assert_eq!(
            imports[2],
            Attribute::Import {
                name: "java.util".into(),
                is_static: false,
                is_on_demand: true,
            }
        );
    }

    #[test]
    fn annotated_package_declaration() {
        let tree = parse("@Generated package tools.out;\nclass A { }");
        let package = (0..tree.node_count())
            .map(|i| tree.node_at(i))
            .find(|n| n.kind() == NodeKind::PackageDeclaration)
            .unwrap();
        assert_eq!(package.children().count(), 1);
        assert_eq!(count(&tree, NodeKind::Annotation), 1);
    }

    #[test]
    fn leading_annotation_binds_to_type_when_no_package() {
        let tree = parse("@Deprecated class A { }");
        let class = (0..tree.node_count())
            .map(|i| tree.node_at(i))
            .find(|n| n.kind() == NodeKind::ClassDeclaration)
            .unwrap();
        assert_eq!(class.children().count(), 1);
    }

    #[test]
    fn module_import_is_contextual() {
        let tree = parse("import module java.base;\nclass A { }");
        assert_eq!(
            attribute_of(&tree, NodeKind::ModuleImportDeclaration),
            Attribute::ModuleImport {
                module: "java.base".into()
            }
        );

        // `module` as a package name still works.
        let tree = parse("import module.util.Helper;\nclass A { }");
        assert_eq!(count(&tree, NodeKind::ModuleImportDeclaration), 0);
        assert_eq!(
            attribute_of(&tree, NodeKind::ImportDeclaration),
            Attribute::Import {
                name: "module.util.Helper".into(),
                is_static: false,
                is_on_demand: false,
            }
        );
    }

    #[test]
    fn implicit_class_wraps_top_level_members() {
        let tree = parse(
            "import java.util.List;\n\
             String greeting = \"hi\";\n\
             void main() {\n    System.out.println(greeting);\n}\n",
        );
        assert_eq!(count(&tree, NodeKind::ImplicitClassDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::FieldDeclaration), 1);
        assert_eq!(count(&tree, NodeKind::MethodDeclaration), 1);
    }

    #[test]
    fn empty_source_produces_bare_compilation_unit() {
        let tree = parse("");
        let root = tree.node(tree.root());
        assert_eq!(root.kind(), NodeKind::CompilationUnit);
        assert_eq!(root.children().count(), 0);
        assert_eq!((root.start(), root.end()), (0, 0));
    }
}
