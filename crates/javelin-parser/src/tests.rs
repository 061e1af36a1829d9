//! Cross-cutting tests: universal tree invariants, determinism laws, and
//! end-to-end scenarios.

use expect_test::expect;
use pretty_assertions::assert_eq;
use unindent::unindent;

use crate::node::{Attribute, NodeKind};
use crate::tree::{NodeView, Tree};
use crate::Parser;

fn parse(source: &str) -> Tree {
    Parser::new(source).parse().unwrap_or_else(|e| {
        panic!("parse failed for {source:?}: {e}");
    })
}

fn find(tree: &Tree, kind: NodeKind) -> NodeView<'_> {
    (0..tree.node_count())
        .map(|i| tree.node_at(i))
        .find(|n| n.kind() == kind)
        .unwrap_or_else(|| panic!("no {kind:?} node"))
}

/// The universal tree invariants: post-order allocation, span containment,
/// source-ordered children, unique root, exhaustive offsets.
fn assert_tree_invariants(tree: &Tree, source: &str) {
    let count = tree.node_count();
    let root = tree.node(tree.root());
    assert_eq!(tree.root().as_usize(), count - 1, "root is the last node");
    assert_eq!(root.kind(), NodeKind::CompilationUnit);
    assert_eq!(root.start(), 0);
    let unit_len: usize = source.chars().map(char::len_utf16).sum();
    assert!(root.end() as usize <= unit_len);
    let units = (0..count)
        .filter(|&i| tree.node_at(i).kind() == NodeKind::CompilationUnit)
        .count();
    assert_eq!(units, 1, "exactly one compilation unit");

    for i in 0..count {
        let node = tree.node_at(i);
        assert!(node.start() <= node.end());
        let children: Vec<_> = node.children().collect();
        if let (Some(first), Some(last)) = (children.first(), children.last()) {
            assert!(node.start() <= first.start(), "containment at node {i}");
            assert!(last.end() <= node.end(), "containment at node {i}");
        }
        let mut prev: Option<&NodeView<'_>> = None;
        for child in &children {
            assert!(
                child.index().as_usize() < i,
                "post-order violated at node {i}"
            );
            if let Some(before) = prev {
                assert!(
                    before.start() <= child.start(),
                    "children out of source order at node {i}"
                );
                if !before.kind().is_comment() && !child.kind().is_comment() {
                    assert!(
                        before.end() <= child.start(),
                        "sibling overlap at node {i}"
                    );
                }
            }
            prev = Some(child);
        }
    }
}

#[test]
fn invariants_hold_on_a_representative_source() {
    let source = unindent(
        r#"
        package com.example.geometry;

        import java.util.List;
        import static java.lang.Math.abs;

        /** Shapes. */
        public sealed interface Shape permits Circle, Rect {
            double area();
        }

        record Circle(double radius) implements Shape {
            public double area() {
                return Math.PI * radius * radius;
            }
        }

        final class Rect implements Shape {
            private final double w, h;

            Rect(double w, double h) {
                if (w < 0 || h < 0) throw new IllegalArgumentException();
                this.w = w;
                this.h = h;
            }

            public double area() {
                return abs(w * h);
            }

            static String describe(Object o) {
                return switch (o) {
                    case Circle c when c.radius() > 1.0 -> "big circle";
                    case Circle c -> "circle";
                    case Rect(double a, double b) -> "rect " + a + "x" + b;
                    case null, default -> "unknown";
                };
            }
        }
        "#,
    );
    let tree = parse(&source);
    assert_tree_invariants(&tree, &source);
}

#[test]
fn idempotence_identical_trees_across_parses() {
    let source = "class A { void m() { for (int i = 0; i < 10; i++) use(i); } }";
    assert_eq!(parse(source), parse(source));
}

#[test]
fn contextual_keyword_rename_preserves_shape() {
    fn shape(tree: &Tree) -> Vec<(NodeKind, usize)> {
        (0..tree.node_count())
            .map(|i| {
                let n = tree.node_at(i);
                (n.kind(), n.children().count())
            })
            .collect()
    }

    let baseline = parse(&template("x"));
    for name in [
        "yield", "record", "sealed", "permits", "when", "module", "requires", "exports",
        "opens", "uses", "provides", "with", "to", "var", "transitive", "open",
    ] {
        let renamed = parse(&template(name));
        assert_eq!(shape(&baseline), shape(&renamed), "renamed to {name}");
    }

    fn template(name: &str) -> String {
        format!("class A {{ void m() {{ int {name} = 1; {name} = {name} + 2; use({name}); }} }}")
    }
}

#[test]
fn nested_parentheses_within_recursion_limit_parse() {
    let mut source = String::from("class A { int x = ");
    source.push_str(&"(".repeat(30));
    source.push('1');
    source.push_str(&")".repeat(30));
    source.push_str("; }");
    assert!(Parser::new(&source).recursion_limit(200).parse().is_ok());
}

// --- end-to-end scenarios --------------------------------------------------

#[test]
fn scenario_minimal_class() {
    let tree = parse("class Test { }");
    expect![[r#"
        CompilationUnit@0..14
          ClassDeclaration@0..14 TypeName { name: "Test" }
    "#]]
    .assert_eq(&format!("{tree:?}"));
}

#[test]
fn scenario_annotation_member_with_string_default() {
    let source = "@interface Config\n{\n\tString name() default \"test\";\n}";
    let tree = parse(source);
    assert_tree_invariants(&tree, source);

    let decl = find(&tree, NodeKind::AnnotationTypeDeclaration);
    let children: Vec<_> = decl.children().collect();
    assert_eq!(children.len(), 1);
    let method = &children[0];
    assert_eq!(method.kind(), NodeKind::MethodDeclaration);
    assert_eq!(tree.text(method.index()), "String name() default \"test\";");

    let default_value = method
        .children()
        .find(|c| c.kind() == NodeKind::StringLiteral)
        .expect("default value literal");
    assert_eq!(tree.text(default_value.index()), "\"test\"");
}

#[test]
fn scenario_diamond_operator() {
    let tree = parse("class A { void m() { List<String> list = new ArrayList<>(); } }");

    let declared = find(&tree, NodeKind::ParameterizedType);
    assert_eq!(tree.text(declared.index()), "List<String>");

    let creation = find(&tree, NodeKind::ObjectCreation);
    let created_type = creation
        .children()
        .find(|c| c.kind() == NodeKind::ParameterizedType)
        .expect("created type");
    // Diamond: the type-argument list is empty, so the only child is the
    // qualified name.
    let children: Vec<_> = created_type.children().collect();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].kind(), NodeKind::QualifiedName);
    assert_eq!(tree.text(children[0].index()), "ArrayList");
}

#[test]
fn scenario_switch_with_guarded_pattern() {
    let source = unindent(
        r#"
        class A {
            void m(Object obj) {
                switch (obj) {
                  case String s when s.length() > 5 -> System.out.println(s);
                  default -> {}
                }
            }
        }
        "#,
    );
    let tree = parse(&source);
    assert_tree_invariants(&tree, &source);

    let switch_node = find(&tree, NodeKind::SwitchStatement);
    let first_case = switch_node
        .children()
        .find(|c| c.kind() == NodeKind::SwitchCase)
        .expect("first case");
    let guarded = first_case
        .children()
        .find(|c| c.kind() == NodeKind::GuardedPattern)
        .expect("guarded pattern");
    let parts: Vec<_> = guarded.children().collect();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].kind(), NodeKind::TypePattern);
    assert_eq!(tree.text(parts[0].index()), "String s");
    assert_eq!(parts[1].kind(), NodeKind::BinaryExpression);
    assert_eq!(tree.text(parts[1].index()), "s.length() > 5");
}

#[test]
fn scenario_yield_contextual_keyword() {
    // Outside a switch expression `yield` is an ordinary identifier.
    let tree = parse("class A { void m() { int yield = 42; } }");
    let declarator = find(&tree, NodeKind::VariableDeclarator);
    let name = declarator.children().next().unwrap();
    assert_eq!(name.kind(), NodeKind::Identifier);
    assert_eq!(tree.text(name.index()), "yield");
    assert_eq!(
        (0..tree.node_count())
            .filter(|&i| tree.node_at(i).kind() == NodeKind::YieldStatement)
            .count(),
        0
    );

    // Inside a switch expression it opens a yield statement.
    let tree = parse("class A { int m(int x) { return switch (x) { default: yield 42; }; } }");
    let yield_stmt = find(&tree, NodeKind::YieldStatement);
    assert_eq!(tree.text(yield_stmt.index()), "yield 42;");
}

#[test]
fn scenario_flexible_constructor_body() {
    let source = unindent(
        r#"
        class Base { Base(int x) {} }
        class Child extends Base {
          Child(int x) {
            if (x < 0) throw new IllegalArgumentException();
            super(x);
          }
        }
        "#,
    );
    let tree = parse(&source);
    assert_tree_invariants(&tree, &source);

    let ctor = (0..tree.node_count())
        .map(|i| tree.node_at(i))
        .filter(|n| n.kind() == NodeKind::ConstructorDeclaration)
        .max_by_key(|n| n.end() - n.start())
        .expect("Child constructor");
    let body = ctor
        .children()
        .find(|c| c.kind() == NodeKind::Block)
        .expect("constructor body");
    let kinds: Vec<_> = body.children().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::IfStatement,
            NodeKind::ExplicitConstructorInvocation,
        ],
        "the super(..) call is an ordinary statement after the prologue"
    );
}

// --- comment attachment ----------------------------------------------------

#[test]
fn comments_attach_to_enclosing_container() {
    let source = unindent(
        r#"
        // file header
        class A {
            // before method
            void m() {
                int x = 1; // trailing
                // standalone
            }
        }
        "#,
    );
    let tree = parse(&source);
    assert_tree_invariants(&tree, &source);

    let root = tree.node(tree.root());
    let root_kinds: Vec<_> = root.children().map(|c| c.kind()).collect();
    assert_eq!(
        root_kinds,
        vec![NodeKind::LineComment, NodeKind::ClassDeclaration]
    );

    let class = find(&tree, NodeKind::ClassDeclaration);
    let class_kinds: Vec<_> = class.children().map(|c| c.kind()).collect();
    assert_eq!(
        class_kinds,
        vec![NodeKind::LineComment, NodeKind::MethodDeclaration]
    );

    let block = find(&tree, NodeKind::Block);
    let block_kinds: Vec<_> = block.children().map(|c| c.kind()).collect();
    assert_eq!(
        block_kinds,
        vec![
            NodeKind::LocalVariableDeclaration,
            NodeKind::LineComment,
            NodeKind::LineComment,
        ],
        "a trailing comment attaches to the statement's container, after it"
    );
}

#[test]
fn javadoc_comments_are_distinct_nodes() {
    let source = "/** Doc. */\nclass A { /* plain */ }";
    let tree = parse(source);
    let root_kinds: Vec<_> = tree.node(tree.root()).children().map(|c| c.kind()).collect();
    assert_eq!(
        root_kinds,
        vec![NodeKind::JavadocComment, NodeKind::ClassDeclaration]
    );
    let class = find(&tree, NodeKind::ClassDeclaration);
    assert_eq!(
        class.children().map(|c| c.kind()).collect::<Vec<_>>(),
        vec![NodeKind::BlockComment]
    );
}

// --- failure semantics -----------------------------------------------------

#[test]
fn failure_returns_all_diagnostics_in_position_order() {
    // A lex error (bad escape) followed by a structural error.
    let errors = Parser::new("class A { String s = \"a\\q\"; int = ; }")
        .parse()
        .unwrap_err();
    assert!(errors.len() >= 2);
    let positions: Vec<_> = errors.iter().map(|d| d.position).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
    assert_eq!(errors.first().kind, crate::DiagnosticKind::LexError);
}

#[test]
fn lex_only_errors_still_fail_the_parse() {
    // Structurally fine, lexically not: no tree comes back.
    let errors = Parser::new("class A { int x = 079; }").parse().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().kind, crate::DiagnosticKind::LexError);
}

#[test]
fn no_partial_tree_on_structural_error() {
    assert!(Parser::new("class A { void m() { if } }").parse().is_err());
}

// --- attribute spot checks -------------------------------------------------

#[test]
fn import_attributes_round_out_the_data_model() {
    let tree = parse("import static a.b.C.d;\nclass A { }");
    let import = find(&tree, NodeKind::ImportDeclaration);
    assert_eq!(
        import.attribute(),
        Some(&Attribute::Import {
            name: "a.b.C.d".into(),
            is_static: true,
            is_on_demand: false,
        })
    );
}

#[test]
fn larger_program_satisfies_invariants() {
    let source = unindent(
        r#"
        package demo;

        import java.util.*;
        import module java.base;

        public class Kitchen<T extends Comparable<T>> {
            static final Map<String, List<Integer>> CACHE = new HashMap<>();

            @SafeVarargs
            static <V> List<V> listOf(V... items) {
                return Arrays.asList(items);
            }

            int compute(int a, int b) {
                int r = a << 2 >>> 1;
                r += (int) ((long) a * b % 7);
                var fn = (Runnable & java.io.Serializable) () -> { };
                try (var in = open("x")) {
                    do { r--; } while (r > 100);
                } catch (RuntimeException | Error e) {
                    throw e;
                } finally {
                    log();
                }
                outer:
                for (int i = 0, j = 1; i < b; i++, j <<= 1) {
                    if ((i & 1) == 0) continue outer;
                    r = r > 0 ? r : -r;
                }
                for (String s : names()) r += s.length();
                synchronized (this) { r++; }
                assert r >= 0 : "negative";
                return r;
            }
        }
        "#,
    );
    let tree = parse(&source);
    assert_tree_invariants(&tree, &source);
    assert_eq!(parse(&source), parse(&source));
}
