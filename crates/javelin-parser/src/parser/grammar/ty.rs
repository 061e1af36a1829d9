//! Types: primitive, qualified, parameterized, wildcard, union, array.
//!
//! This module also hosts the speculative token scans the parser uses to
//! disambiguate without committing: a type-argument list is only accepted
//! once a matching `>` is reachable (splitting `>>`/`>>>` as needed), and
//! cast/declaration decisions run [`scan_type`] over the raw token stream
//! first.

use crate::lexer::TokenKind;
use crate::node::{NodeIndex, NodeKind};
use crate::parser::grammar::annotation;
use crate::parser::{ParseResult, Parser};

pub(crate) fn is_primitive(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::BooleanKw
            | TokenKind::ByteKw
            | TokenKind::ShortKw
            | TokenKind::IntKw
            | TokenKind::LongKw
            | TokenKind::CharKw
            | TokenKind::FloatKw
            | TokenKind::DoubleKw
    )
}

/// Parse a type, including leading type annotations and trailing array
/// dimensions.
pub(crate) fn type_(p: &mut Parser) -> ParseResult<NodeIndex> {
    p.enter()?;
    let result = type_inner(p);
    p.leave();
    result
}

fn type_inner(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut anns = Vec::new();
    while p.at(TokenKind::At) {
        anns.push(annotation::annotation(p)?);
    }
    type_with_annotations(p, start, anns)
}

/// Continue a type whose leading annotations were already consumed.
pub(crate) fn type_with_annotations(
    p: &mut Parser,
    start: u32,
    anns: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    let base = if is_primitive(p.peek()) {
        p.bump()?;
        p.alloc(NodeKind::PrimitiveType, start, anns)?
    } else {
        class_type(p, start, anns)?
    };
    array_dims(p, base, start)
}

/// A return type: `void` or any type.
pub(crate) fn return_type(p: &mut Parser) -> ParseResult<NodeIndex> {
    if p.at(TokenKind::VoidKw) {
        let start = p.start();
        p.bump()?;
        return p.alloc(NodeKind::PrimitiveType, start, Vec::new());
    }
    type_(p)
}

/// The created type of a `new` expression: a class type without trailing
/// array dimensions, which creation syntax owns.
pub(crate) fn class_type_for_creation(
    p: &mut Parser,
    start: u32,
    anns: Vec<NodeIndex>,
) -> ParseResult<NodeIndex> {
    class_type(p, start, anns)
}

/// `Name ('.' Name)* [TypeArgs] ('.' Name [TypeArgs])*`
fn class_type(p: &mut Parser, start: u32, anns: Vec<NodeIndex>) -> ParseResult<NodeIndex> {
    let name_start = p.start();
    let mut segments = Vec::new();
    loop {
        let s = p.start();
        if !p.at(TokenKind::Ident) {
            return Err(p.expected("a type name"));
        }
        p.bump()?;
        segments.push(p.alloc(NodeKind::Identifier, s, Vec::new())?);
        if p.at(TokenKind::Lt) {
            break;
        }
        if p.at(TokenKind::Dot) && p.nth(1) == TokenKind::Ident {
            p.bump()?;
        } else {
            break;
        }
    }
    let name = p.alloc(NodeKind::QualifiedName, name_start, segments)?;

    let mut node = if p.at(TokenKind::Lt) {
        let mut children = anns;
        children.push(name);
        children.extend(type_arguments(p)?);
        p.alloc(NodeKind::ParameterizedType, start, children)?
    } else {
        let mut children = anns;
        children.push(name);
        p.alloc(NodeKind::QualifiedType, start, children)?
    };

    // Chained member types after a parameterized segment: `A<B>.C<D>`.
    while p.at(TokenKind::Dot) && p.nth(1) == TokenKind::Ident {
        p.bump()?;
        let mut children = vec![node];
        while p.at(TokenKind::At) {
            children.push(annotation::annotation(p)?);
        }
        let s = p.start();
        p.bump()?;
        children.push(p.alloc(NodeKind::Identifier, s, Vec::new())?);
        node = if p.at(TokenKind::Lt) {
            children.extend(type_arguments(p)?);
            p.alloc(NodeKind::ParameterizedType, start, children)?
        } else {
            p.alloc(NodeKind::QualifiedType, start, children)?
        };
    }
    Ok(node)
}

/// `'<' [TypeArgument (',' TypeArgument)*] '>'` — the close may come from
/// splitting a `>>`-family token. A diamond produces no child types.
pub(crate) fn type_arguments(p: &mut Parser) -> ParseResult<Vec<NodeIndex>> {
    p.expect(TokenKind::Lt)?;
    let mut args = Vec::new();
    if at_type_list_close(p) {
        p.expect_type_list_close()?;
        return Ok(args);
    }
    loop {
        args.push(type_argument(p)?);
        if !p.eat(TokenKind::Comma)? {
            break;
        }
    }
    p.expect_type_list_close()?;
    Ok(args)
}

fn at_type_list_close(p: &Parser) -> bool {
    p.at(TokenKind::Gt) || p.peek().is_splittable()
}

fn type_argument(p: &mut Parser) -> ParseResult<NodeIndex> {
    let start = p.start();
    let mut anns = Vec::new();
    while p.at(TokenKind::At) {
        anns.push(annotation::annotation(p)?);
    }
    if p.at(TokenKind::Question) {
        p.bump()?;
        let mut children = anns;
        if p.eat(TokenKind::ExtendsKw)? || p.eat(TokenKind::SuperKw)? {
            children.push(type_(p)?);
        }
        return p.alloc(NodeKind::WildcardType, start, children);
    }
    type_with_annotations(p, start, anns)
}

/// Zero or more `[]` dimensions, each optionally preceded by type
/// annotations, wrapping the element type.
pub(crate) fn array_dims(
    p: &mut Parser,
    mut node: NodeIndex,
    start: u32,
) -> ParseResult<NodeIndex> {
    loop {
        if p.at(TokenKind::LBracket) && p.nth(1) == TokenKind::RBracket {
            p.bump()?;
            p.bump()?;
            node = p.alloc(NodeKind::ArrayType, start, vec![node])?;
            continue;
        }
        if p.at(TokenKind::At) {
            let after = scan_annotations(p, p.raw_pos());
            if p.kind_raw(after) == TokenKind::LBracket {
                let mut children = vec![node];
                while p.at(TokenKind::At) {
                    children.push(annotation::annotation(p)?);
                }
                p.expect(TokenKind::LBracket)?;
                p.expect(TokenKind::RBracket)?;
                node = p.alloc(NodeKind::ArrayType, start, children)?;
                continue;
            }
        }
        return Ok(node);
    }
}

/// `'<' TypeParameter (',' TypeParameter)* '>'` on a declaration.
pub(crate) fn type_parameters(p: &mut Parser) -> ParseResult<Vec<NodeIndex>> {
    p.expect(TokenKind::Lt)?;
    let mut params = Vec::new();
    loop {
        let start = p.start();
        let mut children = Vec::new();
        while p.at(TokenKind::At) {
            children.push(annotation::annotation(p)?);
        }
        children.push(super::identifier(p)?);
        if p.eat(TokenKind::ExtendsKw)? {
            children.push(type_(p)?);
            while p.eat(TokenKind::Amp)? {
                children.push(type_(p)?);
            }
        }
        params.push(p.alloc(NodeKind::TypeParameter, start, children)?);
        if !p.eat(TokenKind::Comma)? {
            break;
        }
    }
    p.expect_type_list_close()?;
    Ok(params)
}

// --- speculative scans -----------------------------------------------------
//
// These walk the raw token stream without consuming anything. They accept a
// superset of the grammar; the committed parse afterwards reports precise
// errors.

/// If the tokens starting at `raw` form a type, return the raw index just
/// past it.
pub(crate) fn scan_type(p: &Parser, raw: usize) -> Option<usize> {
    let mut raw = scan_annotations(p, raw);
    if is_primitive(p.kind_raw(raw)) {
        raw = p.next_sig(raw);
    } else if p.kind_raw(raw) == TokenKind::Ident {
        raw = p.next_sig(raw);
        loop {
            if p.kind_raw(raw) == TokenKind::Lt {
                raw = scan_type_args(p, raw)?;
            }
            if p.kind_raw(raw) == TokenKind::Dot
                && p.kind_raw(p.next_sig(raw)) == TokenKind::Ident
            {
                raw = p.next_sig(p.next_sig(raw));
            } else {
                break;
            }
        }
    } else {
        return None;
    }
    Some(scan_dims(p, raw))
}

/// Skip `(@Ann | @Ann(..))*`, returning the index after them.
pub(crate) fn scan_annotations(p: &Parser, mut raw: usize) -> usize {
    while let Some(after) = scan_annotation(p, raw) {
        raw = after;
    }
    raw
}

fn scan_annotation(p: &Parser, raw: usize) -> Option<usize> {
    if p.kind_raw(raw) != TokenKind::At {
        return None;
    }
    let mut raw = p.next_sig(raw);
    if p.kind_raw(raw) != TokenKind::Ident {
        return None;
    }
    raw = p.next_sig(raw);
    while p.kind_raw(raw) == TokenKind::Dot && p.kind_raw(p.next_sig(raw)) == TokenKind::Ident {
        raw = p.next_sig(p.next_sig(raw));
    }
    if p.kind_raw(raw) == TokenKind::LParen {
        raw = scan_balanced_parens(p, raw)?;
    }
    Some(raw)
}

/// From an `(`, return the index just past its matching `)`.
pub(crate) fn scan_balanced_parens(p: &Parser, raw: usize) -> Option<usize> {
    debug_assert_eq!(p.kind_raw(raw), TokenKind::LParen);
    let mut depth = 0usize;
    let mut raw = raw;
    loop {
        match p.kind_raw(raw) {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(p.next_sig(raw));
                }
            }
            TokenKind::Eof => return None,
            _ => {}
        }
        raw = p.next_sig(raw);
    }
}

/// From a `<`, scan a plausible type-argument list, counting the `>`s
/// packed into `>>`/`>>>` and their compound-assignment forms.
pub(crate) fn scan_type_args(p: &Parser, raw: usize) -> Option<usize> {
    debug_assert_eq!(p.kind_raw(raw), TokenKind::Lt);
    let mut depth: i32 = 0;
    let mut raw = raw;
    loop {
        match p.kind_raw(raw) {
            TokenKind::Lt => depth += 1,
            TokenKind::Gt | TokenKind::GtEq => depth -= 1,
            TokenKind::Shr | TokenKind::ShrEq => depth -= 2,
            TokenKind::UShr | TokenKind::UShrEq => depth -= 3,
            TokenKind::Ident
            | TokenKind::Dot
            | TokenKind::Comma
            | TokenKind::Question
            | TokenKind::ExtendsKw
            | TokenKind::SuperKw
            | TokenKind::Amp
            | TokenKind::At
            | TokenKind::LBracket
            | TokenKind::RBracket => {}
            kind if is_primitive(kind) => {}
            TokenKind::LParen => {
                // Annotation arguments inside a type annotation.
                raw = scan_balanced_parens(p, raw)?;
                continue;
            }
            _ => return None,
        }
        let next = p.next_sig(raw);
        if depth <= 0 {
            return Some(next);
        }
        raw = next;
    }
}

fn scan_dims(p: &Parser, mut raw: usize) -> usize {
    loop {
        let after_anns = scan_annotations(p, raw);
        if p.kind_raw(after_anns) == TokenKind::LBracket
            && p.kind_raw(p.next_sig(after_anns)) == TokenKind::RBracket
        {
            raw = p.next_sig(p.next_sig(after_anns));
        } else {
            return raw;
        }
    }
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

    fn find_kinds(tree: &Tree, kind: NodeKind) -> usize {
        (0..tree.node_count())
            .filter(|&i| tree.node_at(i).kind() == kind)
            .count()
    }

    #[test]
    fn nested_generics_close_with_split_shr() {
        let tree = parse("class A { Map<K, List<V>> m; }");
        assert_eq!(find_kinds(&tree, NodeKind::ParameterizedType), 2);
    }

    #[test]
    fn splitting_shr_yields_adjacent_one_unit_closers() {
        let tree = parse("class A { Map<K, List<V>> m; }");
        let mut param_types: Vec<_> = (0..tree.node_count())
            .map(|i| tree.node_at(i))
            .filter(|n| n.kind() == NodeKind::ParameterizedType)
            .collect();
        param_types.sort_by_key(|n| n.start());
        let (outer, inner) = (&param_types[0], &param_types[1]);
        // The `>>` token was consumed as two one-unit `>`s.
        assert_eq!(inner.end() + 1, outer.end());
    }

    #[test]
    fn triple_nested_generics_split_ushr() {
        let tree = parse("class A { Map<K, Map<K, List<V>>> m; }");
        assert_eq!(find_kinds(&tree, NodeKind::ParameterizedType), 3);
    }

    #[test]
    fn wildcard_bounds() {
        let tree = parse("class A { List<? extends Number> a; List<? super T> b; List<?> c; }");
        assert_eq!(find_kinds(&tree, NodeKind::WildcardType), 3);
    }

    #[test]
    fn array_types_wrap_element_type() {
        let tree = parse("class A { int[][] grid; String[] names; }");
        assert_eq!(find_kinds(&tree, NodeKind::ArrayType), 3);
    }

    #[test]
    fn annotated_type_and_dimensions() {
        let tree = parse("class A { @NonNull String @Readonly [] names; }");
        assert_eq!(find_kinds(&tree, NodeKind::Annotation), 2);
        assert_eq!(find_kinds(&tree, NodeKind::ArrayType), 1);
    }

    #[test]
    fn qualified_generic_member_type() {
        let tree = parse("class A { Outer<K>.Inner<V> x; }");
        assert_eq!(find_kinds(&tree, NodeKind::ParameterizedType), 2);
    }

    #[test]
    fn type_parameter_bounds() {
        let tree = parse("class A<T extends Comparable<T> & java.io.Serializable> { }");
        assert_eq!(find_kinds(&tree, NodeKind::TypeParameter), 1);
    }
}
