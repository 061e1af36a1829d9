//! Recursive-descent parser for Java compilation units.
//!
//! The parser owns the token list and the arena for the duration of one
//! parse. Every production records the start offset of its first token,
//! parses its children, then allocates its own node with the end offset of
//! the last consumed token, which yields post-order allocation: children
//! always have smaller indices than their parent.
//!
//! On the first structural error the parse aborts; there is no recovery.
//! Productions return `Result<_, ParseAbort>` and propagate with `?`; the
//! diagnostic itself is pushed into the error list at the point of failure.

pub(crate) mod grammar;

use std::time::Duration;

use crate::arena::Arena;
use crate::error::{Diagnostic, DiagnosticKind, Diagnostics, ResourceLimit};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::limit::{Deadline, LimitTracker, ParserLimits};
use crate::location::LineIndex;
use crate::node::{Attribute, NodeIndex, NodeKind};
use crate::tree::Tree;

/// Marker for an aborted parse. The diagnostic has already been recorded;
/// this only unwinds the recursive descent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParseAbort;

pub(crate) type ParseResult<T> = Result<T, ParseAbort>;

/// Parse Java source text into a [`Tree`].
///
/// ## Example
///
/// ```rust
/// use javelin_parser::Parser;
///
/// let tree = Parser::new("class Greeter { void greet() { } }")
///     .parse()
///     .expect("valid source");
/// assert_eq!(tree.node(tree.root()).kind(), javelin_parser::NodeKind::CompilationUnit);
/// ```
///
/// Limits are configured up front and enforced for the single parse the
/// instance performs:
///
/// ```rust
/// use javelin_parser::Parser;
///
/// let result = Parser::new("class A { }").recursion_limit(50).parse();
/// assert!(result.is_ok());
/// ```
#[derive(Debug)]
pub struct Parser<'a> {
    source: &'a str,
    limits: ParserLimits,
    line_index: LineIndex,
    tokens: Vec<Token<'a>>,
    /// Raw index into `tokens`; after priming it always rests on a
    /// significant token (possibly EOF).
    pos: usize,
    /// End offset of the last consumed significant token.
    prev_end: u32,
    /// Comments seen since the enclosing container last drained them.
    pending_comments: Vec<(NodeKind, u32, u32)>,
    arena: Arena,
    errors: Vec<Diagnostic>,
    recursion: LimitTracker,
    deadline: Deadline,
    /// Whether a `yield` statement is currently legal, i.e. the nearest
    /// enclosing switch body belongs to a switch expression.
    pub(crate) yield_ctx: bool,
}

impl<'a> Parser<'a> {
    /// Create a new instance of a parser given the source text.
    pub fn new(source: &'a str) -> Self {
        let limits = ParserLimits::default();
        Self {
            source,
            limits,
            line_index: LineIndex::new(source),
            tokens: Vec::new(),
            pos: 0,
            prev_end: 0,
            pending_comments: Vec::new(),
            arena: Arena::with_limit(limits.nodes),
            errors: Vec::new(),
            recursion: LimitTracker::new(limits.recursion),
            deadline: Deadline::new(limits.deadline),
            yield_ctx: false,
        }
    }

    /// Configure the recursion limit for nested expressions, types,
    /// statements and patterns.
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.limits.recursion = limit;
        self
    }

    /// Configure the cap on significant tokens, checked when lexing
    /// completes.
    pub fn token_limit(mut self, limit: usize) -> Self {
        self.limits.tokens = limit;
        self
    }

    /// Configure the cap on arena nodes.
    pub fn node_limit(mut self, limit: usize) -> Self {
        self.limits.nodes = limit;
        self
    }

    /// Configure the cap on source size in bytes of the UTF-8 encoding.
    pub fn source_limit(mut self, bytes: usize) -> Self {
        self.limits.source_bytes = bytes;
        self
    }

    /// Configure the wall-clock budget for this parse.
    pub fn deadline(mut self, budget: Duration) -> Self {
        self.limits.deadline = budget;
        self
    }

    /// Run the parse. Returns the frozen tree, or every diagnostic
    /// accumulated, ordered by source position. There is no partial tree.
    pub fn parse(mut self) -> Result<Tree, Diagnostics> {
        if self.source.len() > self.limits.source_bytes {
            let d = self.diagnostic_at(
                0,
                DiagnosticKind::ResourceExhausted(ResourceLimit::SourceSize),
                format!(
                    "source size exceeds the {} byte limit",
                    self.limits.source_bytes
                ),
            );
            return Err(Diagnostics(vec![d]));
        }

        let (tokens, lex_errors) = Lexer::new(self.source, &self.line_index).lex();
        self.errors = lex_errors;
        if let Some(over) = nth_significant(&tokens, self.limits.tokens) {
            let d = self.diagnostic_at(
                over.start(),
                DiagnosticKind::ResourceExhausted(ResourceLimit::TokenCount),
                "token limit reached, aborting parse",
            );
            self.errors.push(d);
            return Err(self.finish_errors());
        }
        let mut token_usage = LimitTracker::new(self.limits.tokens);
        token_usage.high = tokens
            .iter()
            .filter(|t| !t.kind().is_trivia() && t.kind() != TokenKind::Eof)
            .count();
        self.tokens = tokens;

        self.arena = Arena::with_limit(self.limits.nodes);
        self.recursion = LimitTracker::new(self.limits.recursion);
        self.deadline = Deadline::new(self.limits.deadline);
        self.skip_trivia();

        let root = grammar::compilation_unit::compilation_unit(&mut self);

        tracing::debug!(
            nodes = self.arena.node_count(),
            recursion_high = self.recursion.high,
            errors = self.errors.len(),
            "parse finished"
        );

        match root {
            Ok(root) if self.errors.is_empty() => Ok(Tree::new(
                self.source.to_owned(),
                self.arena,
                root,
                self.recursion,
                token_usage,
            )),
            _ => Err(self.finish_errors()),
        }
    }

    fn finish_errors(&mut self) -> Diagnostics {
        let mut errors = std::mem::take(&mut self.errors);
        errors.sort_by_key(|d| d.position);
        Diagnostics(errors)
    }

    // --- token cursor ------------------------------------------------------

    pub(crate) fn peek(&self) -> TokenKind {
        self.tokens[self.pos].kind()
    }

    pub(crate) fn current(&self) -> &Token<'a> {
        &self.tokens[self.pos]
    }

    /// Start offset of the current token.
    pub(crate) fn start(&self) -> u32 {
        self.current().start()
    }

    /// End offset of the last consumed significant token.
    pub(crate) fn prev_end(&self) -> u32 {
        self.prev_end
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    /// Is the current token an identifier with exactly this text? This is
    /// how contextual keywords are recognized.
    pub(crate) fn at_text(&self, text: &str) -> bool {
        self.peek() == TokenKind::Ident && self.current().text() == text
    }

    /// Kind of the `n`-th significant token ahead; `nth(0)` is the current
    /// token.
    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens[self.nth_raw(n)].kind()
    }

    pub(crate) fn nth_text(&self, n: usize) -> &'a str {
        self.tokens[self.nth_raw(n)].text()
    }

    fn nth_raw(&self, n: usize) -> usize {
        let mut raw = self.pos;
        for _ in 0..n {
            raw = self.next_sig(raw);
        }
        raw
    }

    /// Raw index of the current token, for speculative scans.
    pub(crate) fn raw_pos(&self) -> usize {
        self.pos
    }

    /// First significant index at or after `raw`.
    pub(crate) fn sig_from(&self, mut raw: usize) -> usize {
        while self.tokens[raw].kind().is_trivia() {
            raw += 1;
        }
        raw
    }

    /// Next significant index strictly after `raw`. Saturates at EOF.
    pub(crate) fn next_sig(&self, raw: usize) -> usize {
        if self.tokens[raw].kind() == TokenKind::Eof {
            return raw;
        }
        self.sig_from(raw + 1)
    }

    pub(crate) fn kind_raw(&self, raw: usize) -> TokenKind {
        self.tokens[raw].kind()
    }

    /// Consume the current token. Checks the wall-clock budget on an
    /// amortized stride.
    pub(crate) fn bump(&mut self) -> ParseResult<()> {
        if self.peek() == TokenKind::Eof {
            return Ok(());
        }
        self.prev_end = self.current().end();
        self.pos += 1;
        self.skip_trivia();
        if self.deadline.tick() {
            return Err(self.limit_err(ResourceLimit::Deadline, "parse deadline exceeded"));
        }
        Ok(())
    }

    fn skip_trivia(&mut self) {
        loop {
            let kind = self.tokens[self.pos].kind();
            if !kind.is_trivia() {
                break;
            }
            if kind.is_comment() {
                let token = &self.tokens[self.pos];
                let node = match kind {
                    TokenKind::LineComment => NodeKind::LineComment,
                    TokenKind::BlockComment => NodeKind::BlockComment,
                    _ => NodeKind::JavadocComment,
                };
                self.pending_comments.push((node, token.start(), token.end()));
            }
            self.pos += 1;
        }
    }

    /// Consume the current token if it is `kind`.
    pub(crate) fn eat(&mut self, kind: TokenKind) -> ParseResult<bool> {
        if self.at(kind) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the current token if it is `kind`, or abort with an error.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.at(kind) {
            self.bump()
        } else {
            Err(self.expected(kind.describe()))
        }
    }

    /// Close one type-argument list: consume a `>`, splitting a `>>`-family
    /// token if that is what the lexer produced. Splitting rewrites the
    /// token at the cursor to its remainder with a one-unit-narrower span,
    /// so the resulting tree cannot tell the two lexings apart.
    pub(crate) fn expect_type_list_close(&mut self) -> ParseResult<()> {
        let kind = self.peek();
        if kind == TokenKind::Gt {
            return self.bump();
        }
        if kind.is_splittable() {
            let token = self.tokens[self.pos];
            let remainder = match kind {
                TokenKind::Shr => TokenKind::Gt,
                TokenKind::UShr => TokenKind::Shr,
                TokenKind::GtEq => TokenKind::Eq,
                TokenKind::ShrEq => TokenKind::GtEq,
                _ => TokenKind::ShrEq,
            };
            self.tokens[self.pos] = Token::new(
                remainder,
                &token.text()[1..],
                token.start() + 1,
                token.end(),
            );
            self.prev_end = token.start() + 1;
            if self.deadline.tick() {
                return Err(self.limit_err(ResourceLimit::Deadline, "parse deadline exceeded"));
            }
            return Ok(());
        }
        Err(self.expected("`>`"))
    }

    // --- recursion guard ---------------------------------------------------

    /// Enter a nesting-capable production.
    pub(crate) fn enter(&mut self) -> ParseResult<()> {
        if self.recursion.check_and_increment() {
            return Err(self.limit_err(
                ResourceLimit::RecursionDepth,
                "parser recursion limit reached",
            ));
        }
        if self.deadline.expired() {
            return Err(self.limit_err(ResourceLimit::Deadline, "parse deadline exceeded"));
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.recursion.decrement();
    }

    // --- errors ------------------------------------------------------------

    fn diagnostic_at(
        &self,
        position: u32,
        kind: DiagnosticKind,
        message: impl Into<String>,
    ) -> Diagnostic {
        let (line, column) = self.line_index.line_col(position);
        Diagnostic {
            position,
            line,
            column,
            message: message.into(),
            kind,
        }
    }

    /// Record a structural error at the current token and abort.
    pub(crate) fn expected(&mut self, what: &str) -> ParseAbort {
        let current = self.current();
        let found = match current.kind() {
            TokenKind::Eof => "end of file".to_owned(),
            TokenKind::Ident => format!("`{}`", current.text()),
            kind => kind.describe().to_owned(),
        };
        let message = format!("expected {what}, found {found}");
        self.syntax_err(message)
    }

    pub(crate) fn syntax_err(&mut self, message: impl Into<String>) -> ParseAbort {
        let d = self.diagnostic_at(self.start(), DiagnosticKind::ParseError, message);
        self.errors.push(d);
        ParseAbort
    }

    pub(crate) fn limit_err(&mut self, limit: ResourceLimit, message: &str) -> ParseAbort {
        tracing::trace!(?limit, "resource limit reached");
        let d = self.diagnostic_at(
            self.start(),
            DiagnosticKind::ResourceExhausted(limit),
            message,
        );
        self.errors.push(d);
        ParseAbort
    }

    // --- node building -----------------------------------------------------

    /// Allocate a node spanning from `start` to the end of the last
    /// consumed token.
    pub(crate) fn alloc(
        &mut self,
        kind: NodeKind,
        start: u32,
        children: Vec<NodeIndex>,
    ) -> ParseResult<NodeIndex> {
        let end = self.prev_end;
        self.alloc_span(kind, start, end, children)
    }

    /// Allocate a node with an explicit span.
    pub(crate) fn alloc_span(
        &mut self,
        kind: NodeKind,
        start: u32,
        end: u32,
        children: Vec<NodeIndex>,
    ) -> ParseResult<NodeIndex> {
        match self.arena.alloc(kind, start, end, children) {
            Ok(index) => Ok(index),
            Err(_) => Err(self.limit_err(ResourceLimit::ArenaCapacity, "arena node limit reached")),
        }
    }

    pub(crate) fn alloc_attr(
        &mut self,
        kind: NodeKind,
        start: u32,
        children: Vec<NodeIndex>,
        attribute: Attribute,
    ) -> ParseResult<NodeIndex> {
        let end = self.prev_end;
        match self
            .arena
            .alloc_with_attribute(kind, start, end, children, attribute)
        {
            Ok(index) => Ok(index),
            Err(_) => Err(self.limit_err(ResourceLimit::ArenaCapacity, "arena node limit reached")),
        }
    }

    pub(crate) fn node_end(&self, index: NodeIndex) -> u32 {
        self.arena.get(index).end()
    }

    pub(crate) fn node_kind(&self, index: NodeIndex) -> NodeKind {
        self.arena.get(index).kind()
    }

    pub(crate) fn node_start(&self, index: NodeIndex) -> u32 {
        self.arena.get(index).start()
    }

    /// Allocate buffered comment nodes into a container's child list.
    /// Every container production drains before each child and once more
    /// before closing, which keeps the child list ordered by start offset.
    ///
    /// Only comments starting at or after `from` (the container's interior)
    /// are taken; earlier ones stay buffered for the enclosing container,
    /// so a comment in a member's header lands in the class body, not in
    /// the member's own block.
    pub(crate) fn drain_comments_since(
        &mut self,
        children: &mut Vec<NodeIndex>,
        from: u32,
    ) -> ParseResult<()> {
        if self.pending_comments.is_empty() {
            return Ok(());
        }
        let mut drained = Vec::new();
        self.pending_comments.retain(|comment| {
            if comment.1 >= from {
                drained.push(*comment);
                false
            } else {
                true
            }
        });
        for (kind, start, end) in drained {
            let index = self.alloc_span(kind, start, end, Vec::new())?;
            children.push(index);
        }
        Ok(())
    }
}

/// The significant token just past the cap, if the stream exceeds it.
fn nth_significant<'t, 'a>(tokens: &'t [Token<'a>], cap: usize) -> Option<&'t Token<'a>> {
    tokens
        .iter()
        .filter(|t| !t.kind().is_trivia() && t.kind() != TokenKind::Eof)
        .nth(cap)
}
