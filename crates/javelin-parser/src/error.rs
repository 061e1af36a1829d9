//! Structured diagnostics for lexical, syntactic and resource failures.
//!
//! A parse either succeeds with a [`Tree`](crate::Tree) or fails with a
//! non-empty, position-ordered [`Diagnostics`] list; there is no partial
//! tree.

use std::fmt;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed literal or unterminated string/text block/comment. The
    /// lexer emits a best-effort token and keeps going.
    LexError,
    /// Unexpected token under the current production. Fatal: the parse
    /// aborts without consuming further tokens.
    ParseError,
    /// A security-envelope limit was exceeded. Fatal, immediate.
    ResourceExhausted(ResourceLimit),
}

/// Which limit of the security envelope was breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceLimit {
    SourceSize,
    TokenCount,
    ArenaCapacity,
    RecursionDepth,
    Deadline,
}

/// One diagnostic: position (UTF-16 code units from 0), 1-based line and
/// column, a human-readable message, and the kind.
#[derive(Clone, PartialEq, Eq, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct Diagnostic {
    pub position: u32,
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub kind: DiagnosticKind,
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{} {}:{} {:?}",
            self.kind, self.position, self.line, self.column, self.message
        )
    }
}

/// Non-empty list of diagnostics, ordered by source position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct Diagnostics(pub(crate) Vec<Diagnostic>);

impl Diagnostics {
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first diagnostic in source order.
    pub fn first(&self) -> &Diagnostic {
        &self.0[0]
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
