use std::fmt;

use crate::lexer::TokenKind;

/// One lexed token: kind, verbatim lexeme, and its half-open span in UTF-16
/// code units. `end > start` for everything except the synthetic EOF.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub(crate) kind: TokenKind,
    pub(crate) text: &'a str,
    pub(crate) start: u32,
    pub(crate) end: u32,
}

impl<'a> Token<'a> {
    pub(crate) fn new(kind: TokenKind, text: &'a str, start: u32, end: u32) -> Self {
        Self {
            kind,
            text,
            start,
            end,
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// The verbatim lexeme.
    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}..{}", self.kind, self.start, self.end)?;
        if !self.text.is_empty() {
            write!(f, " {:?}", self.text)?;
        }
        Ok(())
    }
}
