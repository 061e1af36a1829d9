//! Hand-written lexer for Java source text through JDK 25.
//!
//! Turns a character buffer into a flat, source-ordered token sequence
//! terminated by a synthetic EOF token. Trivia (whitespace and the three
//! comment forms) are emitted as ordinary tokens; the parser decides what
//! to do with them. Malformed lexemes produce a best-effort token of the
//! closest matching kind plus a diagnostic, so lexing never aborts.

mod cursor;
mod token;
mod token_kind;

use crate::error::{Diagnostic, DiagnosticKind};
use crate::location::LineIndex;

use cursor::Cursor;

pub use token::Token;
pub use token_kind::TokenKind;

pub(crate) struct Lexer<'a, 'i> {
    cursor: Cursor<'a>,
    line_index: &'i LineIndex,
    tokens: Vec<Token<'a>>,
    errors: Vec<Diagnostic>,
}

impl<'a, 'i> Lexer<'a, 'i> {
    pub(crate) fn new(source: &'a str, line_index: &'i LineIndex) -> Self {
        Self {
            cursor: Cursor::new(source),
            line_index,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Lex the whole buffer. Always succeeds; malformed input is reported
    /// through the diagnostic list alongside best-effort tokens.
    pub(crate) fn lex(mut self) -> (Vec<Token<'a>>, Vec<Diagnostic>) {
        while !self.cursor.is_eof() {
            let start_byte = self.cursor.byte_pos();
            let start_unit = self.cursor.unit_pos();
            let first = self.cursor.bump().unwrap();
            let kind = self.advance(first, start_byte, start_unit);
            let text = self.cursor.slice_from(start_byte);
            self.tokens
                .push(Token::new(kind, text, start_unit, self.cursor.unit_pos()));
        }
        let eof = self.cursor.unit_pos();
        self.tokens.push(Token::new(TokenKind::Eof, "", eof, eof));
        (self.tokens, self.errors)
    }

    fn advance(&mut self, first: char, start_byte: usize, start_unit: u32) -> TokenKind {
        match first {
            c if is_java_whitespace(c) => {
                self.cursor.eat_while(is_java_whitespace);
                TokenKind::Whitespace
            }
            '/' => match self.cursor.first() {
                '/' => self.line_comment(),
                '*' => self.block_comment(start_byte, start_unit),
                _ => {
                    if self.cursor.eat('=') {
                        TokenKind::SlashEq
                    } else {
                        TokenKind::Slash
                    }
                }
            },
            c if is_ident_start(c) => self.ident(start_byte),
            c @ '0'..='9' => self.number(c, start_byte, start_unit),
            '.' => {
                if self.cursor.first().is_ascii_digit() {
                    self.fraction_and_suffix(start_unit)
                } else if self.cursor.first() == '.' && self.cursor.second() == '.' {
                    self.cursor.bump();
                    self.cursor.bump();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }
            '"' => {
                if self.cursor.first() == '"' && self.cursor.second() == '"' {
                    self.cursor.bump();
                    self.cursor.bump();
                    self.text_block(start_unit)
                } else {
                    self.string_literal(start_unit)
                }
            }
            '\'' => self.char_literal(start_unit),
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '@' => TokenKind::At,
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,
            ':' => {
                if self.cursor.eat(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '=' => {
                if self.cursor.eat('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.cursor.eat('=') {
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                if self.cursor.eat('<') {
                    if self.cursor.eat('=') {
                        TokenKind::ShlEq
                    } else {
                        TokenKind::Shl
                    }
                } else if self.cursor.eat('=') {
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.cursor.first() == '>' && self.cursor.second() == '>' {
                    self.cursor.bump();
                    self.cursor.bump();
                    if self.cursor.eat('=') {
                        TokenKind::UShrEq
                    } else {
                        TokenKind::UShr
                    }
                } else if self.cursor.first() == '>' {
                    self.cursor.bump();
                    if self.cursor.eat('=') {
                        TokenKind::ShrEq
                    } else {
                        TokenKind::Shr
                    }
                } else if self.cursor.eat('=') {
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.cursor.eat('&') {
                    TokenKind::AmpAmp
                } else if self.cursor.eat('=') {
                    TokenKind::AmpEq
                } else {
                    TokenKind::Amp
                }
            }
            '|' => {
                if self.cursor.eat('|') {
                    TokenKind::PipePipe
                } else if self.cursor.eat('=') {
                    TokenKind::PipeEq
                } else {
                    TokenKind::Pipe
                }
            }
            '+' => {
                if self.cursor.eat('+') {
                    TokenKind::PlusPlus
                } else if self.cursor.eat('=') {
                    TokenKind::PlusEq
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.cursor.eat('-') {
                    TokenKind::MinusMinus
                } else if self.cursor.eat('=') {
                    TokenKind::MinusEq
                } else if self.cursor.eat('>') {
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.cursor.eat('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '%' => {
                if self.cursor.eat('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '^' => {
                if self.cursor.eat('=') {
                    TokenKind::CaretEq
                } else {
                    TokenKind::Caret
                }
            }
            c => {
                self.error(start_unit, format!("unexpected character `{c}`"));
                TokenKind::Unknown
            }
        }
    }

    fn line_comment(&mut self) -> TokenKind {
        self.cursor.bump(); // second '/'
        self.cursor.eat_while(|c| c != '\n' && c != '\r');
        TokenKind::LineComment
    }

    fn block_comment(&mut self, start_byte: usize, start_unit: u32) -> TokenKind {
        self.cursor.bump(); // '*'
        let mut terminated = false;
        while let Some(c) = self.cursor.bump() {
            if c == '*' && self.cursor.first() == '/' {
                self.cursor.bump();
                terminated = true;
                break;
            }
        }
        if !terminated {
            self.error(start_unit, "unterminated block comment");
        }
        let text = self.cursor.slice_from(start_byte);
        // `/**/` is an empty plain comment, not Javadoc.
        if text.starts_with("/**") && text.len() > 4 {
            TokenKind::JavadocComment
        } else {
            TokenKind::BlockComment
        }
    }

    fn ident(&mut self, start_byte: usize) -> TokenKind {
        self.cursor.eat_while(is_ident_part);
        let text = self.cursor.slice_from(start_byte);
        // `non-sealed` is the single hyphenated token; it only forms when
        // the hyphen run ends the identifier-like sequence.
        if text == "non" && self.cursor.rest().starts_with("-sealed") {
            let after = self.cursor.rest()[7..].chars().next();
            if !after.is_some_and(is_ident_part) {
                for _ in 0.."-sealed".len() {
                    self.cursor.bump();
                }
                return TokenKind::NonSealed;
            }
        }
        TokenKind::keyword(text).unwrap_or(TokenKind::Ident)
    }

    fn number(&mut self, first: char, start_byte: usize, start_unit: u32) -> TokenKind {
        if first == '0' && matches!(self.cursor.first(), 'x' | 'X') {
            self.cursor.bump();
            return self.hex_literal(start_unit);
        }
        if first == '0' && matches!(self.cursor.first(), 'b' | 'B') {
            self.cursor.bump();
            let digits = self.eat_digits(|c| matches!(c, '0' | '1' | '_'));
            if digits == 0 {
                self.error(start_unit, "malformed binary literal");
            }
            return self.integer_suffix();
        }

        self.eat_digits(is_dec_digit_or_sep);
        let mut is_float = false;

        if self.cursor.first() == '.' && fraction_follows(&self.cursor) {
            self.cursor.bump();
            self.eat_digits(is_dec_digit_or_sep);
            is_float = true;
        }
        if self.eat_exponent('e', 'E', start_unit) {
            is_float = true;
        }

        match self.cursor.first() {
            'f' | 'F' => {
                self.cursor.bump();
                TokenKind::FloatLiteral
            }
            'd' | 'D' => {
                self.cursor.bump();
                TokenKind::DoubleLiteral
            }
            'l' | 'L' if !is_float => {
                self.cursor.bump();
                self.check_octal(start_byte, start_unit);
                TokenKind::LongLiteral
            }
            _ if is_float => TokenKind::DoubleLiteral,
            _ => {
                self.check_octal(start_byte, start_unit);
                self.check_trailing_separator(start_byte, start_unit);
                TokenKind::IntLiteral
            }
        }
    }

    /// `.5`, `.5e3`, `.5f` — a literal starting at the decimal point.
    fn fraction_and_suffix(&mut self, start_unit: u32) -> TokenKind {
        self.eat_digits(is_dec_digit_or_sep);
        self.eat_exponent('e', 'E', start_unit);
        match self.cursor.first() {
            'f' | 'F' => {
                self.cursor.bump();
                TokenKind::FloatLiteral
            }
            'd' | 'D' => {
                self.cursor.bump();
                TokenKind::DoubleLiteral
            }
            _ => TokenKind::DoubleLiteral,
        }
    }

    fn hex_literal(&mut self, start_unit: u32) -> TokenKind {
        let digits = self.eat_digits(is_hex_digit_or_sep);
        if digits == 0 && self.cursor.first() != '.' {
            self.error(start_unit, "malformed hexadecimal literal");
        }

        let has_fraction = self.cursor.first() == '.'
            && (is_hex_digit_or_sep(self.cursor.second())
                || matches!(self.cursor.second(), 'p' | 'P'));
        if has_fraction {
            self.cursor.bump();
            self.eat_digits(is_hex_digit_or_sep);
        }

        if matches!(self.cursor.first(), 'p' | 'P') {
            self.eat_exponent('p', 'P', start_unit);
            match self.cursor.first() {
                'f' | 'F' => {
                    self.cursor.bump();
                    TokenKind::FloatLiteral
                }
                'd' | 'D' => {
                    self.cursor.bump();
                    TokenKind::DoubleLiteral
                }
                _ => TokenKind::DoubleLiteral,
            }
        } else if has_fraction {
            // Hex floats require a binary exponent.
            self.error(
                start_unit,
                "hexadecimal floating-point literal requires an exponent",
            );
            TokenKind::DoubleLiteral
        } else {
            self.integer_suffix()
        }
    }

    fn integer_suffix(&mut self) -> TokenKind {
        if matches!(self.cursor.first(), 'l' | 'L') {
            self.cursor.bump();
            TokenKind::LongLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    /// Consume `e`/`p` exponent with optional sign. Returns whether an
    /// exponent was consumed; a missing digit run is a diagnostic.
    fn eat_exponent(&mut self, lo: char, hi: char, start_unit: u32) -> bool {
        if self.cursor.first() != lo && self.cursor.first() != hi {
            return false;
        }
        let after_sign = if matches!(self.cursor.second(), '+' | '-') {
            self.cursor.third()
        } else {
            self.cursor.second()
        };
        if !after_sign.is_ascii_digit() {
            if lo == 'p' {
                // `0x1p` with nothing after: still consume the marker so the
                // token covers the whole malformed lexeme.
                self.cursor.bump();
                self.error(start_unit, "malformed floating-point exponent");
                return true;
            }
            return false;
        }
        self.cursor.bump();
        if matches!(self.cursor.first(), '+' | '-') {
            self.cursor.bump();
        }
        self.eat_digits(is_dec_digit_or_sep);
        true
    }

    fn eat_digits(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while !self.cursor.is_eof() && pred(self.cursor.first()) {
            self.cursor.bump();
            count += 1;
        }
        count
    }

    fn check_octal(&mut self, start_byte: usize, start_unit: u32) {
        let text = self.cursor.slice_from(start_byte);
        let body = text.trim_end_matches(['l', 'L']);
        if body.len() > 1 && body.starts_with('0') && !body.starts_with("0x") {
            if body.chars().any(|c| matches!(c, '8' | '9')) {
                self.error(start_unit, "invalid digit in octal literal");
            }
        }
    }

    fn check_trailing_separator(&mut self, start_byte: usize, start_unit: u32) {
        if self.cursor.slice_from(start_byte).ends_with('_') {
            self.error(start_unit, "underscore must separate digits");
        }
    }

    fn string_literal(&mut self, start_unit: u32) -> TokenKind {
        loop {
            match self.cursor.first() {
                _ if self.cursor.is_eof() => {
                    self.error(start_unit, "unterminated string literal");
                    break;
                }
                '"' => {
                    self.cursor.bump();
                    break;
                }
                '\n' | '\r' => {
                    self.error(start_unit, "unterminated string literal");
                    break;
                }
                '\\' => self.escape_sequence(),
                _ => {
                    self.cursor.bump();
                }
            }
        }
        TokenKind::StringLiteral
    }

    fn text_block(&mut self, start_unit: u32) -> TokenKind {
        // Only white space may sit between the opening delimiter and the
        // line terminator.
        self.cursor.eat_while(|c| c == ' ' || c == '\t' || c == '\u{c}');
        if self.cursor.first() == '\r' {
            self.cursor.bump();
            self.cursor.eat('\n');
        } else if self.cursor.first() == '\n' {
            self.cursor.bump();
        } else {
            self.error(
                start_unit,
                "text block delimiter must be followed by a line terminator",
            );
        }

        loop {
            if self.cursor.is_eof() {
                self.error(start_unit, "unterminated text block");
                break;
            }
            match self.cursor.first() {
                '\\' => self.escape_sequence(),
                '"' if self.cursor.second() == '"' && self.cursor.third() == '"' => {
                    self.cursor.bump();
                    self.cursor.bump();
                    self.cursor.bump();
                    break;
                }
                _ => {
                    self.cursor.bump();
                }
            }
        }
        TokenKind::TextBlock
    }

    fn char_literal(&mut self, start_unit: u32) -> TokenKind {
        if self.cursor.eat('\'') {
            self.error(start_unit, "empty character literal");
            return TokenKind::CharLiteral;
        }
        let mut glyphs = 0usize;
        loop {
            match self.cursor.first() {
                _ if self.cursor.is_eof() => {
                    self.error(start_unit, "unterminated character literal");
                    break;
                }
                '\'' => {
                    self.cursor.bump();
                    if glyphs > 1 {
                        self.error(start_unit, "too many characters in character literal");
                    }
                    break;
                }
                '\n' | '\r' => {
                    self.error(start_unit, "unterminated character literal");
                    break;
                }
                '\\' => {
                    self.escape_sequence();
                    glyphs += 1;
                }
                _ => {
                    self.cursor.bump();
                    glyphs += 1;
                }
            }
        }
        TokenKind::CharLiteral
    }

    /// Consume a `\`-escape, validating it against the JLS escape set
    /// (including `\s`, octal escapes, and `\uXXXX`).
    fn escape_sequence(&mut self) {
        let at = self.cursor.unit_pos();
        self.cursor.bump(); // backslash
        match self.cursor.first() {
            'b' | 's' | 't' | 'n' | 'f' | 'r' | '"' | '\'' | '\\' | '\n' | '\r' => {
                self.cursor.bump();
            }
            'u' => {
                self.cursor.bump();
                // A unicode escape allows repeated `u`s.
                self.cursor.eat_while(|c| c == 'u');
                let mut hex = 0;
                while hex < 4 && self.cursor.first().is_ascii_hexdigit() {
                    self.cursor.bump();
                    hex += 1;
                }
                if hex < 4 {
                    self.error(at, "invalid unicode escape");
                }
            }
            c @ '0'..='7' => {
                self.cursor.bump();
                // Up to three octal digits; a leading 0-3 allows three.
                if self.cursor.first().is_digit(8) {
                    self.cursor.bump();
                    if c <= '3' && self.cursor.first().is_digit(8) {
                        self.cursor.bump();
                    }
                }
            }
            _ if self.cursor.is_eof() => {}
            c => {
                self.error(at, format!("invalid escape sequence `\\{c}`"));
                self.cursor.bump();
            }
        }
    }

    fn error(&mut self, position: u32, message: impl Into<String>) {
        let (line, column) = self.line_index.line_col(position);
        self.errors.push(Diagnostic {
            position,
            line,
            column,
            message: message.into(),
            kind: DiagnosticKind::LexError,
        });
    }
}

fn is_java_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}' | '\n' | '\r')
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || unicode_ident::is_xid_start(c)
}

fn is_ident_part(c: char) -> bool {
    c == '$' || unicode_ident::is_xid_continue(c)
}

fn is_dec_digit_or_sep(c: char) -> bool {
    c.is_ascii_digit() || c == '_'
}

fn is_hex_digit_or_sep(c: char) -> bool {
    c.is_ascii_hexdigit() || c == '_'
}

/// After `1.`, decide whether the dot belongs to the literal. `1.foo`
/// keeps the dot out so the member name lexes as an identifier; `1.`,
/// `1.5`, and `1.e5` keep it in.
fn fraction_follows(cursor: &Cursor<'_>) -> bool {
    let next = cursor.second();
    if next.is_ascii_digit() {
        return true;
    }
    if matches!(next, 'e' | 'E') {
        let after = cursor.third();
        return after.is_ascii_digit() || matches!(after, '+' | '-');
    }
    if matches!(next, 'f' | 'F' | 'd' | 'D') {
        // `1.f` is a valid float literal unless an identifier continues.
        return true;
    }
    !is_ident_start(next) && next != '.'
}
