//! State-stack lexer for the JEL/MWEL scripting languages.
//!
//! The lexer is context-sensitive in three ways:
//!
//! - **Grouping states**: `(`, `[`, `{` push a state; inside any grouping,
//!   newlines are consumed but never emitted as [`TokenKind::Newline`], and a
//!   closer only pops when it matches the innermost open grouping.
//! - **String states**: four string syntaxes (`'...'`, `"..."`, `'''...'''`,
//!   `"""..."""`). The single-line forms terminate with an error at a raw
//!   newline; the triple-quoted forms admit them. Escape sequences are
//!   decoded into the token payload, including `\uXXXX` with surrogate-pair
//!   recombination.
//! - **Newline escape**: a backslash outside a string swallows trailing
//!   blanks and exactly one newline, emitting nothing.
//!
//! Errors never abort the lexer. Each problem is reported to the
//! [`ErrorSink`], the offending input is skipped, and tokenization resumes.
//!
//! ```
//! use mwel_error::ErrorCollector;
//! use mwel_lexer::{Lexer, TokenKind};
//!
//! let mut errors = ErrorCollector::new();
//! let tokens = Lexer::new(&mut errors).tokenize("local x = 1.5ms");
//! assert!(errors.is_empty());
//! assert!(matches!(tokens[0].kind, TokenKind::Local));
//! ```

mod dialect;
mod error;
mod token;

pub use dialect::Dialect;
pub use error::LexError;
pub use token::{AugAssignOp, NumberParts, Token, TokenKind};

use mwel_error::ErrorSink;
use mwel_position_tracking::Position;

/// An open grouping construct; the lexer's state stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    Paren,
    Bracket,
    Brace,
}

/// Lexer entry point: holds the dialect and the error sink, and produces a
/// token iterator per source text.
pub struct Lexer<'e> {
    dialect: Dialect,
    sink: &'e mut dyn ErrorSink,
}

impl<'e> Lexer<'e> {
    /// A lexer for the full MWEL token set.
    pub fn new(sink: &'e mut dyn ErrorSink) -> Self {
        Lexer::with_dialect(Dialect::Mwel, sink)
    }

    pub fn with_dialect(dialect: Dialect, sink: &'e mut dyn ErrorSink) -> Self {
        Lexer { dialect, sink }
    }

    /// Stream tokens from `source`. Errors go to the sink as they are found.
    pub fn tokens<'a>(&'a mut self, source: &'a str) -> TokenIter<'a> {
        TokenIter {
            source,
            dialect: self.dialect,
            sink: &mut *self.sink,
            pos: 0,
            line: 1,
            line_start: 0,
            groupings: Vec::new(),
        }
    }

    /// Lex the whole of `source` eagerly.
    pub fn tokenize(&mut self, source: &str) -> Vec<Token> {
        self.tokens(source).collect()
    }
}

/// Iterator over the tokens of one source text.
pub struct TokenIter<'a> {
    source: &'a str,
    dialect: Dialect,
    sink: &'a mut dyn ErrorSink,
    pos: usize,
    line: u32,
    line_start: usize,
    groupings: Vec<Grouping>,
}

impl Iterator for TokenIter<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

impl<'a> TokenIter<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    /// Consume one character, keeping the line accounting current.
    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(ch)
    }

    fn position(&self) -> Position {
        Position::new(self.line, (self.pos - self.line_start) as u32)
    }

    fn report(&mut self, error: LexError) {
        self.sink.report(error.into_record());
    }

    fn token_from(&self, kind: TokenKind, start: usize, position: Position) -> Token {
        Token::new(kind, &self.source[start..self.pos], position)
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            let position = Self::position(self);
            let start = self.pos;
            let ch = self.peek()?;

            match ch {
                ' ' | '\t' | '\r' => {
                    self.bump();
                }
                '#' if self.dialect.is_mwel() => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                '\n' => {
                    while self.peek() == Some('\n') {
                        self.bump();
                    }
                    if self.groupings.is_empty() {
                        return Some(self.token_from(TokenKind::Newline, start, position));
                    }
                    // Line-joining inside groupings: consumed, not emitted.
                }
                '\\' => self.lex_newline_escape(),
                '\'' | '"' => return Some(self.lex_string(ch)),
                '0'..='9' => return Some(self.lex_number()),
                'a'..='z' | 'A'..='Z' | '_' => return Some(self.lex_identifier()),
                '(' => {
                    self.groupings.push(Grouping::Paren);
                    return Some(self.single(TokenKind::LeftParen, start, position));
                }
                '[' => {
                    self.groupings.push(Grouping::Bracket);
                    return Some(self.single(TokenKind::LeftBracket, start, position));
                }
                '{' => {
                    self.groupings.push(Grouping::Brace);
                    return Some(self.single(TokenKind::LeftBrace, start, position));
                }
                ')' => {
                    if let Some(token) = self.close(Grouping::Paren, TokenKind::RightParen) {
                        return Some(token);
                    }
                }
                ']' => {
                    if let Some(token) = self.close(Grouping::Bracket, TokenKind::RightBracket) {
                        return Some(token);
                    }
                }
                '}' => {
                    if let Some(token) = self.close(Grouping::Brace, TokenKind::RightBrace) {
                        return Some(token);
                    }
                }
                _ => {
                    if let Some(token) = self.lex_operator(ch) {
                        return Some(token);
                    }
                }
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: usize, position: Position) -> Token {
        self.bump();
        self.token_from(kind, start, position)
    }

    /// Pop a grouping closer, or report it as illegal when unmatched.
    fn close(&mut self, grouping: Grouping, kind: TokenKind) -> Option<Token> {
        let position = Self::position(self);
        let start = self.pos;
        if self.groupings.last() == Some(&grouping) {
            self.groupings.pop();
            return Some(self.single(kind, start, position));
        }
        let ch = self.bump()?;
        self.report(LexError::IllegalCharacter { ch, position });
        None
    }

    fn lex_operator(&mut self, ch: char) -> Option<Token> {
        let position = Self::position(self);
        let start = self.pos;
        let mwel = self.dialect.is_mwel();
        let second = self.peek_second();

        let (kind, len) = match ch {
            ':' => (TokenKind::Colon, 1),
            ',' => (TokenKind::Comma, 1),
            '.' => (TokenKind::Dot, 1),
            '=' if second == Some('=') => (TokenKind::Equal, 2),
            '=' if mwel => (TokenKind::Assign, 1),
            '!' if second == Some('=') => (TokenKind::NotEqual, 2),
            '<' if second == Some('=') => (TokenKind::LessThanOrEqual, 2),
            '<' if mwel && second == Some('-') => (TokenKind::LeftArrow, 2),
            '<' => (TokenKind::LessThan, 1),
            '>' if second == Some('=') => (TokenKind::GreaterThanOrEqual, 2),
            '>' => (TokenKind::GreaterThan, 1),
            '+' if mwel && second == Some('=') => (TokenKind::AugAssign(AugAssignOp::Add), 2),
            '+' => (TokenKind::Plus, 1),
            '-' if mwel && second == Some('=') => (TokenKind::AugAssign(AugAssignOp::Sub), 2),
            '-' if mwel && second == Some('>') => (TokenKind::RightArrow, 2),
            '-' => (TokenKind::Minus, 1),
            '*' if second == Some('*') => {
                if mwel && self.rest().chars().nth(2) == Some('=') {
                    (TokenKind::AugAssign(AugAssignOp::Pow), 3)
                } else {
                    (TokenKind::Power, 2)
                }
            }
            '*' if mwel && second == Some('=') => (TokenKind::AugAssign(AugAssignOp::Mul), 2),
            '*' => (TokenKind::Times, 1),
            '/' if mwel && second == Some('=') => (TokenKind::AugAssign(AugAssignOp::Div), 2),
            '/' => (TokenKind::Divide, 1),
            '%' if mwel && second == Some('=') => (TokenKind::AugAssign(AugAssignOp::Mod), 2),
            '%' => (TokenKind::Modulo, 1),
            _ => {
                self.bump();
                self.report(LexError::IllegalCharacter { ch, position });
                return None;
            }
        };

        for _ in 0..len {
            self.bump();
        }
        Some(self.token_from(kind, start, position))
    }

    fn lex_identifier(&mut self) -> Token {
        let position = Self::position(self);
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        let lexeme = &self.source[start..self.pos];
        let kind = self
            .dialect
            .keyword(lexeme)
            .unwrap_or_else(|| TokenKind::Identifier(lexeme.into()));
        self.token_from(kind, start, position)
    }

    /// Number literal: `int (. frac)? ([eE] exp)? tag?`.
    ///
    /// Only zero itself may have a leading zero, so `012` lexes as `0`
    /// followed by `12`. The decimal point and the exponent marker are only
    /// consumed when a digit actually follows; otherwise they are left for
    /// the next token (`2.` is a number and a `.`, `1.2e` has tag `e`).
    fn lex_number(&mut self) -> Token {
        let position = Self::position(self);
        let start = self.pos;

        let int_start = self.pos;
        if self.bump() != Some('0') {
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let int = &self.source[int_start..self.pos];

        let mut frac = "";
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            let frac_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            frac = &self.source[frac_start..self.pos];
        }

        let mut exp = "";
        if matches!(self.peek(), Some('e') | Some('E')) && self.exponent_follows() {
            self.bump();
            let exp_start = self.pos;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            exp = &self.source[exp_start..self.pos];
        }

        let mut tag = "";
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            let tag_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_alphanumeric()) {
                self.bump();
            }
            tag = &self.source[tag_start..self.pos];
        }

        let parts = NumberParts {
            int: int.into(),
            frac: frac.into(),
            exp: exp.into(),
            tag: tag.into(),
        };
        self.token_from(TokenKind::Number(parts), start, position)
    }

    /// Whether the `e`/`E` at the cursor really starts an exponent, i.e. is
    /// followed by a digit or by a sign and a digit.
    fn exponent_follows(&self) -> bool {
        let mut chars = self.rest().chars();
        chars.next();
        match chars.next() {
            Some('+') | Some('-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    /// String literal in any of the four syntaxes. One token is emitted at
    /// the closing delimiter, carrying the fully decoded value; on an
    /// unterminated literal the accumulated value is still emitted so the
    /// parser can keep going.
    fn lex_string(&mut self, quote: char) -> Token {
        let position = Self::position(self);
        let start = self.pos;

        let triple = self
            .rest()
            .as_bytes()
            .get(..3)
            .is_some_and(|bytes| bytes.iter().all(|&b| b == quote as u8));

        self.bump();
        if triple {
            self.bump();
            self.bump();
        }

        let mut value = String::new();
        loop {
            let Some(ch) = self.peek() else {
                self.report(LexError::UnterminatedString { position });
                break;
            };
            if ch == quote {
                if !triple {
                    self.bump();
                    break;
                }
                if self.closes_triple(quote) {
                    self.bump();
                    self.bump();
                    self.bump();
                    break;
                }
                value.push(ch);
                self.bump();
            } else if ch == '\n' && !triple {
                self.report(LexError::NewlineInString { position: Self::position(self) });
                self.bump();
                break;
            } else if ch == '\\' {
                self.lex_escape(&mut value);
            } else {
                value.push(ch);
                self.bump();
            }
        }

        self.token_from(TokenKind::String(value.into()), start, position)
    }

    fn closes_triple(&self, quote: char) -> bool {
        let mut chars = self.rest().chars();
        chars.next() == Some(quote) && chars.next() == Some(quote) && chars.next() == Some(quote)
    }

    /// Decode one escape sequence into `value`. The cursor sits on the
    /// backslash. An unknown escape is reported and the backslash is kept
    /// as a literal; the following character is left for the caller.
    fn lex_escape(&mut self, value: &mut String) {
        let esc_position = Self::position(self);
        self.bump();
        let Some(ch) = self.peek() else {
            value.push('\\');
            return;
        };
        let decoded = match ch {
            '\'' => '\'',
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{0008}',
            'f' => '\u{000C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                self.lex_unicode_escape(value, esc_position);
                return;
            }
            '\n' => {
                // Backslash before a raw newline: keep the backslash, let
                // the string state decide what the newline means.
                value.push('\\');
                return;
            }
            _ => {
                self.report(LexError::InvalidEscape { ch, position: esc_position });
                value.push('\\');
                return;
            }
        };
        value.push(decoded);
        self.bump();
    }

    /// `\uXXXX`, with `\uD8xx\uDCxx` surrogate pairs recombined into one
    /// code point. The cursor sits on the `u`.
    fn lex_unicode_escape(&mut self, value: &mut String, esc_position: Position) {
        let Some(code) = self.hex_escape_value(1) else {
            self.report(LexError::InvalidEscape { ch: 'u', position: esc_position });
            value.push('\\');
            return;
        };
        for _ in 0..5 {
            self.bump();
        }

        match code {
            0xD800..=0xDBFF => {
                let low = if self.rest().as_bytes().starts_with(b"\\u") {
                    self.hex_escape_value(2)
                } else {
                    None
                };
                match low {
                    Some(low @ 0xDC00..=0xDFFF) => {
                        for _ in 0..6 {
                            self.bump();
                        }
                        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                        if let Some(ch) = char::from_u32(combined) {
                            value.push(ch);
                        }
                    }
                    _ => self.report(LexError::UnpairedSurrogate { value: code, position: esc_position }),
                }
            }
            0xDC00..=0xDFFF => {
                self.report(LexError::UnpairedSurrogate { value: code, position: esc_position });
            }
            _ => {
                if let Some(ch) = char::from_u32(code) {
                    value.push(ch);
                }
            }
        }
    }

    /// Parse the four hex digits of a `\u` escape starting `skip` bytes into
    /// the remaining input (past the `u`, or past `\u` for the low half of a
    /// pair). Consumes nothing.
    fn hex_escape_value(&self, skip: usize) -> Option<u32> {
        let rest = self.rest();
        let hex = rest.get(skip..skip + 4)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()
    }

    /// Backslash outside a string: swallow blanks and one newline, emitting
    /// nothing. Anything else before the newline is an illegal character.
    fn lex_newline_escape(&mut self) {
        let backslash_position = Self::position(self);
        self.bump();
        loop {
            match self.peek() {
                Some(' ') | Some('\t') => {
                    self.bump();
                }
                Some('\n') => {
                    self.bump();
                    return;
                }
                Some(ch) => {
                    let position = Self::position(self);
                    self.bump();
                    self.report(LexError::IllegalCharacter { ch, position });
                }
                None => {
                    self.report(LexError::IllegalCharacter { ch: '\\', position: backslash_position });
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwel_error::ErrorCollector;
    use pretty_assertions::assert_eq;

    fn lex(source: &str) -> (Vec<Token>, ErrorCollector) {
        let mut errors = ErrorCollector::new();
        let tokens = Lexer::new(&mut errors).tokenize(source);
        (tokens, errors)
    }

    #[test]
    fn keyword_reclassification_respects_dialect() {
        let mut errors = ErrorCollector::new();
        let tokens = Lexer::with_dialect(Dialect::Jel, &mut errors).tokenize("end");
        assert!(matches!(&tokens[0].kind, TokenKind::Identifier(name) if &**name == "end"));

        let (tokens, _) = lex("end");
        assert_eq!(TokenKind::End, tokens[0].kind);
    }

    #[test]
    fn jel_rejects_mwel_operators() {
        let mut errors = ErrorCollector::new();
        let tokens = Lexer::with_dialect(Dialect::Jel, &mut errors).tokenize("a = 1");
        assert_eq!(1, errors.len());
        assert_eq!(Some("=".to_owned()), errors.records()[0].token);
        assert_eq!(2, tokens.len());
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let (tokens, errors) = lex("foo\n  bar");
        assert!(errors.is_empty());
        assert_eq!(mwel_position_tracking::Position::new(1, 0), tokens[0].position);
        assert_eq!(mwel_position_tracking::Position::new(1, 3), tokens[1].position);
        assert_eq!(mwel_position_tracking::Position::new(2, 2), tokens[2].position);
    }
}
