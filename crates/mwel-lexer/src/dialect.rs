//! The two layered languages share one lexer; the dialect selects which
//! rules are active.

use crate::token::TokenKind;

/// Language layer to tokenize for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// The pure expression substrate. No assignment operators, no arrows,
    /// no comments, and only the seven expression keywords.
    Jel,
    /// The statement language layered on JEL: adds `=`, the augmented
    /// assignment family, `<-`/`->`, `#` line comments, and the statement
    /// keywords.
    #[default]
    Mwel,
}

impl Dialect {
    pub fn is_mwel(self) -> bool {
        matches!(self, Dialect::Mwel)
    }

    /// Reclassify an identifier lexeme that is a keyword in this dialect.
    pub fn keyword(self, lexeme: &str) -> Option<TokenKind> {
        let kind = match lexeme {
            "and" => TokenKind::And,
            "false" => TokenKind::False,
            "in" => TokenKind::In,
            "not" => TokenKind::Not,
            "null" => TokenKind::Null,
            "or" => TokenKind::Or,
            "true" => TokenKind::True,
            "else" | "end" | "function" | "local" | "return" if !self.is_mwel() => return None,
            "else" => TokenKind::Else,
            "end" => TokenKind::End,
            "function" => TokenKind::Function,
            "local" => TokenKind::Local,
            "return" => TokenKind::Return,
            _ => return None,
        };
        Some(kind)
    }
}
