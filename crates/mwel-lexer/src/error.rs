//! Lexer error types.
//!
//! Lexical problems never abort tokenization. Each one is rendered into an
//! [`ErrorRecord`] and handed to the sink, and the lexer skips forward.

use mwel_error::ErrorRecord;
use mwel_position_tracking::Position;
use thiserror::Error;

/// Errors the lexer can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A character no token rule matches, including closers that do not
    /// match the innermost open grouping.
    #[error("Illegal character '{ch}'")]
    IllegalCharacter { ch: char, position: Position },

    /// End of input inside a string literal.
    #[error("Unterminated string literal")]
    UnterminatedString { position: Position },

    /// Raw newline inside a single-line string literal.
    #[error("Unterminated string literal")]
    NewlineInString { position: Position },

    /// Backslash followed by a character that is not a recognized escape.
    #[error("Invalid escape sequence '\\{ch}'")]
    InvalidEscape { ch: char, position: Position },

    /// A `\u` escape encoding half of a surrogate pair with no partner.
    #[error("Unpaired surrogate '\\u{value:04X}' in string literal")]
    UnpairedSurrogate { value: u32, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::IllegalCharacter { position, .. }
            | LexError::UnterminatedString { position }
            | LexError::NewlineInString { position }
            | LexError::InvalidEscape { position, .. }
            | LexError::UnpairedSurrogate { position, .. } => *position,
        }
    }

    /// The offending source fragment, when there is one.
    pub fn token(&self) -> Option<String> {
        match self {
            LexError::IllegalCharacter { ch, .. } => Some(ch.to_string()),
            LexError::UnterminatedString { .. } => None,
            LexError::NewlineInString { .. } => Some("\n".to_owned()),
            LexError::InvalidEscape { .. } | LexError::UnpairedSurrogate { .. } => {
                Some("\\".to_owned())
            }
        }
    }

    pub fn into_record(self) -> ErrorRecord {
        ErrorRecord::new(self.to_string(), self.token(), Some(self.position()))
    }
}
